//! Document block model shared by the markup codec, the composer and the
//! remote block conversion.

use serde::{Deserialize, Serialize};

/// One inline run inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Span {
    Plain { text: String },
    Bold { text: String },
    Link { text: String, url: String, bold: bool },
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Span::Plain { text: text.into() }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Span::Bold { text: text.into() }
    }

    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        Span::Link {
            text: text.into(),
            url: url.into(),
            bold: false,
        }
    }

    /// Readable text of the span, formatting stripped.
    pub fn text(&self) -> &str {
        match self {
            Span::Plain { text } | Span::Bold { text } | Span::Link { text, .. } => text,
        }
    }

    pub fn is_bold(&self) -> bool {
        match self {
            Span::Plain { .. } => false,
            Span::Bold { .. } => true,
            Span::Link { bold, .. } => *bold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    pub fn depth(self) -> usize {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentBlock {
    Heading { level: HeadingLevel, spans: Vec<Span> },
    Paragraph { spans: Vec<Span> },
    BulletItem { spans: Vec<Span> },
    Divider,
}

impl DocumentBlock {
    pub fn heading(level: HeadingLevel, spans: Vec<Span>) -> Self {
        DocumentBlock::Heading {
            level,
            spans: normalize_spans(spans),
        }
    }

    pub fn paragraph(spans: Vec<Span>) -> Self {
        DocumentBlock::Paragraph {
            spans: normalize_spans(spans),
        }
    }

    pub fn bullet(spans: Vec<Span>) -> Self {
        DocumentBlock::BulletItem {
            spans: normalize_spans(spans),
        }
    }

    pub fn spans(&self) -> &[Span] {
        match self {
            DocumentBlock::Heading { spans, .. }
            | DocumentBlock::Paragraph { spans }
            | DocumentBlock::BulletItem { spans } => spans,
            DocumentBlock::Divider => &[],
        }
    }

    /// Concatenation of the block's span texts in order.
    pub fn plain_text(&self) -> String {
        self.spans().iter().map(Span::text).collect()
    }
}

/// Readable content of a whole block sequence, one block per line.
pub fn plain_text(blocks: &[DocumentBlock]) -> String {
    blocks
        .iter()
        .map(DocumentBlock::plain_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Merges adjacent runs with identical styling and drops empty text runs.
///
/// Links are never merged; a link with empty text is kept because it still
/// carries a URL.
pub fn normalize_spans(spans: Vec<Span>) -> Vec<Span> {
    let mut out: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        match span {
            Span::Plain { ref text } | Span::Bold { ref text } if text.is_empty() => continue,
            Span::Plain { text } => {
                if let Some(Span::Plain { text: prev }) = out.last_mut() {
                    prev.push_str(&text);
                } else {
                    out.push(Span::Plain { text });
                }
            }
            Span::Bold { text } => {
                if let Some(Span::Bold { text: prev }) = out.last_mut() {
                    prev.push_str(&text);
                } else {
                    out.push(Span::Bold { text });
                }
            }
            link @ Span::Link { .. } => out.push(link),
        }
    }
    out
}
