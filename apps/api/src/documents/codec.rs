//! BlockCodec: converts flat markup to a block sequence and back.
//!
//! Supported markup:
//! - `# `, `## `, `### ` heading lines
//! - a `---` line as a divider
//! - `- ` (or `* `) bullet lines
//! - inline `**bold**` and `[text](url)` spans
//! - any other non-blank lines, grouped into a paragraph until a blank line
//!   or another block boundary
//!
//! Canonical markup (the form `decode` emits) separates blocks with one
//! blank line, except between consecutive bullet items, and ends with a
//! single newline. For canonical markup `decode(encode(m)) == m`.
//!
//! `****` is an empty bold pair and reads as literal text, never as two
//! markers.

use crate::documents::blocks::{normalize_spans, DocumentBlock, HeadingLevel, Span};

const BOLD_MARKER: &str = "**";
const EMPTY_BOLD: &str = "****";
const DIVIDER: &str = "---";

enum LineKind<'a> {
    Blank,
    Heading(HeadingLevel, &'a str),
    Divider,
    Bullet(&'a str),
    Text(&'a str),
}

fn classify(line: &str) -> LineKind<'_> {
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    if line.trim() == DIVIDER {
        return LineKind::Divider;
    }
    if let Some(rest) = line.strip_prefix("### ") {
        return LineKind::Heading(HeadingLevel::H3, rest);
    }
    if let Some(rest) = line.strip_prefix("## ") {
        return LineKind::Heading(HeadingLevel::H2, rest);
    }
    if let Some(rest) = line.strip_prefix("# ") {
        return LineKind::Heading(HeadingLevel::H1, rest);
    }
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return LineKind::Bullet(rest);
    }
    LineKind::Text(line)
}

/// Parses markup into blocks, line by line.
pub fn encode(markup: &str) -> Vec<DocumentBlock> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in markup.lines() {
        match classify(line) {
            LineKind::Text(text) => paragraph.push(text),
            LineKind::Blank => flush_paragraph(&mut paragraph, &mut blocks),
            LineKind::Heading(level, text) => {
                flush_paragraph(&mut paragraph, &mut blocks);
                blocks.push(DocumentBlock::heading(level, parse_inline(text)));
            }
            LineKind::Divider => {
                flush_paragraph(&mut paragraph, &mut blocks);
                blocks.push(DocumentBlock::Divider);
            }
            LineKind::Bullet(text) => {
                flush_paragraph(&mut paragraph, &mut blocks);
                blocks.push(DocumentBlock::bullet(parse_inline(text)));
            }
        }
    }
    flush_paragraph(&mut paragraph, &mut blocks);

    blocks
}

fn flush_paragraph(lines: &mut Vec<&str>, blocks: &mut Vec<DocumentBlock>) {
    if lines.is_empty() {
        return;
    }
    let mut spans = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            spans.push(Span::plain("\n"));
        }
        spans.extend(parse_inline(line));
    }
    lines.clear();
    blocks.push(DocumentBlock::paragraph(spans));
}

/// Single pass over one line: split on bold markers, then resolve links
/// inside each segment. Nothing nests beyond a link inside a bold run.
pub fn parse_inline(text: &str) -> Vec<Span> {
    let segments = split_bold(text);
    let unmatched_opener = segments.len() % 2 == 0;
    let mut spans = Vec::new();

    for (i, segment) in segments.iter().enumerate() {
        let is_last = i + 1 == segments.len();
        if is_last && unmatched_opener {
            // odd number of markers: the final one opens nothing
            spans.push(Span::plain(format!("{BOLD_MARKER}{segment}")));
        } else {
            push_segment(segment, i % 2 == 1, &mut spans);
        }
    }

    normalize_spans(spans)
}

/// Text between bold markers; `****` stays inside the current segment.
fn split_bold(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut rest = text;

    while let Some(pos) = rest.find(BOLD_MARKER) {
        current.push_str(&rest[..pos]);
        let marker = &rest[pos..];
        if marker.starts_with(EMPTY_BOLD) {
            current.push_str(EMPTY_BOLD);
            rest = &marker[EMPTY_BOLD.len()..];
        } else {
            segments.push(std::mem::take(&mut current));
            rest = &marker[BOLD_MARKER.len()..];
        }
    }
    current.push_str(rest);
    segments.push(current);

    segments
}

fn push_segment(segment: &str, bold: bool, spans: &mut Vec<Span>) {
    let styled = |text: &str| {
        if bold {
            Span::bold(text)
        } else {
            Span::plain(text)
        }
    };

    let mut rest = segment;
    while let Some(mid) = rest.find("](") {
        let Some(open) = rest[..mid].rfind('[') else {
            spans.push(styled(&rest[..mid + 2]));
            rest = &rest[mid + 2..];
            continue;
        };
        let url_start = mid + 2;
        let Some(close) = rest[url_start..].find(')') else {
            break;
        };
        let url = &rest[url_start..url_start + close];
        let end = url_start + close + 1;
        if url.is_empty() || url.contains(char::is_whitespace) {
            spans.push(styled(&rest[..end]));
            rest = &rest[end..];
            continue;
        }
        spans.push(styled(&rest[..open]));
        spans.push(Span::Link {
            text: rest[open + 1..mid].to_string(),
            url: url.to_string(),
            bold,
        });
        rest = &rest[end..];
    }
    spans.push(styled(rest));
}

/// Re-emits canonical markup for a block sequence.
pub fn decode(blocks: &[DocumentBlock]) -> String {
    let mut out = String::new();
    let mut previous: Option<&DocumentBlock> = None;

    for block in blocks {
        if let Some(prev) = previous {
            out.push('\n');
            let list_continues = matches!(prev, DocumentBlock::BulletItem { .. })
                && matches!(block, DocumentBlock::BulletItem { .. });
            if !list_continues {
                out.push('\n');
            }
        }
        match block {
            DocumentBlock::Heading { level, spans } => {
                out.push_str(&"#".repeat(level.depth()));
                out.push(' ');
                out.push_str(&decode_inline(spans));
            }
            DocumentBlock::Paragraph { spans } => out.push_str(&decode_inline(spans)),
            DocumentBlock::BulletItem { spans } => {
                out.push_str("- ");
                out.push_str(&decode_inline(spans));
            }
            DocumentBlock::Divider => out.push_str(DIVIDER),
        }
        previous = Some(block);
    }
    if previous.is_some() {
        out.push('\n');
    }

    out
}

/// Consecutive bold runs share one pair of markers, so a bold link next to
/// bold text comes back out as the same segment it was parsed from.
pub fn decode_inline(spans: &[Span]) -> String {
    let mut out = String::new();
    let mut in_bold = false;

    for span in spans {
        if span.is_bold() != in_bold {
            out.push_str(BOLD_MARKER);
            in_bold = span.is_bold();
        }
        match span {
            Span::Plain { text } | Span::Bold { text } => out.push_str(text),
            Span::Link { text, url, .. } => {
                out.push('[');
                out.push_str(text);
                out.push_str("](");
                out.push_str(url);
                out.push(')');
            }
        }
    }
    if in_bold {
        out.push_str(BOLD_MARKER);
    }

    out
}
