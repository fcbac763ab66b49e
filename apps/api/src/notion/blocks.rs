//! Conversion between `DocumentBlock` and the remote service's block JSON.

use serde_json::{json, Map, Value};

use crate::documents::blocks::{DocumentBlock, HeadingLevel, Span};

/// The remote service rejects rich-text objects whose content exceeds this.
pub const MAX_RICH_TEXT_CHARS: usize = 2000;
/// Maximum children accepted per create/append request.
pub const MAX_CHILDREN_PER_REQUEST: usize = 100;

pub fn to_remote_block(block: &DocumentBlock) -> Value {
    let (block_type, spans) = match block {
        DocumentBlock::Heading { level, spans } => (
            match level {
                HeadingLevel::H1 => "heading_1",
                HeadingLevel::H2 => "heading_2",
                HeadingLevel::H3 => "heading_3",
            },
            spans,
        ),
        DocumentBlock::Paragraph { spans } => ("paragraph", spans),
        DocumentBlock::BulletItem { spans } => ("bulleted_list_item", spans),
        DocumentBlock::Divider => {
            return json!({ "object": "block", "type": "divider", "divider": {} });
        }
    };

    let mut value = Map::new();
    value.insert("object".to_string(), json!("block"));
    value.insert("type".to_string(), json!(block_type));
    value.insert(
        block_type.to_string(),
        json!({ "rich_text": to_rich_text(spans) }),
    );
    Value::Object(value)
}

pub fn to_remote_blocks(blocks: &[DocumentBlock]) -> Vec<Value> {
    blocks.iter().map(to_remote_block).collect()
}

/// Builds rich-text objects for a span list, splitting long runs.
pub fn to_rich_text(spans: &[Span]) -> Vec<Value> {
    let mut objects = Vec::new();
    for span in spans {
        let (url, bold) = match span {
            Span::Plain { .. } => (None, false),
            Span::Bold { .. } => (None, true),
            Span::Link { url, bold, .. } => (Some(url.as_str()), *bold),
        };
        for chunk in chunk_chars(span.text(), MAX_RICH_TEXT_CHARS) {
            let link = match url {
                Some(url) => json!({ "url": url }),
                None => Value::Null,
            };
            objects.push(json!({
                "type": "text",
                "text": { "content": chunk, "link": link },
                "annotations": { "bold": bold },
            }));
        }
    }
    objects
}

fn chunk_chars(text: &str, max: usize) -> Vec<String> {
    if text.is_empty() {
        // empty link text still needs one object to carry the URL
        return vec![String::new()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(max).map(|c| c.iter().collect()).collect()
}

/// Text of one rich-text run: `plain_text` when non-empty, else
/// `text.content`, else empty.
pub fn run_text(run: &Map<String, Value>) -> String {
    if let Some(plain) = run.get("plain_text").and_then(Value::as_str) {
        if !plain.is_empty() {
            return plain.to_string();
        }
    }
    run.get("text")
        .and_then(|t| t.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
