//! Property extraction: decodes typed values out of a remote record's
//! property bag.
//!
//! The bag comes from an uncontrolled source, so nothing here fails: any
//! shape that does not match its declared type reads as "no value".

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::notion::blocks::run_text;

/// A property value, decoded according to its declared type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Text of each run, in order.
    Title(Vec<String>),
    RichText(Vec<String>),
    Select(Option<String>),
    Status(Option<String>),
    MultiSelect(Vec<String>),
    /// Missing or unsupported type tag.
    Unrecognized(Option<String>),
}

impl PropertyValue {
    pub fn parse(value: &Value) -> Self {
        let tag = value.get("type").and_then(Value::as_str);
        match tag {
            Some("title") => PropertyValue::Title(runs(value.get("title"))),
            Some("rich_text") => PropertyValue::RichText(runs(value.get("rich_text"))),
            Some("select") => PropertyValue::Select(option_name(value.get("select"))),
            Some("status") => PropertyValue::Status(option_name(value.get("status"))),
            Some("multi_select") => PropertyValue::MultiSelect(
                value
                    .get("multi_select")
                    .and_then(Value::as_array)
                    .map(|options| {
                        options
                            .iter()
                            .filter_map(|o| option_name(Some(o)))
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            other => PropertyValue::Unrecognized(other.map(str::to_string)),
        }
    }

    pub fn type_tag(&self) -> &str {
        match self {
            PropertyValue::Title(_) => "title",
            PropertyValue::RichText(_) => "rich_text",
            PropertyValue::Select(_) => "select",
            PropertyValue::Status(_) => "status",
            PropertyValue::MultiSelect(_) => "multi_select",
            PropertyValue::Unrecognized(Some(tag)) => tag,
            PropertyValue::Unrecognized(None) => "<missing>",
        }
    }

    /// Joined run text for title/rich_text values; `None` for everything else
    /// and for empty text.
    pub fn text(&self) -> Option<String> {
        match self {
            PropertyValue::Title(runs) | PropertyValue::RichText(runs) => {
                let joined: String = runs.concat();
                let trimmed = joined.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            _ => None,
        }
    }
}

fn runs(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(run_text)
                .collect()
        })
        .unwrap_or_default()
}

fn option_name(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.get("name"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// What one candidate field held when read as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextLookup {
    /// No property under that name.
    Absent,
    /// A `title`/`rich_text` property whose run list is empty.
    NoRuns(String),
    /// Runs present, but all blank.
    Blank(String),
    /// Any other type tag.
    NotText(String),
    Found(String),
}

impl TextLookup {
    /// Diagnostic line for the lookup; each case reads differently.
    pub fn describe(&self, name: &str) -> String {
        match self {
            TextLookup::Absent => format!("Property '{name}' absent"),
            TextLookup::NoRuns(tag) => format!("Property '{name}' is {tag} with no runs"),
            TextLookup::Blank(tag) => format!("Property '{name}' is {tag} with blank runs"),
            TextLookup::NotText(tag) => {
                format!("Property '{name}' has type '{tag}', not a text shape")
            }
            TextLookup::Found(text) => format!("Property '{name}' resolved ({} chars)", text.len()),
        }
    }
}

pub fn lookup_text(properties: &Map<String, Value>, name: &str) -> TextLookup {
    let Some(raw) = properties.get(name) else {
        return TextLookup::Absent;
    };
    let value = PropertyValue::parse(raw);
    match &value {
        PropertyValue::Title(runs) | PropertyValue::RichText(runs) if runs.is_empty() => {
            TextLookup::NoRuns(value.type_tag().to_string())
        }
        PropertyValue::Title(_) | PropertyValue::RichText(_) => match value.text() {
            Some(text) => TextLookup::Found(text),
            None => TextLookup::Blank(value.type_tag().to_string()),
        },
        other => TextLookup::NotText(other.type_tag().to_string()),
    }
}

/// Returns the text of the first candidate field that yields any.
///
/// Only `title` and `rich_text` properties carry text; other types, missing
/// type tags and empty run lists fall through to the next name.
pub fn extract_text(properties: &Map<String, Value>, field_names: &[&str]) -> Option<String> {
    for name in field_names {
        let lookup = lookup_text(properties, name);
        debug!("{}", lookup.describe(name));
        if let TextLookup::Found(text) = lookup {
            return Some(text);
        }
    }
    None
}

/// Like `extract_text`, but select and status names also count.
pub fn extract_choice(properties: &Map<String, Value>, field_names: &[&str]) -> Option<String> {
    field_names.iter().find_map(|name| {
        let value = PropertyValue::parse(properties.get(*name)?);
        match value {
            PropertyValue::Select(option) | PropertyValue::Status(option) => option,
            other => other.text(),
        }
    })
}

/// Multi-select option names, or comma-separated text, from the first
/// candidate field that yields a non-empty list.
pub fn extract_list(properties: &Map<String, Value>, field_names: &[&str]) -> Vec<String> {
    field_names
        .iter()
        .find_map(|name| {
            let value = PropertyValue::parse(properties.get(*name)?);
            let items: Vec<String> = match value {
                PropertyValue::MultiSelect(names) => names,
                other => other
                    .text()
                    .map(|text| {
                        text.split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
            };
            (!items.is_empty()).then_some(items)
        })
        .unwrap_or_default()
}

/// Name, type tag and keys of one property, for operator diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyDiagnostic {
    pub name: String,
    pub type_tag: String,
    pub keys: Vec<String>,
}

pub fn describe_properties(properties: &Map<String, Value>) -> Vec<PropertyDiagnostic> {
    properties
        .iter()
        .map(|(name, raw)| PropertyDiagnostic {
            name: name.clone(),
            type_tag: raw
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("<missing>")
                .to_string(),
            keys: raw
                .as_object()
                .map(|o| o.keys().cloned().collect())
                .unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_title_runs_are_concatenated() {
        let props = bag(json!({
            "Job Title": {"type": "title", "title": [
                {"plain_text": "Senior "},
                {"text": {"content": "Engineer"}}
            ]}
        }));
        assert_eq!(
            extract_text(&props, &["Job Title"]),
            Some("Senior Engineer".to_string())
        );
    }

    #[test]
    fn test_falls_through_to_next_candidate() {
        let props = bag(json!({
            "Name": {"type": "title", "title": []},
            "Title": {"type": "rich_text", "rich_text": [{"plain_text": "Analyst"}]}
        }));
        assert_eq!(
            extract_text(&props, &["Job Title", "Name", "Title"]),
            Some("Analyst".to_string())
        );
    }

    #[test]
    fn test_empty_run_list_is_told_apart_from_absent() {
        let props = bag(json!({
            "Company": {"type": "rich_text", "rich_text": []},
            "Employer": {"type": "rich_text", "rich_text": [{"plain_text": " "}]}
        }));

        let empty = lookup_text(&props, "Company");
        let absent = lookup_text(&props, "Organization");
        assert_eq!(empty, TextLookup::NoRuns("rich_text".to_string()));
        assert_eq!(absent, TextLookup::Absent);
        assert_eq!(
            lookup_text(&props, "Employer"),
            TextLookup::Blank("rich_text".to_string())
        );
        assert_ne!(empty.describe("Company"), absent.describe("Company"));
        assert_eq!(absent.describe("Organization"), "Property 'Organization' absent");

        // both read as no text
        assert_eq!(extract_text(&props, &["Company"]), None);
        assert_eq!(extract_text(&props, &["Organization"]), None);
    }

    #[test]
    fn test_unknown_or_missing_tag_is_absent() {
        let props = bag(json!({
            "A": {"type": "formula", "formula": {"string": "x"}},
            "B": {"title": [{"plain_text": "no tag"}]},
        }));
        assert_eq!(extract_text(&props, &["A", "B"]), None);
    }

    #[test]
    fn test_malformed_shapes_never_panic() {
        let props = bag(json!({
            "A": "just a string",
            "B": {"type": "title", "title": "not a list"},
            "C": {"type": "rich_text", "rich_text": [1, null, {"text": 7}]},
            "D": {"type": 42},
            "E": null,
        }));
        assert_eq!(extract_text(&props, &["A", "B", "C", "D", "E"]), None);
    }

    #[test]
    fn test_whitespace_only_text_is_absent() {
        let props = bag(json!({
            "Company": {"type": "rich_text", "rich_text": [{"plain_text": "   "}]},
            "Employer": {"type": "rich_text", "rich_text": [{"plain_text": " Acme "}]}
        }));
        assert_eq!(
            extract_text(&props, &["Company", "Employer"]),
            Some("Acme".to_string())
        );
    }

    #[test]
    fn test_select_is_not_text() {
        let props = bag(json!({"Role": {"type": "select", "select": {"name": "Dev"}}}));
        assert_eq!(extract_text(&props, &["Role"]), None);
        assert_eq!(extract_choice(&props, &["Role"]), Some("Dev".to_string()));
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(
            PropertyValue::parse(&json!({"type": "status", "status": {"name": "Done"}})),
            PropertyValue::Status(Some("Done".to_string()))
        );
        assert_eq!(
            PropertyValue::parse(&json!({"type": "select", "select": null})),
            PropertyValue::Select(None)
        );
        assert_eq!(
            PropertyValue::parse(&json!({"type": "multi_select", "multi_select": [
                {"name": "Rust"}, {"id": "x"}, {"name": "Go"}
            ]})),
            PropertyValue::MultiSelect(vec!["Rust".to_string(), "Go".to_string()])
        );
        assert_eq!(
            PropertyValue::parse(&json!({"type": "checkbox", "checkbox": true})).type_tag(),
            "checkbox"
        );
    }

    #[test]
    fn test_extract_list_from_multi_select_or_text() {
        let props = bag(json!({
            "Required Skills": {"type": "multi_select", "multi_select": []},
            "Skills": {"type": "rich_text", "rich_text": [{"plain_text": "Rust, SQL ,, Go"}]}
        }));
        assert_eq!(
            extract_list(&props, &["Required Skills", "Skills"]),
            vec!["Rust", "SQL", "Go"]
        );
        assert!(extract_list(&props, &["Missing"]).is_empty());
    }

    #[test]
    fn test_describe_properties_lists_types() {
        let props = bag(json!({
            "Status": {"type": "status", "status": null},
            "Odd": "text",
        }));
        let diagnostics = describe_properties(&props);
        assert_eq!(diagnostics.len(), 2);
        let odd = diagnostics.iter().find(|d| d.name == "Odd").unwrap();
        assert_eq!(odd.type_tag, "<missing>");
        assert!(odd.keys.is_empty());
        let status = diagnostics.iter().find(|d| d.name == "Status").unwrap();
        assert_eq!(status.keys, vec!["status", "type"]);
    }
}
