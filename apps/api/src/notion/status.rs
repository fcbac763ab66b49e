//! Status synchronization: writes a job's processing state back onto its
//! source record, in whatever shape the record's "Status" field uses today.
//!
//! The schema is re-read before every write. Failures degrade to a single
//! status-only update and are then reported, never raised.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::notion::properties::PropertyValue;
use crate::notion::{NotionError, RecordStore};

pub const STATUS_FIELD: &str = "Status";
pub const GENERATED_FLAG_FIELD: &str = "Application Generated";
pub const GENERATED_DATE_FIELD: &str = "Generated Date";
pub const GENERATED_FILES_FIELD: &str = "Generated Files";

/// Option names required by the `status` shape, keyed by requested name.
const STATUS_ALIASES: &[(&str, &str)] = &[
    ("Complete", "Done"),
    ("Completed", "Done"),
    ("Not Started", "Not started"),
    ("In Progress", "In progress"),
];

/// Processing state of a job as this service names it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    NotStarted,
    Generated,
    Applied,
    InProgress,
    Complete,
    /// Any other state the remote workspace defines.
    Other(String),
}

impl JobStatus {
    pub fn name(&self) -> &str {
        match self {
            JobStatus::NotStarted => "Not Started",
            JobStatus::Generated => "Generated",
            JobStatus::Applied => "Applied",
            JobStatus::InProgress => "In Progress",
            JobStatus::Complete => "Complete",
            JobStatus::Other(name) => name,
        }
    }
}

impl From<&str> for JobStatus {
    fn from(name: &str) -> Self {
        match name {
            "Not Started" => JobStatus::NotStarted,
            "Generated" => JobStatus::Generated,
            "Applied" => JobStatus::Applied,
            "In Progress" => JobStatus::InProgress,
            "Complete" => JobStatus::Complete,
            other => JobStatus::Other(other.to_string()),
        }
    }
}

/// Maps a requested name onto the option name the `status` shape expects.
pub fn status_option_name(requested: &str) -> &str {
    STATUS_ALIASES
        .iter()
        .find(|(from, _)| *from == requested)
        .map(|(_, to)| *to)
        .unwrap_or(requested)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusShape {
    Select,
    Status,
    MultiSelect,
    RichText,
    Unrecognized(String),
    Absent,
}

/// Which status shape and optional fields a record declares right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStatusSchema {
    pub status_shape: StatusShape,
    pub has_generated_flag: bool,
    pub has_generated_date: bool,
    pub has_generated_files: bool,
}

impl RemoteStatusSchema {
    pub fn from_properties(properties: &Map<String, Value>) -> Self {
        let declares = |field: &str, tag: &str| {
            properties
                .get(field)
                .and_then(|p| p.get("type"))
                .and_then(Value::as_str)
                == Some(tag)
        };

        let status_shape = match properties.get(STATUS_FIELD) {
            None => StatusShape::Absent,
            Some(raw) => match raw.get("type").and_then(Value::as_str) {
                Some("select") => StatusShape::Select,
                Some("status") => StatusShape::Status,
                Some("multi_select") => StatusShape::MultiSelect,
                Some("rich_text") => StatusShape::RichText,
                Some(other) => StatusShape::Unrecognized(other.to_string()),
                None => StatusShape::Unrecognized("<missing>".to_string()),
            },
        };

        Self {
            status_shape,
            has_generated_flag: declares(GENERATED_FLAG_FIELD, "checkbox"),
            has_generated_date: declares(GENERATED_DATE_FIELD, "date"),
            has_generated_files: declares(GENERATED_FILES_FIELD, "rich_text"),
        }
    }
}

/// How a status write ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Full update accepted; lists the fields written.
    Updated { fields: Vec<String> },
    /// Full update failed, minimal status-only update accepted.
    Fallback { reason: String },
    /// Nothing on the live schema could be written.
    Skipped,
    /// Both attempts failed.
    Failed { reason: String },
}

/// Status value wrapped in the given shape, or `None` when the shape cannot
/// carry it.
pub fn status_value(shape: &StatusShape, requested: &str) -> Option<Value> {
    match shape {
        StatusShape::Select => Some(json!({ "select": { "name": requested } })),
        StatusShape::MultiSelect => Some(json!({ "multi_select": [{ "name": requested }] })),
        StatusShape::Status => Some(json!({
            "status": { "name": status_option_name(requested) }
        })),
        StatusShape::RichText => Some(json!({
            "rich_text": [{ "type": "text", "text": { "content": requested } }]
        })),
        StatusShape::Unrecognized(_) | StatusShape::Absent => None,
    }
}

/// Partial property map for a full status write, gated on the live schema.
///
/// The generation fields are written only alongside generated files; a
/// status change with an empty file list carries `Status` alone.
pub fn build_update(
    schema: &RemoteStatusSchema,
    target: &JobStatus,
    generated_files: &[PathBuf],
    today: &str,
) -> Map<String, Value> {
    let mut properties = Map::new();

    match status_value(&schema.status_shape, target.name()) {
        Some(value) => {
            properties.insert(STATUS_FIELD.to_string(), value);
        }
        None => warn!(
            "Skipping '{STATUS_FIELD}' field: unsupported shape {:?}",
            schema.status_shape
        ),
    }

    if generated_files.is_empty() {
        return properties;
    }
    if schema.has_generated_flag {
        properties.insert(
            GENERATED_FLAG_FIELD.to_string(),
            json!({ "checkbox": true }),
        );
    }
    if schema.has_generated_date {
        properties.insert(
            GENERATED_DATE_FIELD.to_string(),
            json!({ "date": { "start": today } }),
        );
    }
    if schema.has_generated_files {
        let names = generated_files
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        properties.insert(
            GENERATED_FILES_FIELD.to_string(),
            json!({ "rich_text": [{ "type": "text", "text": { "content": names } }] }),
        );
    }

    properties
}

/// Reads the current status name from a record, whatever its shape.
pub fn read_status(properties: &Map<String, Value>) -> Option<String> {
    match PropertyValue::parse(properties.get(STATUS_FIELD)?) {
        PropertyValue::Select(name) | PropertyValue::Status(name) => name,
        PropertyValue::MultiSelect(names) if !names.is_empty() => Some(names.join(", ")),
        other => other.text(),
    }
}

pub struct StatusSynchronizer {
    store: Arc<dyn RecordStore>,
}

impl StatusSynchronizer {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn sync(
        &self,
        source_id: &str,
        target: &JobStatus,
        generated_files: &[PathBuf],
    ) -> SyncOutcome {
        if source_id.is_empty() {
            warn!("Status write skipped: record has no id");
            return SyncOutcome::Failed {
                reason: "record has no id".to_string(),
            };
        }

        let reason = match self.full_update(source_id, target, generated_files).await {
            Ok(outcome) => return outcome,
            Err(e) => e.to_string(),
        };
        warn!("Status update for {source_id} failed ({reason}); retrying with status only");

        let minimal = Map::from_iter([(
            STATUS_FIELD.to_string(),
            json!({ "status": { "name": status_option_name(target.name()) } }),
        )]);
        match self.store.update_properties(source_id, minimal).await {
            Ok(()) => {
                info!("Fallback status update for {source_id} succeeded");
                SyncOutcome::Fallback { reason }
            }
            Err(e) => {
                warn!("Fallback status update for {source_id} failed: {e}");
                SyncOutcome::Failed {
                    reason: format!("{reason}; fallback: {e}"),
                }
            }
        }
    }

    async fn full_update(
        &self,
        source_id: &str,
        target: &JobStatus,
        generated_files: &[PathBuf],
    ) -> Result<SyncOutcome, NotionError> {
        let live = self.store.fetch_properties(source_id).await?;
        let schema = RemoteStatusSchema::from_properties(&live);
        let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
        let properties = build_update(&schema, target, generated_files, &today);

        if properties.is_empty() {
            warn!("Nothing on record {source_id} can take a status write");
            return Ok(SyncOutcome::Skipped);
        }

        let fields: Vec<String> = properties.keys().cloned().collect();
        self.store.update_properties(source_id, properties).await?;
        info!(
            "Updated record {source_id} with status '{}' ({} fields)",
            target.name(),
            fields.len()
        );
        Ok(SyncOutcome::Updated { fields })
    }
}
