use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::jobs::builder::property_bag;
use crate::notion::status::{read_status, JobStatus, SyncOutcome};
use crate::state::AppState;

/// POST /webhook/notion
/// Validates the event shape and hands it to the pipeline without waiting.
pub async fn handle_webhook(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let is_empty = payload.as_object().map_or(true, |obj| obj.is_empty());
    if is_empty {
        return Err(AppError::Validation("Empty payload".to_string()));
    }

    if property_bag(&payload).is_none() {
        info!("Ignoring event without properties");
        return Ok((
            StatusCode::OK,
            Json(json!({
                "status": "ignored",
                "message": "No properties in event"
            })),
        ));
    }

    state.pipeline.spawn(payload);

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "accepted",
            "message": "Job processing started"
        })),
    ))
}

/// GET /jobs/status/:page_id
pub async fn handle_job_status(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let properties = state.pipeline.store().fetch_properties(&page_id).await?;

    Ok(Json(json!({
        "page_id": page_id,
        "status": read_status(&properties),
    })))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

/// PUT /jobs/status/:page_id
/// Manual status change, written through the same schema-tolerant path as
/// the pipeline's own write-back.
pub async fn handle_set_status(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<SyncOutcome>, AppError> {
    let requested = body.status.trim();
    if requested.is_empty() {
        return Err(AppError::Validation("status must not be empty".to_string()));
    }

    let target = JobStatus::from(requested);
    let outcome = state
        .pipeline
        .synchronizer()
        .sync(&page_id, &target, &[])
        .await;
    info!("Manual status '{}' on {page_id}: {outcome:?}", target.name());

    Ok(Json(outcome))
}
