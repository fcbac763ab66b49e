use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Aggregates the readiness of the remote store, the profile and the output
/// directory.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let pipeline = &state.pipeline;
    let store = pipeline.store();

    let notion = store.is_configured() && store.is_healthy().await;
    let generation = !pipeline.profile().personal_info.full_name.trim().is_empty();
    let rendering = pipeline.output().is_ready();

    let status = if notion && generation && rendering {
        "healthy"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "notion": notion,
            "generation": generation,
            "rendering": rendering
        },
        "publish_child_pages": state.config.publish_child_pages,
        "timestamp": Utc::now().to_rfc3339()
    }))
}
