pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::documents::output::download_file;
use crate::jobs::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::health_handler))
        .route("/health", get(health::health_handler))
        .route("/webhook/notion", post(handlers::handle_webhook))
        .route(
            "/jobs/status/:page_id",
            get(handlers::handle_job_status).put(handlers::handle_set_status),
        )
        .route("/files/:filename", get(download_file))
        .with_state(state)
}
