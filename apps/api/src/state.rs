use std::sync::Arc;

use crate::config::Config;
use crate::jobs::pipeline::JobPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the profile, the remote store and the output writer.
    pub pipeline: Arc<JobPipeline>,
}
