mod config;
mod documents;
mod errors;
mod jobs;
mod notion;
mod profile;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::documents::output::OutputWriter;
use crate::jobs::pipeline::JobPipeline;
use crate::notion::{NotionClient, RecordStore};
use crate::profile::loader::load_profile;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobBuilder API v{}", env!("CARGO_PKG_VERSION"));

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("cannot create output dir {}", config.output_dir.display()))?;
    let output = OutputWriter::new(config.output_dir.clone());

    let profile = Arc::new(load_profile(&config.data_dir));

    let store: Arc<dyn RecordStore> = Arc::new(NotionClient::new(
        config.notion_api_key.clone(),
        config.notion_api_url.clone(),
    )?);
    if store.is_configured() {
        info!("Remote record client initialized ({})", config.notion_api_url);
    } else {
        warn!("NOTION_API_KEY not set; status write-back and page publishing are disabled");
    }

    let pipeline = Arc::new(JobPipeline::new(
        profile,
        store,
        output,
        config.publish_child_pages,
    ));

    let state = AppState {
        config: config.clone(),
        pipeline,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
