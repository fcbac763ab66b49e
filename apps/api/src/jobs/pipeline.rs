//! Per-event processing: extract → customize → compose → write → publish →
//! sync. Each run is scoped to one job; no failure here reaches the process.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::documents::composer::{compose, ApplicationDocuments};
use crate::documents::output::OutputWriter;
use crate::jobs::builder::{build_job_record, unwrap_envelope, JobRecordError};
use crate::jobs::models::JobRecord;
use crate::notion::status::{JobStatus, StatusSynchronizer, SyncOutcome};
use crate::notion::RecordStore;
use crate::profile::customizer::customize;
use crate::profile::models::CandidateProfile;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    JobRecord(#[from] JobRecordError),

    #[error("failed to write generated documents: {0}")]
    Output(#[from] std::io::Error),
}

/// Result of one successful run.
#[derive(Debug, Clone, Serialize)]
pub struct JobOutcome {
    pub run_id: Uuid,
    pub job: JobRecord,
    pub files: Vec<PathBuf>,
    /// Ids of child pages created under the source record.
    pub published_pages: Vec<String>,
    pub sync: SyncOutcome,
}

pub struct JobPipeline {
    profile: Arc<CandidateProfile>,
    store: Arc<dyn RecordStore>,
    synchronizer: StatusSynchronizer,
    output: OutputWriter,
    publish_pages: bool,
}

impl JobPipeline {
    pub fn new(
        profile: Arc<CandidateProfile>,
        store: Arc<dyn RecordStore>,
        output: OutputWriter,
        publish_pages: bool,
    ) -> Self {
        Self {
            profile,
            synchronizer: StatusSynchronizer::new(store.clone()),
            store,
            output,
            publish_pages,
        }
    }

    pub fn profile(&self) -> &CandidateProfile {
        &self.profile
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn output(&self) -> &OutputWriter {
        &self.output
    }

    pub fn synchronizer(&self) -> &StatusSynchronizer {
        &self.synchronizer
    }

    /// Runs the job on the runtime without waiting for it.
    pub fn spawn(self: &Arc<Self>, payload: Value) -> JoinHandle<()> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            match pipeline.process(&payload).await {
                Ok(outcome) => info!(
                    "Job {} finished: {} files, status {:?}",
                    outcome.run_id,
                    outcome.files.len(),
                    outcome.sync
                ),
                Err(e) => error!("Job processing aborted: {e}"),
            }
        })
    }

    pub async fn process(&self, payload: &Value) -> Result<JobOutcome, PipelineError> {
        let run_id = Uuid::new_v4();
        let source_id = unwrap_envelope(payload)
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let span = info_span!("job", %run_id, source_id = %source_id);

        self.run(run_id, payload).instrument(span).await
    }

    async fn run(&self, run_id: Uuid, payload: &Value) -> Result<JobOutcome, PipelineError> {
        let job = match build_job_record(payload) {
            Ok(job) => job,
            Err(e) => {
                let JobRecordError::NotFound { properties } = &e;
                error!("{e}; available properties:");
                for property in properties {
                    error!(
                        "  '{}' (type: {}, keys: {:?})",
                        property.name, property.type_tag, property.keys
                    );
                }
                return Err(e.into());
            }
        };
        info!("Processing '{}' at '{}'", job.title(), job.company_name());

        let tailored = customize(&self.profile, &job);
        info!("Matched {} profile skills", tailored.matched_skills.len());

        let now = Local::now();
        let documents = compose(&job, &tailored, now.date_naive());
        let files = self
            .output
            .write(&documents, job.company_name(), now.naive_local())
            .await?
            .paths();

        let published_pages = if self.publish_pages {
            self.publish(job.source_id(), &documents).await
        } else {
            Vec::new()
        };

        let sync = self
            .synchronizer
            .sync(job.source_id(), &JobStatus::Generated, &files)
            .await;
        match &sync {
            SyncOutcome::Updated { .. } | SyncOutcome::Fallback { .. } => {
                info!("Record status set to '{}'", JobStatus::Generated.name())
            }
            SyncOutcome::Skipped => warn!("Record status left unchanged"),
            SyncOutcome::Failed { reason } => {
                warn!("Record status not written, needs manual follow-up: {reason}")
            }
        }

        Ok(JobOutcome {
            run_id,
            job,
            files,
            published_pages,
            sync,
        })
    }

    /// Creates one child page per document. Failures are logged only.
    async fn publish(&self, source_id: &str, documents: &ApplicationDocuments) -> Vec<String> {
        if source_id.is_empty() {
            warn!("Skipping child pages: record has no id");
            return Vec::new();
        }

        let mut created = Vec::new();
        for document in [&documents.cover_letter, &documents.resume] {
            match self
                .store
                .create_child_page(source_id, &document.title, &document.blocks)
                .await
            {
                Ok(page_id) => {
                    info!("Published '{}' as {page_id}", document.title);
                    created.push(page_id);
                }
                Err(e) => warn!("Failed to publish '{}': {e}", document.title),
            }
        }
        created
    }
}
