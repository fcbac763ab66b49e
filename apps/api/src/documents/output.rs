use std::path::PathBuf;

use axum::{
    extract::{Path as UrlPath, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::documents::blocks::plain_text;
use crate::documents::codec;
use crate::documents::composer::ApplicationDocuments;
use crate::errors::AppError;
use crate::state::AppState;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const MARKUP_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

/// Paths of the markup files written for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    pub cover_letter: PathBuf,
    pub resume: PathBuf,
}

impl GeneratedFiles {
    pub fn paths(&self) -> Vec<PathBuf> {
        vec![self.cover_letter.clone(), self.resume.clone()]
    }
}

/// Company name as it appears in generated file names.
pub fn file_safe_company(company: &str) -> String {
    company
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace(['/', '\\'], "")
}

pub fn file_names(company: &str, generated_at: NaiveDateTime) -> (String, String) {
    let stem = format!(
        "{}_{}",
        file_safe_company(company),
        generated_at.format(TIMESTAMP_FORMAT)
    );
    (
        format!("cover_letter_{stem}.md"),
        format!("resume_{stem}.md"),
    )
}

/// Writes composed documents as markup files under one directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn is_ready(&self) -> bool {
        self.dir.is_dir()
    }

    pub async fn write(
        &self,
        documents: &ApplicationDocuments,
        company: &str,
        generated_at: NaiveDateTime,
    ) -> std::io::Result<GeneratedFiles> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let (cover_name, resume_name) = file_names(company, generated_at);

        let files = GeneratedFiles {
            cover_letter: self.dir.join(cover_name),
            resume: self.dir.join(resume_name),
        };
        tokio::fs::write(&files.cover_letter, documents.cover_letter.markup()).await?;
        tokio::fs::write(&files.resume, documents.resume.markup()).await?;

        info!(
            "Wrote {} and {}",
            files.cover_letter.display(),
            files.resume.display()
        );
        Ok(files)
    }

    /// Path of a downloadable file, or `None` when the name could escape
    /// the output directory.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let unsafe_name = filename.is_empty()
            || filename.contains(['/', '\\'])
            || filename.contains("..");
        if unsafe_name {
            None
        } else {
            Some(self.dir.join(filename))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadParams {
    /// `blocks` returns the parsed block tree instead of the raw file.
    pub format: Option<String>,
}

/// GET /files/:filename
pub async fn download_file(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, AppError> {
    let path = state
        .pipeline
        .output()
        .resolve(&filename)
        .ok_or_else(|| AppError::Validation(format!("invalid file name '{filename}'")))?;

    let content = match tokio::fs::read(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("file '{filename}' not found")));
        }
        Err(e) => return Err(AppError::Internal(e.into())),
    };

    match params.format.as_deref() {
        None | Some("markup") => {}
        Some("blocks") => {
            let markup = String::from_utf8_lossy(&content);
            let blocks = codec::encode(&markup);
            return Ok(Json(json!({
                "filename": filename,
                "text": plain_text(&blocks),
                "blocks": blocks,
            }))
            .into_response());
        }
        Some(other) => {
            return Err(AppError::Validation(format!("unknown format '{other}'")));
        }
    }

    Ok((
        [
            (header::CONTENT_TYPE, MARKUP_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        content,
    )
        .into_response())
}
