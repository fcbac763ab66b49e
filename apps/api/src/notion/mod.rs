/// Remote record client: the single point of entry for all calls to the
/// workspace service.
///
/// Everything else talks to the service through the `RecordStore` trait, so
/// the pipeline can run against the in-memory store in tests.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::documents::blocks::DocumentBlock;

pub mod blocks;
pub mod properties;
pub mod status;
#[cfg(test)]
pub mod testing;

use blocks::{to_remote_blocks, MAX_CHILDREN_PER_REQUEST};

pub const DEFAULT_API_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum NotionError {
    #[error("remote client is not configured (NOTION_API_KEY unset)")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Read/write access to remote records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Current property bag of a record.
    async fn fetch_properties(&self, page_id: &str) -> Result<Map<String, Value>, NotionError>;

    /// Partial update; only the given properties are touched.
    async fn update_properties(
        &self,
        page_id: &str,
        properties: Map<String, Value>,
    ) -> Result<(), NotionError>;

    /// Creates a child page under `parent_id` holding `blocks`; returns its id.
    async fn create_child_page(
        &self,
        parent_id: &str,
        title: &str,
        blocks: &[DocumentBlock],
    ) -> Result<String, NotionError>;

    fn is_configured(&self) -> bool;

    async fn is_healthy(&self) -> bool;
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// reqwest-backed client for the workspace REST API.
#[derive(Clone)]
pub struct NotionClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl NotionClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Result<Self, NotionError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    /// One request, no retries. Non-2xx responses become `NotionError::Api`.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, NotionError> {
        let api_key = self.api_key.as_deref().ok_or(NotionError::NotConfigured)?;
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(api_key)
            .header("Notion-Version", NOTION_VERSION);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            warn!("{method} {path} returned {status}: {message}");
            return Err(NotionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("{method} {path} succeeded");
        Ok(response.json().await?)
    }

    async fn append_children(&self, block_id: &str, children: &[Value]) -> Result<(), NotionError> {
        let body = json!({ "children": children });
        self.send(
            Method::PATCH,
            &format!("/blocks/{block_id}/children"),
            Some(&body),
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for NotionClient {
    async fn fetch_properties(&self, page_id: &str) -> Result<Map<String, Value>, NotionError> {
        let page = self
            .send(Method::GET, &format!("/pages/{page_id}"), None)
            .await?;
        page.get("properties")
            .and_then(Value::as_object)
            .cloned()
            .ok_or_else(|| {
                NotionError::MalformedResponse(format!("page {page_id} has no properties map"))
            })
    }

    async fn update_properties(
        &self,
        page_id: &str,
        properties: Map<String, Value>,
    ) -> Result<(), NotionError> {
        let body = json!({ "properties": properties });
        self.send(Method::PATCH, &format!("/pages/{page_id}"), Some(&body))
            .await?;
        Ok(())
    }

    async fn create_child_page(
        &self,
        parent_id: &str,
        title: &str,
        blocks: &[DocumentBlock],
    ) -> Result<String, NotionError> {
        let children = to_remote_blocks(blocks);
        let mut batches = children.chunks(MAX_CHILDREN_PER_REQUEST);
        let first = batches.next().unwrap_or(&[]);

        let body = json!({
            "parent": { "page_id": parent_id },
            "properties": {
                "title": { "title": [{ "type": "text", "text": { "content": title } }] }
            },
            "children": first,
        });
        let page = self.send(Method::POST, "/pages", Some(&body)).await?;
        let page_id = page
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| NotionError::MalformedResponse("created page has no id".to_string()))?
            .to_string();

        for batch in batches {
            self.append_children(&page_id, batch).await?;
        }

        Ok(page_id)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn is_healthy(&self) -> bool {
        if !self.is_configured() {
            return false;
        }
        match self.send(Method::GET, "/users/me", None).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Remote health check failed: {e}");
                false
            }
        }
    }
}
