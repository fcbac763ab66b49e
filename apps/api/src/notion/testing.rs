//! In-memory `RecordStore` with failure injection, for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::documents::blocks::DocumentBlock;
use crate::notion::{NotionError, RecordStore};

#[derive(Default)]
pub struct InMemoryRecordStore {
    pages: Mutex<HashMap<String, Map<String, Value>>>,
    update_attempts: Mutex<Vec<(String, Map<String, Value>)>>,
    child_pages: Mutex<Vec<(String, String, Vec<DocumentBlock>)>>,
    fail_fetch: AtomicBool,
    fail_child_pages: AtomicBool,
    failing_updates: AtomicUsize,
}

impl InMemoryRecordStore {
    pub fn with_page(page_id: &str, properties: Value) -> Self {
        let store = Self::default();
        store.pages.lock().unwrap().insert(
            page_id.to_string(),
            properties.as_object().cloned().unwrap_or_default(),
        );
        store
    }

    pub fn fail_fetches(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }

    pub fn fail_child_pages(&self) {
        self.fail_child_pages.store(true, Ordering::SeqCst);
    }

    /// The next `count` updates are rejected.
    pub fn fail_next_updates(&self, count: usize) {
        self.failing_updates.store(count, Ordering::SeqCst);
    }

    /// Every update payload received, including rejected ones.
    pub fn update_attempts(&self) -> Vec<(String, Map<String, Value>)> {
        self.update_attempts.lock().unwrap().clone()
    }

    pub fn child_pages(&self) -> Vec<(String, String, Vec<DocumentBlock>)> {
        self.child_pages.lock().unwrap().clone()
    }

    pub fn properties(&self, page_id: &str) -> Option<Map<String, Value>> {
        self.pages.lock().unwrap().get(page_id).cloned()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn fetch_properties(&self, page_id: &str) -> Result<Map<String, Value>, NotionError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(NotionError::Api {
                status: 502,
                message: "fetch rejected".to_string(),
            });
        }
        self.pages
            .lock()
            .unwrap()
            .get(page_id)
            .cloned()
            .ok_or_else(|| NotionError::Api {
                status: 404,
                message: format!("page {page_id} not found"),
            })
    }

    async fn update_properties(
        &self,
        page_id: &str,
        properties: Map<String, Value>,
    ) -> Result<(), NotionError> {
        self.update_attempts
            .lock()
            .unwrap()
            .push((page_id.to_string(), properties.clone()));

        let remaining = self.failing_updates.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_updates.store(remaining - 1, Ordering::SeqCst);
            return Err(NotionError::Api {
                status: 400,
                message: "validation_error".to_string(),
            });
        }

        // merged into the existing property so its `type` tag survives
        let mut pages = self.pages.lock().unwrap();
        let page = pages.entry(page_id.to_string()).or_default();
        for (key, value) in properties {
            let slot = page
                .entry(key)
                .or_insert_with(|| Value::Object(Map::new()));
            if let (Some(slot), Value::Object(update)) = (slot.as_object_mut(), value) {
                for (shape, inner) in update {
                    slot.entry("type")
                        .or_insert_with(|| Value::String(shape.clone()));
                    slot.insert(shape, inner);
                }
            }
        }
        Ok(())
    }

    async fn create_child_page(
        &self,
        parent_id: &str,
        title: &str,
        blocks: &[DocumentBlock],
    ) -> Result<String, NotionError> {
        if self.fail_child_pages.load(Ordering::SeqCst) {
            return Err(NotionError::Api {
                status: 500,
                message: "child page rejected".to_string(),
            });
        }
        let mut pages = self.child_pages.lock().unwrap();
        pages.push((parent_id.to_string(), title.to_string(), blocks.to_vec()));
        Ok(format!("{parent_id}-child-{}", pages.len()))
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn is_healthy(&self) -> bool {
        !self.fail_fetch.load(Ordering::SeqCst)
    }
}
