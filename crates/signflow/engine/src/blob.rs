//! Object-storage collaborator boundary.
//!
//! The engine references PDFs by URL and never holds raw bytes, with one
//! exception: assembling a completion-email attachment, where the bytes
//! are fetched transiently, base64-encoded, and discarded after send.
//! Fetch failures degrade to a link-only email and never fail completion.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },
}

/// Transient read access to object storage.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    /// Fetch the object at `url` and return its bytes base64-encoded.
    async fn fetch_base64(&self, url: &str) -> Result<String, BlobError>;
}

/// Fetcher used when object storage is not reachable from this process;
/// every fetch fails, so completion emails fall back to link-only.
#[derive(Default)]
pub struct NoopBlobFetcher;

impl NoopBlobFetcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BlobFetcher for NoopBlobFetcher {
    async fn fetch_base64(&self, url: &str) -> Result<String, BlobError> {
        Err(BlobError::Fetch {
            url: url.to_string(),
            reason: "no object storage configured".to_string(),
        })
    }
}

/// Test fetcher serving pre-registered payloads by URL.
#[derive(Default)]
pub struct StaticBlobFetcher {
    blobs: Mutex<HashMap<String, String>>,
}

impl StaticBlobFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, content_base64: impl Into<String>) {
        self.blobs
            .lock()
            .expect("blobs lock")
            .insert(url.into(), content_base64.into());
    }
}

#[async_trait]
impl BlobFetcher for StaticBlobFetcher {
    async fn fetch_base64(&self, url: &str) -> Result<String, BlobError> {
        self.blobs
            .lock()
            .expect("blobs lock")
            .get(url)
            .cloned()
            .ok_or_else(|| BlobError::Fetch {
                url: url.to_string(),
                reason: "unknown url".to_string(),
            })
    }
}
