//! Object store contract and implementations
//!
//! The object store hosts uploaded binaries (images and PDFs) and
//! returns durable public URLs plus a deletion handle. Serving and
//! deletion semantics differ by resource kind, so every call must
//! declare whether the binary is an image or a raw document; using the
//! wrong kind produces an unreachable or wrongly-typed URL.

use super::StoreError;
use crate::config::ObjectStoreConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Resource kind the store is told at upload and delete time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Image,
    /// Arbitrary binary, used for PDFs
    Raw,
}

impl ResourceKind {
    /// URL path segment the hosting service uses for this kind
    pub fn segment(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Raw => "raw",
        }
    }
}

/// Result of a successful upload
///
/// `delete_handle` may be absent, in which case deletion of the binary
/// becomes best-effort/impossible and the record's companion delete
/// logs an orphan warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    pub url: String,
    pub delete_handle: Option<String>,
}

/// Outcome of a deletion attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    Failed,
}

/// Contract for the external binary hosting service
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a binary and obtain its public URL and deletion handle.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        kind: ResourceKind,
        folder: &str,
    ) -> Result<StoredObject, StoreError>;

    /// Delete a previously uploaded binary by its handle.
    async fn delete(&self, handle: &str, kind: ResourceKind) -> Result<DeleteOutcome, StoreError>;
}

// ============================================================================
// HTTP implementation
// ============================================================================

/// REST client for a hosting service with unsigned-preset uploads
///
/// Uploads go to `{base_url}/{kind}/upload` as multipart form data;
/// deletions go to `{base_url}/{kind}/destroy` and require an API key.
/// Without a configured key, deletions are skipped and reported as
/// `Failed` so the caller logs the orphan instead of blocking.
#[derive(Clone)]
pub struct HttpObjectStore {
    client: reqwest::Client,
    base_url: String,
    upload_preset: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: Option<String>,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl HttpObjectStore {
    pub fn new(config: &ObjectStoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Unavailable {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            upload_preset: config.upload_preset.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn transport(err: reqwest::Error) -> StoreError {
        StoreError::Unavailable {
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        kind: ResourceKind,
        folder: &str,
    ) -> Result<StoredObject, StoreError> {
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes))
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", folder.to_string());

        let response = self
            .client
            .post(format!("{}/{}/upload", self.base_url, kind.segment()))
            .multipart(form)
            .send()
            .await
            .map_err(Self::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Unavailable {
                message: format!("upload rejected: {}: {}", status, body),
            });
        }

        let body: UploadResponse = response.json().await.map_err(|e| StoreError::Malformed {
            message: e.to_string(),
        })?;

        Ok(StoredObject {
            url: body.secure_url,
            delete_handle: body.public_id,
        })
    }

    async fn delete(&self, handle: &str, kind: ResourceKind) -> Result<DeleteOutcome, StoreError> {
        let api_key = match &self.api_key {
            Some(key) => key.clone(),
            None => {
                tracing::warn!(handle, "object store deletion skipped: no API key configured");
                return Ok(DeleteOutcome::Failed);
            }
        };

        let response = self
            .client
            .post(format!("{}/{}/destroy", self.base_url, kind.segment()))
            .json(&serde_json::json!({
                "public_id": handle,
                "api_key": api_key,
                "timestamp": chrono::Utc::now().timestamp(),
            }))
            .send()
            .await
            .map_err(Self::transport)?;

        if !response.status().is_success() {
            return Ok(DeleteOutcome::Failed);
        }

        let body: DestroyResponse = response.json().await.map_err(|e| StoreError::Malformed {
            message: e.to_string(),
        })?;

        Ok(match body.result.as_str() {
            "ok" => DeleteOutcome::Deleted,
            "not found" => DeleteOutcome::NotFound,
            _ => DeleteOutcome::Failed,
        })
    }
}

// ============================================================================
// In-memory double
// ============================================================================

/// In-memory double for the object store contract
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, (ResourceKind, Vec<u8>)>>,
    seq: AtomicU64,
    upload_calls: AtomicU64,
    delete_calls: AtomicU64,
    fail_uploads: Mutex<Option<StoreError>>,
    fail_deletes: Mutex<Option<StoreError>>,
    withhold_handles: std::sync::atomic::AtomicBool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_upload(&self, err: StoreError) {
        *self.fail_uploads.lock().unwrap() = Some(err);
    }

    pub fn fail_next_delete(&self, err: StoreError) {
        *self.fail_deletes.lock().unwrap() = Some(err);
    }

    /// Simulate a store that returns no deletion handle, making binary
    /// deletion impossible.
    pub fn withhold_handles(&self) {
        self.withhold_handles.store(true, Ordering::SeqCst);
    }

    pub fn upload_calls(&self) -> u64 {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.objects.lock().unwrap().contains_key(handle)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        kind: ResourceKind,
        folder: &str,
    ) -> Result<StoredObject, StoreError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_uploads.lock().unwrap().take() {
            return Err(err);
        }

        let n = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = format!("{}/obj-{}", folder, n);
        let url = format!("memory://{}/{}", kind.segment(), handle);

        self.objects
            .lock()
            .unwrap()
            .insert(handle.clone(), (kind, bytes));

        Ok(StoredObject {
            url,
            delete_handle: if self.withhold_handles.load(Ordering::SeqCst) {
                None
            } else {
                Some(handle)
            },
        })
    }

    async fn delete(&self, handle: &str, _kind: ResourceKind) -> Result<DeleteOutcome, StoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_deletes.lock().unwrap().take() {
            return Err(err);
        }

        Ok(match self.objects.lock().unwrap().remove(handle) {
            Some(_) => DeleteOutcome::Deleted,
            None => DeleteOutcome::NotFound,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_then_delete() {
        let store = MemoryObjectStore::new();
        let stored = store
            .upload(vec![1, 2, 3], ResourceKind::Image, "gallery")
            .await
            .unwrap();

        let handle = stored.delete_handle.unwrap();
        assert!(store.contains(&handle));
        assert_eq!(
            store.delete(&handle, ResourceKind::Image).await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            store.delete(&handle, ResourceKind::Image).await.unwrap(),
            DeleteOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_withheld_handle() {
        let store = MemoryObjectStore::new();
        store.withhold_handles();

        let stored = store
            .upload(vec![0u8; 4], ResourceKind::Raw, "journals")
            .await
            .unwrap();
        assert!(stored.delete_handle.is_none());
        assert!(stored.url.starts_with("memory://raw/"));
    }

    #[test]
    fn test_kind_segments() {
        assert_eq!(ResourceKind::Image.segment(), "image");
        assert_eq!(ResourceKind::Raw.segment(), "raw");
    }
}
