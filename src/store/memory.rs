//! In-process store with real compare-and-swap semantics, used by the
//! scenario tests. Version tokens are the sha-256 of the content, so every
//! distinct revision gets a distinct opaque token like the real store.

use std::collections::HashMap;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use super::{RemoteFileStore, StoreError, VersionedFile};

#[derive(Default)]
pub struct MemoryStore {
    files: Mutex<HashMap<String, String>>,
    pub write_calls: std::sync::atomic::AtomicU64,
    /// When set, every read fails with a transport error; lets tests take
    /// the store offline between a write and the follow-up token read.
    pub fail_reads: std::sync::atomic::AtomicBool,
}

fn version_of(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, path: &str, content: &str) {
        self.files
            .lock()
            .await
            .insert(path.to_string(), content.to_string());
    }

    pub async fn content(&self, path: &str) -> Option<String> {
        self.files.lock().await.get(path).cloned()
    }
}

#[async_trait]
impl RemoteFileStore for MemoryStore {
    async fn read(&self, path: &str) -> Result<VersionedFile, StoreError> {
        if self.fail_reads.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(StoreError::Transport("store offline".to_string()));
        }
        let files = self.files.lock().await;
        let content = files
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        Ok(VersionedFile {
            content: content.clone(),
            version: version_of(content),
        })
    }

    async fn write(
        &self,
        path: &str,
        content: &str,
        expected_version: &str,
        _message: &str,
    ) -> Result<(), StoreError> {
        self.write_calls
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let mut files = self.files.lock().await;
        let current = files
            .get(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        if version_of(current) != expected_version {
            return Err(StoreError::VersionConflict {
                path: path.to_string(),
                message: "expected version does not match current content".to_string(),
            });
        }
        files.insert(path.to_string(), content.to_string());
        Ok(())
    }
}
