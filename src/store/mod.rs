//! Remote file store boundary: named files with opaque version tokens and
//! compare-and-swap writes.

mod github;
mod memory;

pub use github::GithubStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

/// A file's decoded text content paired with the store's version token for
/// that revision. The token is required for the next conditional write and
/// is replaced by the store on every successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedFile {
    pub content: String,
    pub version: String,
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("version conflict on {path}: {message}")]
    VersionConflict { path: String, message: String },
    #[error("transport error: {0}")]
    Transport(String),
}

/// Minimal capability over the remote content store. `write` must be an
/// atomic compare-and-swap against `expected_version` on the store side,
/// never a read-then-write pair.
#[async_trait]
pub trait RemoteFileStore: Send + Sync {
    async fn read(&self, path: &str) -> Result<VersionedFile, StoreError>;

    async fn write(
        &self,
        path: &str,
        content: &str,
        expected_version: &str,
        message: &str,
    ) -> Result<(), StoreError>;
}
