//! The seam between the upload dispatcher and the remote object store.
//!
//! The dispatcher only ever calls [`ObjectStore::upload_file`]; the real
//! client ([`crate::b2::B2Client`]) implements it against the B2 native
//! API, and tests substitute a `mockall` mock or a hand-rolled double.
//!
//! The trait is annotated for `mockall` so consumers can generate
//! deterministic mocks in unit and integration tests.

use std::path::Path;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use thiserror::Error;

/// Errors from the object store and its configuration.
///
/// `Auth` and `BucketNotFound` are configuration-level and abort the run;
/// `Upload` is per-file and only ever degrades that one file to a logged
/// failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("authorization failed: {0}")]
    Auth(String),
    #[error("bucket '{0}' not found or not accessible with these credentials")]
    BucketNotFound(String),
    #[error("invalid bucket locator '{0}': expected scheme://bucket-name")]
    InvalidLocator(String),
    #[error("upload of '{key}' failed: {reason}")]
    Upload { key: String, reason: String },
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
}

/// An authenticated, bucket-resolved store that can receive file uploads.
///
/// Implementations must be safe to share across concurrent upload tasks
/// (`&self` methods, `Send + Sync`).
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload one local file under the given remote key, overwriting any
    /// existing object with that key.
    async fn upload_file(&self, local: &Path, remote_key: &str) -> Result<(), StorageError>;
}
