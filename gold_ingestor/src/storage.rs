//! Version-checked blob storage.
//!
//! Every blob carries an opaque [`Version`]. A write names the version it was
//! based on and fails with [`StoreError::Conflict`] when the stored blob has
//! moved on, so concurrent writers never overwrite each other blindly.

pub mod github;
pub mod memory;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use snafu::{Backtrace, Snafu};

use crate::config::{StorageBackend, StorageConfig};
use crate::providers::ClientInitError;

/// Opaque version token (the git blob sha for the GitHub store).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version(pub String);

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored blob with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// UTF-8 content.
    pub content: String,
    /// Version to pass back on the next write.
    pub version: Version,
}

/// Errors from a [`BlobStore`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    /// The blob changed (or appeared) since it was read.
    #[snafu(display("Version conflict writing {key}"))]
    Conflict { key: String, backtrace: Backtrace },

    /// Network failure or timeout.
    #[snafu(display("Storage request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// Non-success status other than a conflict.
    #[snafu(display("Storage API error on {key} ({status}): {message}"))]
    Api {
        key: String,
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// Stored bytes could not be decoded.
    #[snafu(display("Blob {key} could not be decoded: {message}"))]
    Decode {
        key: String,
        message: String,
        backtrace: Backtrace,
    },
}

impl StoreError {
    /// `true` for [`StoreError::Conflict`].
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Key/value store with optimistic concurrency.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Current content and version, or `None` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Blob>, StoreError>;

    /// Write `content` if the stored version still equals `expected`
    /// (`None` = the key must not exist yet). `message` describes the change.
    async fn put(
        &self,
        key: &str,
        content: &str,
        expected: Option<&Version>,
        message: &str,
    ) -> Result<Version, StoreError>;
}

/// Build the store selected in config.
pub fn build_store(cfg: &StorageConfig) -> Result<Arc<dyn BlobStore>, ClientInitError> {
    Ok(match cfg.backend {
        StorageBackend::Github => Arc::new(github::GithubStore::from_env(cfg)?),
        StorageBackend::Memory => Arc::new(memory::MemoryStore::new()),
    })
}
