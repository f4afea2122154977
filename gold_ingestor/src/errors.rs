use thiserror::Error;

use crate::providers::ProviderError;
use crate::storage::StoreError;

/// Why an ingestion run did not store a sample.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The upstream quote could not be fetched or was unusable.
    #[error("Quote fetch failed: {0}")]
    Fetch(#[from] ProviderError),

    /// The quote's timestamp could not be parsed.
    #[error("Quote has an unparseable date: {0:?}")]
    BadTimestamp(String),

    /// Reading or writing the day blob failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Every attempt lost the race against another writer.
    #[error("Write conflict on {key} persisted after {attempts} attempts")]
    Conflict {
        /// Day blob key.
        key: String,
        /// Writes attempted, including the first.
        attempts: u32,
    },
}
