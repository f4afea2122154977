//! Gold price capture.
//!
//! Fetches the current gold quote on a schedule, appends it to a per-day CSV
//! blob kept in a version-checked store (a GitHub repository in production),
//! and loads those blobs back for the chart engine in `price_engine`.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod ingest;
pub mod loader;
pub mod models;
pub mod providers;
pub mod retry;
pub mod scheduler;
pub mod server_log;
pub mod storage;
