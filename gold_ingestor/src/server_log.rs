//! Error log kept next to the data, as a blob in the same store.
//!
//! Each failure becomes one line `[YYYY-MM-DD HH:MM:SS] message`, stamped in
//! the reference zone. Writing the log is best effort: a failed log write is
//! traced and otherwise ignored.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::storage::BlobStore;

/// Format one log line (with trailing newline).
pub fn format_line(at: DateTime<Utc>, tz: Tz, message: &str) -> String {
    let stamp = at.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S");
    // one entry per line
    let message = message.replace(['\r', '\n'], " ");
    format!("[{stamp}] {message}\n")
}

/// Appends lines to the log blob.
#[derive(Clone)]
pub struct ServerLog {
    store: Arc<dyn BlobStore>,
    key: String,
    timezone: Tz,
}

impl ServerLog {
    /// Log stored under `key` in `store`.
    pub fn new(store: Arc<dyn BlobStore>, key: impl Into<String>, timezone: Tz) -> Self {
        Self {
            store,
            key: key.into(),
            timezone,
        }
    }

    /// Key of the log blob.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Append `message` stamped with `at`. Returns whether the line was stored.
    pub async fn append(&self, at: DateTime<Utc>, message: &str) -> bool {
        let line = format_line(at, self.timezone, message);
        let existing = match self.store.get(&self.key).await {
            Ok(blob) => blob,
            Err(err) => {
                warn!(%err, key = %self.key, "could not read server log");
                return false;
            }
        };
        let (mut content, version) = match existing {
            Some(blob) => (blob.content, Some(blob.version)),
            None => (String::new(), None),
        };
        content.push_str(&line);

        match self
            .store
            .put(&self.key, &content, version.as_ref(), "server log")
            .await
        {
            Ok(_) => true,
            Err(err) => {
                warn!(%err, key = %self.key, "could not write server log");
                false
            }
        }
    }
}
