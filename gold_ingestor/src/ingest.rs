//! The capture job: fetch one quote, append it to its day blob.
//!
//! The blob update is a read-modify-write guarded by the blob version. When
//! another writer got there first the put fails with a conflict; the job then
//! re-reads and retries under [`RetryConfig`], and reports
//! [`IngestError::Conflict`] once the retries are used up.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use price_engine::{
    csv_codec::{CsvLayout, CsvRow, append_row},
    jalali::{SolarDate, gregorian_to_solar},
    tz::{local_day, parse_timestamp},
};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::config::IngestorConfig;
use crate::errors::IngestError;
use crate::models::quote::PriceQuote;
use crate::providers::QuoteProvider;
use crate::retry::RetryConfig;
use crate::server_log::ServerLog;
use crate::storage::{BlobStore, StoreError, Version};

/// Blob key of a day: `YYYY-MM-DD.csv`.
pub fn day_key(day: NaiveDate) -> String {
    format!("{}.csv", day.format("%Y-%m-%d"))
}

/// Commit message for one stored sample.
pub fn commit_message(solar: SolarDate, price: f64) -> String {
    format!("📆 {solar} 🪙{price}")
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    /// Day blob written.
    pub key: String,
    /// Stored price.
    pub price: f64,
    /// Parsed quote time.
    pub observed_at: DateTime<Utc>,
    /// Version of the blob after the write.
    pub version: Version,
    /// Writes attempted, including the first.
    pub attempts: u32,
    /// `true` when this run created the day blob.
    pub created: bool,
}

/// Fetch-and-append job. Cheap to share behind an `Arc`.
pub struct IngestJob {
    provider: Arc<dyn QuoteProvider>,
    store: Arc<dyn BlobStore>,
    log: ServerLog,
    timezone: Tz,
    retry: RetryConfig,
    layout: CsvLayout,
}

impl IngestJob {
    /// Job with default retry policy, layout and log key.
    pub fn new(provider: Arc<dyn QuoteProvider>, store: Arc<dyn BlobStore>, timezone: Tz) -> Self {
        Self {
            log: ServerLog::new(store.clone(), "server.log", timezone),
            provider,
            store,
            timezone,
            retry: RetryConfig::default(),
            layout: CsvLayout::default(),
        }
    }

    /// Job configured from `[storage]`, `[retry]` and `timezone`.
    pub fn from_config(
        cfg: &IngestorConfig,
        provider: Arc<dyn QuoteProvider>,
        store: Arc<dyn BlobStore>,
    ) -> Self {
        Self::new(provider, store, cfg.timezone)
            .with_retry(cfg.retry.clone())
            .with_layout(cfg.storage.layout)
            .with_log_key(&cfg.storage.log_key)
    }

    /// Replace the conflict retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Header layout for newly created day blobs.
    pub fn with_layout(mut self, layout: CsvLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Key of the error log blob.
    pub fn with_log_key(mut self, key: &str) -> Self {
        self.log = ServerLog::new(self.store.clone(), key, self.timezone);
        self
    }

    /// One full run. Failures are also appended to the server log.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> Result<IngestReport, IngestError> {
        let result = match self.provider.fetch_quote().await {
            Ok(quote) => self.store_quote(&quote).await,
            Err(err) => Err(err.into()),
        };
        match &result {
            Ok(report) => info!(
                key = %report.key,
                price = report.price,
                attempts = report.attempts,
                "stored quote"
            ),
            Err(err) => {
                error!(%err, "ingestion failed");
                self.log.append(Utc::now(), &err.to_string()).await;
            }
        }
        result
    }

    /// Append an already fetched quote to its day blob.
    pub async fn store_quote(&self, quote: &PriceQuote) -> Result<IngestReport, IngestError> {
        let observed_at = parse_timestamp(&quote.date, self.timezone)
            .map_err(|_| IngestError::BadTimestamp(quote.date.clone()))?;
        let day = local_day(observed_at, self.timezone);
        let key = day_key(day);
        let solar_date = gregorian_to_solar(day);
        let row = CsvRow {
            price: quote.price18,
            date: &quote.date,
            solar_date,
        };
        let message = commit_message(solar_date, quote.price18);

        let mut attempt = 0;
        loop {
            let current = self.store.get(&key).await?;
            let created = current.is_none();
            let (content, version) = match current {
                Some(blob) => (Some(blob.content), Some(blob.version)),
                None => (None, None),
            };
            let updated = append_row(content.as_deref(), &row, self.layout);

            match self.store.put(&key, &updated, version.as_ref(), &message).await {
                Ok(version) => {
                    return Ok(IngestReport {
                        key,
                        price: quote.price18,
                        observed_at,
                        version,
                        attempts: attempt + 1,
                        created,
                    });
                }
                Err(StoreError::Conflict { .. }) if attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(%key, attempt, ?delay, "blob changed underneath us, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(StoreError::Conflict { .. }) => {
                    return Err(IngestError::Conflict {
                        key,
                        attempts: attempt + 1,
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_and_messages() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        assert_eq!(day_key(day), "2025-06-10.csv");
        assert_eq!(
            commit_message(gregorian_to_solar(day), 66_120_000.0),
            "📆 1404/03/20 🪙66120000"
        );
    }
}
