//! Loading day blobs back into a series for the chart engine.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use chrono_tz::Tz;
use futures::future::join_all;
use price_engine::{RawSeries, csv_codec::parse_day, range::RangeTable};
use serde::Serialize;
use tracing::{debug, warn};

use crate::ingest::day_key;
use crate::storage::BlobStore;

/// What happened to each requested day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Keys read and parsed.
    pub loaded: Vec<String>,
    /// Keys with no blob.
    pub missing: Vec<String>,
    /// Keys that could not be read or parsed, with the reason.
    pub failed: Vec<(String, String)>,
    /// Malformed rows skipped across all loaded blobs.
    pub skipped_rows: usize,
}

/// Reads consecutive day blobs from a store.
#[derive(Clone)]
pub struct DayLoader {
    store: Arc<dyn BlobStore>,
    timezone: Tz,
}

/// Keys for `days` days ending at `anchor_day`, newest first. Stops early at
/// the start of the representable calendar.
pub fn keys_for(anchor_day: NaiveDate, days: u32) -> Vec<String> {
    (0..u64::from(days))
        .map_while(|back| anchor_day.checked_sub_days(Days::new(back)))
        .map(day_key)
        .collect()
}

impl DayLoader {
    /// Loader over `store`; naive CSV timestamps are read in `timezone`.
    pub fn new(store: Arc<dyn BlobStore>, timezone: Tz) -> Self {
        Self { store, timezone }
    }

    /// Load `days` blobs ending at `anchor_day`. Never fails: unusable days
    /// contribute zero samples and are listed in the report.
    pub async fn load_days(&self, anchor_day: NaiveDate, days: u32) -> (RawSeries, LoadReport) {
        let keys = keys_for(anchor_day, days);
        let reads = join_all(keys.iter().map(|key| self.store.get(key))).await;

        let mut series = RawSeries::new();
        let mut report = LoadReport::default();
        for (key, read) in keys.into_iter().zip(reads) {
            match read {
                Ok(None) => {
                    debug!(%key, "no blob for day");
                    report.missing.push(key);
                }
                Ok(Some(blob)) => match parse_day(&blob.content, self.timezone) {
                    Ok(day) => {
                        report.skipped_rows += day.skipped_rows;
                        series.extend(day.samples);
                        report.loaded.push(key);
                    }
                    Err(err) => {
                        warn!(%key, %err, "unparseable day blob");
                        report.failed.push((key, err.to_string()));
                    }
                },
                Err(err) => {
                    warn!(%key, %err, "could not read day blob");
                    report.failed.push((key, err.to_string()));
                }
            }
        }
        (series, report)
    }

    /// Load as many days as range `token` asks for (default range if unknown).
    pub async fn load_range(
        &self,
        ranges: &RangeTable,
        token: &str,
        anchor_day: NaiveDate,
    ) -> (RawSeries, LoadReport) {
        let days = ranges.resolve(token).spec.days_to_load;
        self.load_days(anchor_day, days).await
    }
}
