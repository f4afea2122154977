//! Range filter: keep the samples inside a lookback window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::sample::{RawSeries, Sample};

/// The instant a lookback window is measured back from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    /// The newest sample in the series.
    #[default]
    LatestSample,
    /// A fixed instant, typically "now".
    At(#[serde(with = "chrono::serde::ts_milliseconds")] DateTime<Utc>),
}

/// Lower bound of the window, or `None` for an empty series anchored on its latest sample.
///
/// A lookback reaching past the representable range keeps everything.
pub fn cutoff(series: &RawSeries, lookback: Duration, anchor: Anchor) -> Option<DateTime<Utc>> {
    let end = match anchor {
        Anchor::LatestSample => series.latest()?.timestamp,
        Anchor::At(t) => t,
    };
    Some(end.checked_sub_signed(lookback).unwrap_or(DateTime::<Utc>::MIN_UTC))
}

/// Contiguous suffix of `series` with `timestamp >= anchor - lookback`.
pub fn filter_range(series: &RawSeries, lookback: Duration, anchor: Anchor) -> &[Sample] {
    let samples = series.samples();
    let Some(cut) = cutoff(series, lookback, anchor) else {
        return &[];
    };
    let start = samples.partition_point(|s| s.timestamp < cut);
    &samples[start..]
}
