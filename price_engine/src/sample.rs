//! Price samples and the ordered series the engine consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed price at one instant.
///
/// On the wire the timestamp is epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Observation instant.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Price in the upstream unit (rial per gram for the default source).
    pub price: f64,
}

impl Sample {
    /// Create a sample.
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// A point handed to the renderer: the bucket-start timestamp and the price
/// of the sample retained for that bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    /// Bucket start (or the raw timestamp when the range has no bucket).
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Retained price.
    pub price: f64,
}

impl From<&Sample> for PlotPoint {
    fn from(s: &Sample) -> Self {
        Self {
            timestamp: s.timestamp,
            price: s.price,
        }
    }
}

/// Samples ordered non-decreasing by timestamp.
///
/// Construction sorts stably, so samples sharing a timestamp keep their input
/// order. Duplicates are kept; de-duplication is the resampler's job.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    samples: Vec<Sample>,
}

impl RawSeries {
    /// Empty series.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from samples in any order.
    pub fn from_unsorted(mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        Self { samples }
    }

    /// Merge more samples in, keeping the ordering invariant.
    pub fn extend<I: IntoIterator<Item = Sample>>(&mut self, more: I) {
        self.samples.extend(more);
        self.samples.sort_by_key(|s| s.timestamp);
    }

    /// All samples, oldest first.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// `true` when there is nothing to plot.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The newest sample.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

impl FromIterator<Sample> for RawSeries {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self::from_unsorted(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64, price: f64) -> Sample {
        Sample::new(Utc.timestamp_opt(secs, 0).unwrap(), price)
    }

    #[test]
    fn sort_is_stable_for_equal_timestamps() {
        let series =
            RawSeries::from_unsorted(vec![at(20, 1.0), at(10, 2.0), at(20, 3.0), at(10, 4.0)]);
        let prices: Vec<f64> = series.samples().iter().map(|s| s.price).collect();
        assert_eq!(prices, vec![2.0, 4.0, 1.0, 3.0]);
        assert_eq!(series.latest().unwrap().price, 3.0);
    }

    #[test]
    fn extend_keeps_order() {
        let mut series: RawSeries = [at(30, 1.0)].into_iter().collect();
        series.extend([at(5, 2.0), at(40, 3.0)]);
        let secs: Vec<i64> = series.samples().iter().map(|s| s.timestamp.timestamp()).collect();
        assert_eq!(secs, vec![5, 30, 40]);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn wire_format_uses_epoch_millis() {
        let s = Sample::new(Utc.timestamp_millis_opt(1_749_553_200_123).unwrap(), 66_000.0);
        let json = serde_json::to_value(s).unwrap();
        assert_eq!(json, serde_json::json!({"timestamp": 1_749_553_200_123_i64, "price": 66000.0}));
    }
}
