//! Time-bucket resampler.
//!
//! Each sample is assigned to the wall-clock bucket containing it. Per bucket
//! the sample nearest the bucket start is kept; on a tie the one seen first
//! wins. The emitted point carries the bucket start and the kept price, so the
//! output is strictly increasing in time with one point per occupied bucket.

use std::collections::{BTreeMap, btree_map::Entry};

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::bucket::floor_to_bucket;
use crate::sample::{PlotPoint, Sample};
use crate::span::TimeSpan;

/// Down-sample `samples` to at most one point per bucket.
///
/// With `bucket == None` every sample passes through unchanged.
pub fn resample(samples: &[Sample], bucket: Option<TimeSpan>, tz: Tz) -> Vec<PlotPoint> {
    let Some(width) = bucket else {
        return samples.iter().map(PlotPoint::from).collect();
    };

    let mut buckets: BTreeMap<DateTime<Utc>, (Duration, f64)> = BTreeMap::new();
    for s in samples {
        let start = floor_to_bucket(s.timestamp, width, tz);
        let distance = (s.timestamp - start).abs();
        match buckets.entry(start) {
            Entry::Vacant(slot) => {
                slot.insert((distance, s.price));
            }
            Entry::Occupied(mut slot) => {
                if distance < slot.get().0 {
                    slot.insert((distance, s.price));
                }
            }
        }
    }

    buckets
        .into_iter()
        .map(|(timestamp, (_, price))| PlotPoint { timestamp, price })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bucket::is_bucket_start;
    use crate::tz::DEFAULT_TIMEZONE;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn tehran(h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        DEFAULT_TIMEZONE
            .with_ymd_and_hms(2025, 6, 10, h, mi, s)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn five_minutes() -> Option<TimeSpan> {
        Some("5m".parse().unwrap())
    }

    #[test]
    fn empty_in_empty_out() {
        assert!(resample(&[], five_minutes(), DEFAULT_TIMEZONE).is_empty());
    }

    #[test]
    fn keeps_sample_nearest_bucket_start() {
        let samples = [
            Sample::new(tehran(10, 1, 30), 1.0),
            Sample::new(tehran(10, 0, 20), 2.0),
            Sample::new(tehran(10, 4, 59), 3.0),
            Sample::new(tehran(10, 6, 0), 4.0),
        ];
        let out = resample(&samples, five_minutes(), DEFAULT_TIMEZONE);
        assert_eq!(
            out,
            vec![
                PlotPoint {
                    timestamp: tehran(10, 0, 0),
                    price: 2.0,
                },
                PlotPoint {
                    timestamp: tehran(10, 5, 0),
                    price: 4.0,
                },
            ]
        );
    }

    #[test]
    fn tie_goes_to_first_seen() {
        let t = tehran(10, 2, 0);
        let samples = [Sample::new(t, 7.0), Sample::new(t, 9.0)];
        let out = resample(&samples, five_minutes(), DEFAULT_TIMEZONE);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].price, 7.0);
    }

    #[test]
    fn passthrough_without_bucket() {
        let samples = [Sample::new(tehran(10, 0, 1), 1.0), Sample::new(tehran(10, 0, 1), 2.0)];
        let out = resample(&samples, None, DEFAULT_TIMEZONE);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].price, 2.0);
    }

    fn arb_samples() -> impl Strategy<Value = Vec<Sample>> {
        // a few hours of irregular ticks with distinct prices
        proptest::collection::vec(0i64..6 * 3_600, 0..80).prop_map(|mut secs| {
            secs.sort();
            secs.dedup();
            let base = tehran(8, 0, 0);
            secs.into_iter()
                .enumerate()
                .map(|(i, s)| Sample::new(base + Duration::seconds(s), 1_000.0 + i as f64))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn output_strictly_increasing_and_deterministic(samples in arb_samples()) {
            let a = resample(&samples, five_minutes(), DEFAULT_TIMEZONE);
            let b = resample(&samples, five_minutes(), DEFAULT_TIMEZONE);
            prop_assert_eq!(&a, &b);
            prop_assert!(a.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
            prop_assert!(a.len() <= samples.len());
        }

        #[test]
        fn choice_ignores_input_order(samples in arb_samples()) {
            let mut reversed = samples.clone();
            reversed.reverse();
            prop_assert_eq!(
                resample(&samples, five_minutes(), DEFAULT_TIMEZONE),
                resample(&reversed, five_minutes(), DEFAULT_TIMEZONE)
            );
        }

        #[test]
        fn resampling_twice_changes_nothing(samples in arb_samples()) {
            let once = resample(&samples, five_minutes(), DEFAULT_TIMEZONE);
            let width = five_minutes().unwrap();
            prop_assert!(
                once.iter()
                    .all(|p| is_bucket_start(p.timestamp, width, DEFAULT_TIMEZONE))
            );
            let again: Vec<Sample> =
                once.iter().map(|p| Sample::new(p.timestamp, p.price)).collect();
            prop_assert_eq!(resample(&again, five_minutes(), DEFAULT_TIMEZONE), once);
        }
    }
}
