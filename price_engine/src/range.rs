//! Display ranges: token → lookback, bucket width and days of data to load.
//!
//! The built-in table mirrors the chart's range buttons. It can be extended
//! or overridden from TOML:
//!
//! ```toml
//! [ranges.6h]
//! lookback = "6h"
//! bucket = "1m"
//! days_to_load = 1
//! ```
//!
//! Tokens are normalized (trimmed, lowercase). Unknown tokens resolve to the
//! default range instead of failing.

use anyhow::{Context, bail};
use chrono::Duration;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::span::{SpanUnit, TimeSpan, nz};

/// Token used when a requested range is unknown.
pub const DEFAULT_RANGE: &str = "1d";

/// Longest accepted lookback, in days.
pub const MAX_LOOKBACK_DAYS: i64 = 3_660;

/// Most daily blobs a single range may ask for.
pub const MAX_DAYS_TO_LOAD: u32 = 3_660;

/// One display range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeSpec {
    /// How far back from the anchor samples are kept.
    pub lookback: TimeSpan,
    /// Bucket width; `None` plots every sample.
    #[serde(default)]
    pub bucket: Option<TimeSpan>,
    /// Number of daily blobs to read, counting the anchor day.
    pub days_to_load: u32,
}

const fn spec(
    lookback: (u32, SpanUnit),
    bucket: Option<(u32, SpanUnit)>,
    days_to_load: u32,
) -> RangeSpec {
    RangeSpec {
        lookback: TimeSpan::new(nz(lookback.0), lookback.1),
        bucket: match bucket {
            Some((n, unit)) => Some(TimeSpan::new(nz(n), unit)),
            None => None,
        },
        days_to_load,
    }
}

const BUILTIN: [(&str, RangeSpec); 5] = [
    ("1h", spec((1, SpanUnit::Hour), None, 2)),
    ("1d", spec((24, SpanUnit::Hour), Some((5, SpanUnit::Minute)), 2)),
    ("1w", spec((7, SpanUnit::Day), Some((2, SpanUnit::Hour)), 8)),
    ("1m", spec((30, SpanUnit::Day), Some((12, SpanUnit::Hour)), 31)),
    ("1y", spec((365, SpanUnit::Day), Some((1, SpanUnit::Day)), 366)),
];

const FALLBACK: RangeSpec = BUILTIN[1].1;

/// A range looked up in a [`RangeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange<'a> {
    /// Token actually used.
    pub token: &'a str,
    /// Its parameters.
    pub spec: &'a RangeSpec,
    /// `true` when the requested token was unknown.
    pub fell_back: bool,
}

/// Ordered token → [`RangeSpec`] table with a default entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeTable {
    default: String,
    ranges: IndexMap<String, RangeSpec>,
}

impl Default for RangeTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn normalize(token: &str) -> String {
    token.trim().to_lowercase()
}

impl RangeTable {
    /// `1h`, `1d`, `1w`, `1m`, `1y`; default `1d`.
    pub fn builtin() -> Self {
        Self {
            default: DEFAULT_RANGE.to_string(),
            ranges: BUILTIN
                .iter()
                .map(|(token, spec)| (token.to_string(), *spec))
                .collect(),
        }
    }

    /// Look up `token`, falling back to the default range.
    pub fn resolve(&self, token: &str) -> ResolvedRange<'_> {
        if let Some((token, spec)) = self.ranges.get_key_value(normalize(token).as_str()) {
            return ResolvedRange {
                token: token.as_str(),
                spec,
                fell_back: false,
            };
        }
        let (token, spec) = self
            .ranges
            .get_key_value(self.default.as_str())
            .map(|(t, s)| (t.as_str(), s))
            .unwrap_or((DEFAULT_RANGE, &FALLBACK));
        ResolvedRange {
            token,
            spec,
            fell_back: true,
        }
    }

    /// Exact lookup without fallback.
    pub fn get(&self, token: &str) -> Option<&RangeSpec> {
        self.ranges.get(normalize(token).as_str())
    }

    /// Add or replace a range. Returns the previous spec for the token.
    pub fn insert(&mut self, token: &str, spec: RangeSpec) -> anyhow::Result<Option<RangeSpec>> {
        let token = normalize(token);
        if token.is_empty() {
            bail!("range token must not be empty");
        }
        if spec.days_to_load == 0 || spec.days_to_load > MAX_DAYS_TO_LOAD {
            bail!("range {token}: days_to_load must be between 1 and {MAX_DAYS_TO_LOAD}");
        }
        if spec.lookback.duration() > Duration::days(MAX_LOOKBACK_DAYS) {
            bail!("range {token}: lookback {} exceeds {MAX_LOOKBACK_DAYS} days", spec.lookback);
        }
        if let Some(bucket) = spec.bucket {
            check_bucket(bucket).with_context(|| format!("range {token}"))?;
        }
        Ok(self.ranges.insert(token, spec))
    }

    /// Apply overrides in order.
    pub fn merge(&mut self, overrides: &IndexMap<String, RangeSpec>) -> anyhow::Result<()> {
        for (token, spec) in overrides {
            self.insert(token, *spec)
                .with_context(|| format!("invalid range override {token:?}"))?;
        }
        Ok(())
    }

    /// Change the default token; it must already be in the table.
    pub fn set_default(&mut self, token: &str) -> anyhow::Result<()> {
        let token = normalize(token);
        if !self.ranges.contains_key(token.as_str()) {
            bail!("default range {token:?} is not defined");
        }
        self.default = token;
        Ok(())
    }

    /// Default token.
    pub fn default_token(&self) -> &str {
        &self.default
    }

    /// Tokens in table order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.ranges.keys().map(String::as_str)
    }
}

/// Buckets are floored within their parent calendar unit, so a width must
/// tile that unit exactly or the last bucket of each hour/day comes out short.
fn check_bucket(bucket: TimeSpan) -> anyhow::Result<()> {
    let n = bucket.amount().get();
    match bucket.unit() {
        SpanUnit::Minute if 60 % n != 0 => bail!("bucket {bucket}: minutes must divide 60"),
        SpanUnit::Hour if 24 % n != 0 => bail!("bucket {bucket}: hours must divide 24"),
        SpanUnit::Day if n > 31 => bail!("bucket {bucket}: at most 31 days"),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn builtin_table() {
        let table = RangeTable::builtin();
        assert_eq!(table.tokens().collect::<Vec<_>>(), ["1h", "1d", "1w", "1m", "1y"]);
        let d = table.get("1d").unwrap();
        assert_eq!(d.lookback.duration(), Duration::hours(24));
        assert_eq!(d.bucket.unwrap().to_string(), "5m");
        assert_eq!(d.days_to_load, 2);
        assert_eq!(table.get("1h").unwrap().bucket, None);
        assert_eq!(table.get("1m").unwrap().days_to_load, 31);
        // every builtin entry passes the same checks as an override
        let mut again = RangeTable::builtin();
        for (token, spec) in BUILTIN {
            again.insert(token, spec).unwrap();
        }
    }

    #[test]
    fn unknown_token_falls_back_to_default() {
        let table = RangeTable::builtin();
        let r = table.resolve("3x");
        assert_eq!(r.token, "1d");
        assert!(r.fell_back);
        let r = table.resolve(" 1W ");
        assert_eq!(r.token, "1w");
        assert!(!r.fell_back);
    }

    #[test]
    fn overrides_from_toml() {
        let overrides: IndexMap<String, RangeSpec> = toml::from_str(
            r#"
            [6h]
            lookback = "6h"
            bucket = "1m"
            days_to_load = 1

            [1d]
            lookback = "24h"
            bucket = "10m"
            days_to_load = 2
            "#,
        )
        .unwrap();
        let mut table = RangeTable::builtin();
        table.merge(&overrides).unwrap();
        assert_eq!(table.get("6h").unwrap().bucket.unwrap().to_string(), "1m");
        assert_eq!(table.get("1d").unwrap().bucket.unwrap().to_string(), "10m");
        assert_eq!(table.tokens().last(), Some("6h"));
    }

    #[test]
    fn rejects_bad_entries() {
        let mut table = RangeTable::builtin();
        let day = *table.get("1d").unwrap();
        let bad = RangeSpec {
            days_to_load: 0,
            ..day
        };
        assert!(table.insert("2d", bad).is_err());
        assert!(table.set_default("nope").is_err());
        table.set_default("1W").unwrap();
        assert_eq!(table.resolve("zzz").token, "1w");
        assert!(
            toml::from_str::<RangeSpec>("lookback = \"1h\"\ndays_to_load = 1\nextra = 2").is_err()
        );
    }

    #[test]
    fn bucket_must_tile_its_calendar_unit() {
        let mut table = RangeTable::builtin();
        let with_bucket = |bucket: &str| RangeSpec {
            lookback: "1D".parse().unwrap(),
            bucket: Some(bucket.parse().unwrap()),
            days_to_load: 2,
        };
        for bad in ["90m", "7m", "48h", "5h", "40D"] {
            let err = table.insert("x", with_bucket(bad)).unwrap_err();
            assert!(format!("{err:#}").contains(bad), "{bad}: {err:#}");
        }
        for good in ["1m", "15m", "30m", "60m", "3h", "8h", "24h", "3D", "31D", "2W"] {
            table.insert("x", with_bucket(good)).unwrap();
        }
    }

    #[test]
    fn lookback_and_days_are_bounded() {
        let mut table = RangeTable::builtin();
        let huge_lookback = RangeSpec {
            lookback: "4000000000D".parse().unwrap(),
            bucket: None,
            days_to_load: 1,
        };
        assert!(table.insert("ever", huge_lookback).is_err());
        let huge_load = RangeSpec {
            lookback: "1D".parse().unwrap(),
            bucket: None,
            days_to_load: 4_000_000_000,
        };
        assert!(table.insert("ever", huge_load).is_err());
        let ten_years = RangeSpec {
            lookback: "3660D".parse().unwrap(),
            bucket: Some("1W".parse().unwrap()),
            days_to_load: MAX_DAYS_TO_LOAD,
        };
        table.insert("10y", ten_years).unwrap();
    }
}
