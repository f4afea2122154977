//! Time zone parsing and conversion helpers.
//!
//! What this module provides:
//! - [`parse_timestamp`]: Accept either RFC-3339 or a naive ISO-8601 wall time, the latter
//!   interpreted in a reference time zone. This is what CSV rows and upstream quotes carry.
//! - [`resolve_local`]: Map a naive local timestamp to UTC, settling DST gaps and
//!   ambiguities instead of failing.
//! - [`local_day`]: The calendar day an instant falls on in the reference zone; blob keys
//!   and the day loader use it.
//!
//! Notes:
//! - Ambiguous local times happen during “fall back” when a wall time occurs twice.
//!   The earlier instant is used.
//! - Nonexistent local times happen during “spring forward” when a wall time is skipped.
//!   They move forward to the first valid minute, so every sample maps to some bucket.
//!
//! Examples
//! - RFC-3339 with offset to UTC:
//!   "2025-06-10T14:30:00+03:30" -> "2025-06-10T11:00:00Z"
//! - Naive wall time in Asia/Tehran:
//!   "2025-06-10T14:30:00" -> "2025-06-10T11:00:00Z"

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Reference zone of the stored data.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Tehran;

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp as written by the upstream API or found in a CSV row.
///
/// RFC-3339 strings carry their own offset. Anything else is tried as a naive
/// ISO-8601 wall time in `tz`, resolved with [`resolve_local`].
pub fn parse_timestamp(s: &str, tz: Tz) -> anyhow::Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .with_context(|| format!("unrecognized timestamp: {s:?}"))?;
    resolve_local(naive, tz)
}

/// Convert a naive local timestamp to UTC in `tz`.
///
/// - A single match is returned as is.
/// - Ambiguous (fall-back) times resolve to the earlier instant.
/// - Nonexistent (spring-forward) times step forward minute by minute, at most 2 hours.
pub fn resolve_local(naive: NaiveDateTime, tz: Tz) -> anyhow::Result<DateTime<Utc>> {
    use chrono::offset::LocalResult::*;
    match tz.from_local_datetime(&naive) {
        Single(dt) | Ambiguous(dt, _) => Ok(dt.with_timezone(&Utc)),
        None => {
            let mut t = naive;
            for _ in 0..120 {
                t += chrono::Duration::minutes(1);
                if let Single(dt) = tz.from_local_datetime(&t) {
                    return Ok(dt.with_timezone(&Utc));
                }
            }
            Err(anyhow::anyhow!("nonexistent local time {naive} in {tz}"))
        }
    }
}

/// Calendar day of `ts` in `tz`.
pub fn local_day(ts: DateTime<Utc>, tz: Tz) -> NaiveDate {
    ts.with_timezone(&tz).date_naive()
}
