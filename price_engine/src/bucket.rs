//! Wall-clock bucket alignment.
//!
//! Buckets are aligned on the calendar fields of a reference time zone, not on
//! multiples of epoch seconds. With `Asia/Tehran` (+03:30) a 2-hour bucket
//! starts at 00:00, 02:00, ... local time; epoch arithmetic would put the
//! boundaries at xx:30.
//!
//! - Minute: floor the minute within its hour.
//! - Hour: floor the hour within its day.
//! - Day: floor the day within its month (1, 1 + n, 1 + 2n, ...).
//! - Week: Monday-based, counted from the Monday 1969-12-29.
//!
//! The floored wall time is mapped back to an instant with [`resolve_local`].
//! The result never lies after the input instant.

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

use crate::span::{SpanUnit, TimeSpan};
use crate::tz::resolve_local;

/// Start of the bucket of width `width` containing `ts`, in `tz` wall-clock terms.
pub fn floor_to_bucket(ts: DateTime<Utc>, width: TimeSpan, tz: Tz) -> DateTime<Utc> {
    let local = ts.with_timezone(&tz);
    let floored = floor_naive(local.naive_local(), width);
    match resolve_local(floored, tz) {
        Ok(start) if start <= ts => start,
        _ => {
            // keep the offset in force at `ts`
            let offset = local.offset().fix();
            offset
                .from_local_datetime(&floored)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .filter(|start| *start <= ts)
                .unwrap_or(ts)
        }
    }
}

/// `true` when `ts` is already a bucket start.
pub fn is_bucket_start(ts: DateTime<Utc>, width: TimeSpan, tz: Tz) -> bool {
    floor_to_bucket(ts, width, tz) == ts
}

/// Floor a naive wall time to the start of its bucket.
fn floor_naive(local: NaiveDateTime, width: TimeSpan) -> NaiveDateTime {
    let n = width.amount().get();
    let date = local.date();
    match width.unit() {
        SpanUnit::Minute => {
            let minute = local.minute() / n * n;
            at(date, local.hour(), minute).unwrap_or(local)
        }
        SpanUnit::Hour => at(date, local.hour() / n * n, 0).unwrap_or(local),
        SpanUnit::Day => {
            let day = (local.day() - 1) / n * n + 1;
            date.with_day(day)
                .and_then(|d| at(d, 0, 0))
                .unwrap_or(local)
        }
        SpanUnit::Week => {
            let width_days = 7 * i64::from(n);
            let since_anchor = (date - week_anchor()).num_days();
            let start = date - chrono::Duration::days(since_anchor.rem_euclid(width_days));
            at(start, 0, 0).unwrap_or(local)
        }
    }
}

// Monday 1969-12-29
fn week_anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(1969, 12, 29).unwrap_or_default()
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> Option<NaiveDateTime> {
    NaiveTime::from_hms_opt(hour, minute, 0).map(|t| date.and_time(t))
}
