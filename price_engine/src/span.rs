//! Amount × unit spans used for range lookbacks and bucket widths.
//!
//! A [`TimeSpan`] is spelled the way the CLI and the config file spell it:
//! `"5m"`, `"2h"`, `"30D"`, `"1W"`. Lowercase `d`/`w` are accepted on input;
//! `m` is always minutes.
//!
//! ```
//! use price_engine::span::{SpanUnit, TimeSpan};
//!
//! let s: TimeSpan = "5m".parse().unwrap();
//! assert_eq!(s.amount().get(), 5);
//! assert_eq!(s.unit(), SpanUnit::Minute);
//! assert_eq!(s.to_string(), "5m");
//! ```

use std::{fmt, num::NonZeroU32, str::FromStr};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a span string is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpanParseError {
    /// Nothing to parse.
    #[error("empty span")]
    Empty,
    /// The numeric part is missing, zero or not a number.
    #[error("span amount must be a positive integer: {0:?}")]
    Amount(String),
    /// The trailing unit letter is not one of `m`, `h`, `D`, `W`.
    #[error("unknown span unit in {0:?} (expected m, h, D or W)")]
    Unit(String),
}

/// Granularity of a [`TimeSpan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpanUnit {
    /// Wall-clock minute
    Minute,
    /// Wall-clock hour
    Hour,
    /// Calendar day
    Day,
    /// Monday-based week
    Week,
}

/// A span = amount × unit (e.g. 5 minutes, 2 hours, 30 days).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSpan {
    amount: NonZeroU32,
    unit: SpanUnit,
}

pub(crate) const fn nz(n: u32) -> NonZeroU32 {
    match NonZeroU32::new(n) {
        Some(nz) => nz,
        None => unreachable!(),
    }
}

impl TimeSpan {
    /// Create a new span.
    pub const fn new(amount: NonZeroU32, unit: SpanUnit) -> Self {
        Self { amount, unit }
    }

    /// Number of units.
    pub const fn amount(&self) -> NonZeroU32 {
        self.amount
    }

    /// Unit of the span.
    pub const fn unit(&self) -> SpanUnit {
        self.unit
    }

    /// Elapsed-time length of the span.
    ///
    /// Days and weeks count as 24 h and 7 × 24 h; only bucket alignment is
    /// calendar-aware.
    pub fn duration(&self) -> Duration {
        let n = i64::from(self.amount.get());
        match self.unit {
            SpanUnit::Minute => Duration::minutes(n),
            SpanUnit::Hour => Duration::hours(n),
            SpanUnit::Day => Duration::days(n),
            SpanUnit::Week => Duration::weeks(n),
        }
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let u = match self.unit {
            SpanUnit::Minute => "m",
            SpanUnit::Hour => "h",
            SpanUnit::Day => "D",
            SpanUnit::Week => "W",
        };
        write!(f, "{}{u}", self.amount)
    }
}

impl FromStr for TimeSpan {
    type Err = SpanParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some(last) = s.chars().last() else {
            return Err(SpanParseError::Empty);
        };
        let (digits, unit) = s.split_at(s.len() - last.len_utf8());
        let unit = match unit {
            "m" => SpanUnit::Minute,
            "h" | "H" => SpanUnit::Hour,
            "D" | "d" => SpanUnit::Day,
            "W" | "w" => SpanUnit::Week,
            _ => return Err(SpanParseError::Unit(s.to_string())),
        };
        let amount = digits
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| SpanParseError::Amount(s.to_string()))?;
        Ok(Self::new(amount, unit))
    }
}

impl TryFrom<String> for TimeSpan {
    type Error = SpanParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSpan> for String {
    fn from(span: TimeSpan) -> Self {
        span.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_spellings() {
        assert_eq!("5m".parse::<TimeSpan>().unwrap(), TimeSpan::new(nz(5), SpanUnit::Minute));
        assert_eq!("2h".parse::<TimeSpan>().unwrap(), TimeSpan::new(nz(2), SpanUnit::Hour));
        assert_eq!("30D".parse::<TimeSpan>().unwrap(), TimeSpan::new(nz(30), SpanUnit::Day));
        assert_eq!("7d".parse::<TimeSpan>().unwrap(), TimeSpan::new(nz(7), SpanUnit::Day));
        assert_eq!(" 1W ".parse::<TimeSpan>().unwrap(), TimeSpan::new(nz(1), SpanUnit::Week));
    }

    #[test]
    fn rejects_bad_spans() {
        assert_eq!("".parse::<TimeSpan>(), Err(SpanParseError::Empty));
        assert!(matches!("0m".parse::<TimeSpan>(), Err(SpanParseError::Amount(_))));
        assert!(matches!("m".parse::<TimeSpan>(), Err(SpanParseError::Amount(_))));
        assert!(matches!("5M".parse::<TimeSpan>(), Err(SpanParseError::Unit(_))));
        assert!(matches!("5ش".parse::<TimeSpan>(), Err(SpanParseError::Unit(_))));
    }

    #[test]
    fn display_is_canonical() {
        for s in ["5m", "2h", "12h", "1D", "365D", "1W"] {
            assert_eq!(s.parse::<TimeSpan>().unwrap().to_string(), s);
        }
        assert_eq!("7d".parse::<TimeSpan>().unwrap().to_string(), "7D");
    }

    #[test]
    fn durations() {
        assert_eq!("24h".parse::<TimeSpan>().unwrap().duration(), Duration::days(1));
        assert_eq!("1W".parse::<TimeSpan>().unwrap().duration(), Duration::days(7));
    }

    #[test]
    fn serde_uses_string_form() {
        let span: TimeSpan = serde_json::from_str("\"12h\"").unwrap();
        assert_eq!(span, TimeSpan::new(nz(12), SpanUnit::Hour));
        assert_eq!(serde_json::to_string(&span).unwrap(), "\"12h\"");
        assert!(serde_json::from_str::<TimeSpan>("\"12x\"").is_err());
    }
}
