//! X-axis label format chosen from the plotted time span.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::jalali::gregorian_to_solar;

/// How timestamps are printed under the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeLabelFormat {
    /// `HH:MM`
    Time,
    /// Solar `MM/DD HH:MM`
    SolarDateTime,
    /// Solar `MM/DD`
    SolarDate,
}

impl TimeLabelFormat {
    /// Up to a day shows clock time, up to a week adds the date, longer drops the clock.
    pub fn for_span(span: Duration) -> Self {
        if span <= Duration::days(1) {
            Self::Time
        } else if span <= Duration::days(7) {
            Self::SolarDateTime
        } else {
            Self::SolarDate
        }
    }

    /// Render `ts` as wall time in `tz`.
    pub fn format(&self, ts: DateTime<Utc>, tz: Tz) -> String {
        let local = ts.with_timezone(&tz);
        let clock = local.format("%H:%M");
        match self {
            Self::Time => clock.to_string(),
            Self::SolarDateTime => {
                format!("{} {clock}", gregorian_to_solar(local.date_naive()).month_day())
            }
            Self::SolarDate => gregorian_to_solar(local.date_naive()).month_day(),
        }
    }
}
