//! Gregorian → solar Hijri (Jalali) calendar conversion.
//!
//! Arithmetic conversion over 33-year cycles; exact for the Gregorian years
//! this data covers (1900-2100). The solar date appears in the `j_date` CSV
//! column, in commit messages and on long-range axis labels.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// A date in the solar Hijri calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SolarDate {
    /// Solar year (e.g. 1404).
    pub year: i32,
    /// Month, 1-12 (Farvardin = 1).
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
}

const DAYS_BEFORE_MONTH: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

/// Convert a Gregorian date.
pub fn gregorian_to_solar(date: NaiveDate) -> SolarDate {
    let gy = i64::from(date.year());
    let gm = date.month0() as usize;
    let gd = i64::from(date.day());

    let gy2 = if gm > 1 { gy + 1 } else { gy };
    let mut days = 355_666 + 365 * gy + (gy2 + 3) / 4 - (gy2 + 99) / 100 + (gy2 + 399) / 400
        + gd
        + DAYS_BEFORE_MONTH[gm];

    let mut jy = -1595 + 33 * (days / 12_053);
    days %= 12_053;
    jy += 4 * (days / 1_461);
    days %= 1_461;
    if days > 365 {
        jy += (days - 1) / 365;
        days = (days - 1) % 365;
    }
    let (jm, jd) = if days < 186 {
        (1 + days / 31, 1 + days % 31)
    } else {
        (7 + (days - 186) / 30, 1 + (days - 186) % 30)
    };

    SolarDate {
        year: jy as i32,
        month: jm as u32,
        day: jd as u32,
    }
}

impl SolarDate {
    /// `MM/DD`, as used on axis labels.
    pub fn month_day(&self) -> String {
        format!("{:02}/{:02}", self.month, self.day)
    }
}

/// `YYYY/MM/DD`
impl fmt::Display for SolarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}/{:02}", self.year, self.month, self.day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solar(y: i32, m: u32, d: u32) -> SolarDate {
        gregorian_to_solar(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn nowruz() {
        assert_eq!(
            solar(2025, 3, 21),
            SolarDate {
                year: 1404,
                month: 1,
                day: 1,
            }
        );
        assert_eq!(
            solar(2025, 3, 20),
            SolarDate {
                year: 1403,
                month: 12,
                day: 30,
            }
        );
        assert_eq!(
            solar(2024, 3, 20),
            SolarDate {
                year: 1403,
                month: 1,
                day: 1,
            }
        );
    }

    #[test]
    fn mid_year_dates() {
        assert_eq!(solar(2025, 6, 10).to_string(), "1404/03/20");
        assert_eq!(
            solar(2025, 9, 23),
            SolarDate {
                year: 1404,
                month: 7,
                day: 1,
            }
        );
        assert_eq!(
            solar(2025, 1, 1),
            SolarDate {
                year: 1403,
                month: 10,
                day: 12,
            }
        );
    }

    #[test]
    fn consecutive_days_never_go_backwards() {
        let mut day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let mut prev = gregorian_to_solar(day);
        for _ in 0..2_000 {
            day = day.succ_opt().unwrap();
            let next = gregorian_to_solar(day);
            assert!(next > prev, "{day}: {prev} -> {next}");
            prev = next;
        }
    }

    #[test]
    fn month_day_label() {
        assert_eq!(solar(2025, 6, 10).month_day(), "03/20");
    }
}
