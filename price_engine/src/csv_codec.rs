//! Per-day CSV blobs.
//!
//! A blob holds one day of samples:
//!
//! ```text
//! price18,date,j_date
//! 66120000,2025-06-10T14:30:05+03:30,1404/03/20
//! ```
//!
//! Columns are located by header name, so `date,price18` files written by
//! older tooling read fine. `j_date` is optional. Rows that cannot be parsed
//! are skipped and counted; a bad row never poisons the rest of the day.

use chrono_tz::Tz;
use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;
use tracing::debug;

use crate::jalali::SolarDate;
use crate::sample::Sample;
use crate::tz::parse_timestamp;

/// Price column.
pub const PRICE_COLUMN: &str = "price18";
/// Timestamp column.
pub const DATE_COLUMN: &str = "date";
/// Optional solar-date column.
pub const SOLAR_DATE_COLUMN: &str = "j_date";

/// Errors for blobs that cannot be read at all.
#[derive(Debug, Error)]
pub enum CsvError {
    /// The header lacks a required column (this includes empty blobs).
    #[error("csv header is missing column {0:?}")]
    MissingColumn(&'static str),
    /// The csv reader failed on the header.
    #[error("csv header could not be read: {0}")]
    Header(#[from] csv::Error),
}

/// Column layout used when writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvLayout {
    /// `price18,date`
    Basic,
    /// `price18,date,j_date`
    #[default]
    WithSolarDate,
}

impl CsvLayout {
    /// Header line without the newline.
    pub fn header(&self) -> &'static str {
        match self {
            Self::Basic => "price18,date",
            Self::WithSolarDate => "price18,date,j_date",
        }
    }

    /// Layout of an existing blob, from its first line.
    pub fn detect(content: &str) -> Option<Self> {
        let header = content.lines().next()?;
        let columns: Vec<&str> = header.split(',').map(str::trim).collect();
        if !columns.contains(&PRICE_COLUMN) || !columns.contains(&DATE_COLUMN) {
            return None;
        }
        Some(if columns.contains(&SOLAR_DATE_COLUMN) {
            Self::WithSolarDate
        } else {
            Self::Basic
        })
    }

    fn format_row(&self, row: &CsvRow<'_>) -> String {
        let price = format_price(row.price);
        match self {
            Self::Basic => format!("{price},{}", row.date),
            Self::WithSolarDate => format!("{price},{},{}", row.date, row.solar_date),
        }
    }
}

/// A day's samples plus the number of rows that were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDay {
    /// Parsed samples in file order.
    pub samples: Vec<Sample>,
    /// Rows skipped as malformed.
    pub skipped_rows: usize,
}

/// Parse a day blob. Naive timestamps are read as wall time in `tz`.
pub fn parse_day(content: &str, tz: Tz) -> Result<ParsedDay, CsvError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(CsvError::MissingColumn(name))
    };
    let price_idx = column(PRICE_COLUMN)?;
    let date_idx = column(DATE_COLUMN)?;

    let mut day = ParsedDay::default();
    for (line, record) in reader.records().enumerate() {
        match record.ok().and_then(|r| parse_row(&r, price_idx, date_idx, tz)) {
            Some(sample) => day.samples.push(sample),
            None => {
                debug!(row = line + 1, "skipping malformed csv row");
                day.skipped_rows += 1;
            }
        }
    }
    Ok(day)
}

fn parse_row(record: &StringRecord, price_idx: usize, date_idx: usize, tz: Tz) -> Option<Sample> {
    if record.iter().all(str::is_empty) {
        return None;
    }
    let price: f64 = record.get(price_idx)?.parse().ok()?;
    if !price.is_finite() || price <= 0.0 {
        return None;
    }
    let timestamp = parse_timestamp(record.get(date_idx)?, tz).ok()?;
    Some(Sample { timestamp, price })
}

/// One row to append.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CsvRow<'a> {
    /// Quoted price.
    pub price: f64,
    /// Timestamp string exactly as received upstream.
    pub date: &'a str,
    /// Solar date of the sample's reference-zone day.
    pub solar_date: SolarDate,
}

/// Append `row` to an existing blob, or start a new one with `new_layout`.
///
/// An existing blob keeps its own layout; `j_date` is written only when its
/// header has that column.
pub fn append_row(existing: Option<&str>, row: &CsvRow<'_>, new_layout: CsvLayout) -> String {
    let (mut content, layout) = match existing.filter(|c| !c.trim().is_empty()) {
        Some(c) => (c.to_string(), CsvLayout::detect(c).unwrap_or(new_layout)),
        None => (format!("{}\n", new_layout.header()), new_layout),
    };
    if !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(&layout.format_row(row));
    content.push('\n');
    content
}

fn format_price(price: f64) -> String {
    if price.fract() == 0.0 && price.abs() < 1e15 {
        format!("{}", price as i64)
    } else {
        format!("{price}")
    }
}
