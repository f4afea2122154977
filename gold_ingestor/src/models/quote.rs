use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One quote as returned by the upstream price endpoint.
///
/// ```json
/// {"price18": 66120000, "date": "2025-06-10T14:30:05.123+03:30", "...": "..."}
/// ```
///
/// Fields other than `price18` and `date` are kept in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Price of one gram of 18-carat gold.
    pub price18: f64,
    /// Observation time as the upstream formats it.
    pub date: String,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl PriceQuote {
    /// Quote with no extra fields.
    pub fn new(price18: f64, date: impl Into<String>) -> Self {
        Self {
            price18,
            date: date.into(),
            extra: IndexMap::new(),
        }
    }

    /// Reason the quote is unusable, if any.
    pub fn problem(&self) -> Option<String> {
        if !self.price18.is_finite() || self.price18 <= 0.0 {
            return Some(format!("price18 must be a positive number, got {}", self.price18));
        }
        if self.date.trim().is_empty() {
            return Some("date is empty".to_string());
        }
        None
    }
}
