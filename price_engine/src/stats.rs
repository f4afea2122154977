//! Extrema and label placement.
//!
//! Labels near the left edge of the plot are nudged right and labels near the
//! right edge are nudged left so they are not clipped. The nudge is a fixed
//! pixel offset; label widths are never measured.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sample::PlotPoint;

/// Which extreme a point is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremumRole {
    /// Lowest price
    Min,
    /// Highest price
    Max,
}

/// A plotted point that is the lowest or highest of its window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremum {
    /// When it occurred.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// The extreme price.
    pub price: f64,
    /// Min or max.
    pub role: ExtremumRole,
}

/// Both extrema of a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extrema {
    /// Lowest price, first occurrence.
    pub min: Extremum,
    /// Highest price, first occurrence.
    pub max: Extremum,
}

/// Label placement tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AnnotationConfig {
    /// Fraction of the time span treated as the edge zone on each side.
    pub edge_margin_ratio: f64,
    /// Horizontal nudge in pixels for labels inside an edge zone.
    pub edge_offset_px: i32,
    /// Vertical offset of the min label (positive is down).
    pub min_label_offset_y: i32,
    /// Vertical offset of the max label.
    pub max_label_offset_y: i32,
    /// Currency word shown in front of the amount.
    pub currency: String,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            edge_margin_ratio: 0.05,
            edge_offset_px: 40,
            min_label_offset_y: 35,
            max_label_offset_y: -5,
            currency: "ریال".to_string(),
        }
    }
}

/// An extremum with its label offsets and text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    /// The annotated point.
    #[serde(flatten)]
    pub extremum: Extremum,
    /// Horizontal label offset in pixels.
    pub offset_x: i32,
    /// Vertical label offset in pixels.
    pub offset_y: i32,
    /// Label text.
    pub label: String,
}

/// Min and max annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotations {
    /// Annotation of the lowest point.
    pub min: Annotation,
    /// Annotation of the highest point.
    pub max: Annotation,
}

/// Scan in timestamp order with strict comparisons, so the earliest of equal
/// extremes wins. `None` for an empty window.
pub fn extrema(points: &[PlotPoint]) -> Option<Extrema> {
    let (first, rest) = points.split_first()?;
    let mut min = first;
    let mut max = first;
    for p in rest {
        if p.price < min.price {
            min = p;
        }
        if p.price > max.price {
            max = p;
        }
    }
    Some(Extrema {
        min: Extremum {
            timestamp: min.timestamp,
            price: min.price,
            role: ExtremumRole::Min,
        },
        max: Extremum {
            timestamp: max.timestamp,
            price: max.price,
            role: ExtremumRole::Max,
        },
    })
}

/// Horizontal nudge for a label at `position` within `[start, end]`.
///
/// Strictly inside the left margin gives `+edge_offset_px`, strictly inside
/// the right margin `-edge_offset_px`, anything else `0`.
pub fn edge_offset(position: f64, start: f64, end: f64, cfg: &AnnotationConfig) -> i32 {
    let margin = (end - start) * cfg.edge_margin_ratio;
    if position < start + margin {
        cfg.edge_offset_px
    } else if position > end - margin {
        -cfg.edge_offset_px
    } else {
        0
    }
}

/// Locate extrema and place their labels. The span is the first to last plotted timestamp.
pub fn annotate(points: &[PlotPoint], cfg: &AnnotationConfig) -> Option<Annotations> {
    let ex = extrema(points)?;
    let start = millis(points.first()?.timestamp);
    let end = millis(points.last()?.timestamp);
    let place = |e: Extremum, offset_y: i32| Annotation {
        offset_x: edge_offset(millis(e.timestamp), start, end, cfg),
        offset_y,
        label: price_label(e.price, &cfg.currency),
        extremum: e,
    };
    Some(Annotations {
        min: place(ex.min, cfg.min_label_offset_y),
        max: place(ex.max, cfg.max_label_offset_y),
    })
}

fn millis(ts: DateTime<Utc>) -> f64 {
    ts.timestamp_millis() as f64
}

/// Right-to-left label: currency word, then the grouped amount.
pub fn price_label(price: f64, currency: &str) -> String {
    format!("\u{200f}{currency} \u{200e}{}", format_thousands(price))
}

/// Group the integer part with commas and keep at most three decimals.
pub fn format_thousands(value: f64) -> String {
    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    if value < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// Percent change from `first` to `last`; `None` when `first` is zero.
pub fn percent_change(first: f64, last: f64) -> Option<f64> {
    (first != 0.0).then(|| (last - first) / first * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn pts(prices: &[f64]) -> Vec<PlotPoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PlotPoint {
                timestamp: Utc.timestamp_opt(i as i64 * 60, 0).unwrap(),
                price,
            })
            .collect()
    }

    #[test]
    fn offsets_at_edges_and_middle() {
        let cfg = AnnotationConfig::default();
        assert_eq!(edge_offset(3.0, 0.0, 100.0, &cfg), 40);
        assert_eq!(edge_offset(50.0, 0.0, 100.0, &cfg), 0);
        assert_eq!(edge_offset(97.0, 0.0, 100.0, &cfg), -40);
        // the margin boundary itself is not "inside"
        assert_eq!(edge_offset(5.0, 0.0, 100.0, &cfg), 0);
        assert_eq!(edge_offset(95.0, 0.0, 100.0, &cfg), 0);
    }

    #[test]
    fn first_occurrence_wins() {
        let points = pts(&[5.0, 1.0, 9.0, 1.0, 9.0]);
        let ex = extrema(&points).unwrap();
        assert_eq!(ex.min.timestamp, points[1].timestamp);
        assert_eq!(ex.max.timestamp, points[2].timestamp);
        assert_eq!(ex.min.role, ExtremumRole::Min);
    }

    #[test]
    fn annotate_places_labels() {
        let points = pts(&[1_000_000.0, 2_000_000.0, 1_500_000.0, 1_200_000.0, 1_100_000.0]);
        let ann = annotate(&points, &AnnotationConfig::default()).unwrap();
        assert_eq!(ann.min.offset_x, 40);
        assert_eq!(ann.min.offset_y, 35);
        assert_eq!(ann.max.offset_x, 0);
        assert_eq!(ann.max.offset_y, -5);
        assert!(ann.max.label.ends_with("2,000,000"));
        assert!(annotate(&[], &AnnotationConfig::default()).is_none());
    }

    #[test]
    fn thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.0), "999");
        assert_eq!(format_thousands(1_000.0), "1,000");
        assert_eq!(format_thousands(66_123_456.0), "66,123,456");
        assert_eq!(format_thousands(1_234.5), "1,234.5");
        assert_eq!(format_thousands(-1_234_567.25), "-1,234,567.25");
    }

    #[test]
    fn percent() {
        assert_eq!(percent_change(100.0, 110.0), Some(10.0));
        assert_eq!(percent_change(0.0, 1.0), None);
    }

    proptest! {
        #[test]
        fn extrema_bound_every_price(prices in proptest::collection::vec(1.0f64..1e8, 1..50)) {
            let points = pts(&prices);
            let ex = extrema(&points).unwrap();
            prop_assert!(points.iter().all(|p| p.price >= ex.min.price && p.price <= ex.max.price));
            let first_min = points.iter().position(|p| p.price == ex.min.price).unwrap();
            prop_assert_eq!(points[first_min].timestamp, ex.min.timestamp);
        }
    }
}
