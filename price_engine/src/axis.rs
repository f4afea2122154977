//! Y-axis bounds: pad the price range, then round outward to a tier increment.

use serde::{Deserialize, Serialize};

use crate::sample::PlotPoint;
use crate::stats::extrema;

/// Rounded y-axis bounds. `min < max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

/// Axis tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AxisConfig {
    /// Padding on each side as a fraction of `max - min`.
    pub padding_ratio: f64,
    /// Total span given to a flat series, as a fraction of its price.
    pub flat_span_ratio: f64,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            padding_ratio: 0.1,
            flat_span_ratio: 0.01,
        }
    }
}

// absorbs float noise so 1_060_000.0000001 does not round up a whole tick
const ROUNDING_EPSILON: f64 = 1e-9;

/// Rounding increment for a padded maximum.
pub fn rounding_increment(padded_max: f64) -> f64 {
    if padded_max >= 10_000_000.0 {
        10_000.0
    } else if padded_max >= 1_000_000.0 {
        1_000.0
    } else {
        100.0
    }
}

/// Axis bounds for a price range.
///
/// A flat range (`max <= min`) gets a minimum span of
/// `max(|price| * flat_span_ratio, increment)` centred on the price.
pub fn axis_bounds(min: f64, max: f64, cfg: &AxisConfig) -> AxisBounds {
    let (lo, hi) = if max > min {
        let padding = (max - min) * cfg.padding_ratio;
        (min - padding, max + padding)
    } else {
        let half = (max.abs() * cfg.flat_span_ratio).max(rounding_increment(max)) / 2.0;
        (max - half, max + half)
    };
    let inc = rounding_increment(hi);
    let mut y_min = (lo / inc + ROUNDING_EPSILON).floor() * inc;
    let mut y_max = (hi / inc - ROUNDING_EPSILON).ceil() * inc;
    if y_max <= y_min {
        y_min -= inc;
        y_max += inc;
    }
    AxisBounds {
        min: y_min,
        max: y_max,
    }
}

/// Axis bounds for plotted points, `None` when there are none.
pub fn axis_bounds_for(points: &[PlotPoint], cfg: &AxisConfig) -> Option<AxisBounds> {
    let ex = extrema(points)?;
    Some(axis_bounds(ex.min.price, ex.max.price, cfg))
}
