//! Chart context and plans.
//!
//! [`ChartContext`] carries every tunable the chart needs (range table,
//! reference zone, price multiplier, annotation and axis tuning). It is passed
//! explicitly; nothing in the engine reads global state. [`ChartContext::plan`]
//! runs the whole pipeline and returns a [`ChartPlan`] for a renderer.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::axis::{AxisBounds, AxisConfig, axis_bounds_for};
use crate::filter::{Anchor, filter_range};
use crate::label::TimeLabelFormat;
use crate::range::RangeTable;
use crate::resample::resample;
use crate::sample::{PlotPoint, RawSeries};
use crate::stats::{AnnotationConfig, Annotations, annotate, percent_change};
use crate::tz::DEFAULT_TIMEZONE;

/// Everything a chart computation depends on besides the data.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartContext {
    /// Available display ranges.
    pub ranges: RangeTable,
    /// Zone used for bucket alignment and labels.
    pub timezone: Tz,
    /// Factor applied to every plotted price (unit conversion, fees).
    pub price_multiplier: f64,
    /// Label placement tuning.
    pub annotation: AnnotationConfig,
    /// Axis tuning.
    pub axis: AxisConfig,
    /// Where lookback windows end.
    pub anchor: Anchor,
}

impl Default for ChartContext {
    fn default() -> Self {
        Self {
            ranges: RangeTable::builtin(),
            timezone: DEFAULT_TIMEZONE,
            price_multiplier: 1.0,
            annotation: AnnotationConfig::default(),
            axis: AxisConfig::default(),
            anchor: Anchor::LatestSample,
        }
    }
}

/// Time extent of the plotted points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeWindow {
    /// First plotted timestamp.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
    /// Last plotted timestamp.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end: DateTime<Utc>,
}

/// What a renderer needs to draw one range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPlan {
    /// Range token actually used.
    pub range: String,
    /// `true` when the requested token was unknown and the default was used.
    pub fell_back: bool,
    /// Points to draw, oldest first.
    pub points: Vec<PlotPoint>,
    /// Extent of `points`.
    pub window: Option<TimeWindow>,
    /// Min/max labels.
    pub annotations: Option<Annotations>,
    /// Y-axis bounds.
    pub axis: Option<AxisBounds>,
    /// X-axis label format.
    pub label_format: TimeLabelFormat,
    /// Newest plotted point.
    pub latest: Option<PlotPoint>,
    /// Change of the newest point against the first visible one, in percent.
    pub change_pct: Option<f64>,
}

impl ChartPlan {
    /// `true` when there is nothing to draw ("no data" state).
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl ChartContext {
    /// Plan `range_token` over `raw` using the context's anchor.
    pub fn plan(&self, raw: &RawSeries, range_token: &str) -> ChartPlan {
        self.plan_at(raw, range_token, self.anchor)
    }

    /// Plan `range_token` over `raw` with an explicit anchor.
    pub fn plan_at(&self, raw: &RawSeries, range_token: &str, anchor: Anchor) -> ChartPlan {
        let resolved = self.ranges.resolve(range_token);
        if resolved.fell_back {
            debug!(requested = range_token, used = resolved.token, "unknown range, using default");
        }

        let visible = filter_range(raw, resolved.spec.lookback.duration(), anchor);
        let mut points = resample(visible, resolved.spec.bucket, self.timezone);
        if self.price_multiplier != 1.0 {
            for p in &mut points {
                p.price *= self.price_multiplier;
            }
        }
        debug!(
            range = resolved.token,
            raw = raw.len(),
            visible = visible.len(),
            plotted = points.len(),
            "planned chart"
        );

        let window = match (points.first(), points.last()) {
            (Some(first), Some(last)) => Some(TimeWindow {
                start: first.timestamp,
                end: last.timestamp,
            }),
            _ => None,
        };
        let label_format = window
            .map(|w| TimeLabelFormat::for_span(w.end - w.start))
            .unwrap_or(TimeLabelFormat::Time);
        let change_pct = match (points.first(), points.last()) {
            (Some(first), Some(last)) => percent_change(first.price, last.price),
            _ => None,
        };

        ChartPlan {
            range: resolved.token.to_string(),
            fell_back: resolved.fell_back,
            annotations: annotate(&points, &self.annotation),
            axis: axis_bounds_for(&points, &self.axis),
            latest: points.last().copied(),
            window,
            label_format,
            change_pct,
            points,
        }
    }
}
