//! Resampling engine behind the gold price chart.
//!
//! The crate turns an irregular stream of price samples into a bounded set of
//! plot points for a display range, together with min/max annotations and
//! rounded axis bounds. Everything here is synchronous and pure; loading and
//! persisting the per-day CSV blobs lives in `gold_ingestor`.
//!
//! Pipeline, as run by [`context::ChartContext::plan`]:
//! 1. [`filter::filter_range`] keeps the suffix inside the range lookback.
//! 2. [`resample::resample`] keeps one sample per wall-clock bucket.
//! 3. [`stats::annotate`] locates extrema and places their labels.
//! 4. [`axis::axis_bounds`] pads and rounds the y axis.

#![deny(missing_docs)]

pub mod axis;
pub mod bucket;
pub mod context;
pub mod csv_codec;
pub mod filter;
pub mod jalali;
pub mod label;
pub mod range;
pub mod render;
pub mod resample;
pub mod sample;
pub mod span;
pub mod stats;
pub mod tz;

pub use context::{ChartContext, ChartPlan};
pub use sample::{PlotPoint, RawSeries, Sample};
