//! Rendering seam.
//!
//! The engine stops at a [`ChartPlan`]; drawing is someone else's job. A
//! renderer receives the full plan (points plus axis configuration) in one call.

use std::io::Write;

use crate::context::ChartPlan;

/// Anything that can draw a chart plan.
pub trait ChartRenderer {
    /// Failure type of the renderer.
    type Error;

    /// Draw `plan`.
    fn render(&mut self, plan: &ChartPlan) -> Result<(), Self::Error>;
}

/// Writes the plan as one JSON document for a web front end.
#[derive(Debug)]
pub struct JsonRenderer<W> {
    out: W,
    pretty: bool,
}

impl<W: Write> JsonRenderer<W> {
    /// Compact JSON to `out`.
    pub fn new(out: W) -> Self {
        Self { out, pretty: false }
    }

    /// Indented JSON to `out`.
    pub fn pretty(out: W) -> Self {
        Self { out, pretty: true }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ChartRenderer for JsonRenderer<W> {
    type Error = serde_json::Error;

    fn render(&mut self, plan: &ChartPlan) -> Result<(), Self::Error> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, plan)?;
        } else {
            serde_json::to_writer(&mut self.out, plan)?;
        }
        self.out.write_all(b"\n").map_err(serde_json::Error::io)
    }
}
