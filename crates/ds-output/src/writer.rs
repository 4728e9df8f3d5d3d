//! The `ReportWriter` trait implemented by all report backends.

use ds_plan::FlightPlan;
use ds_sim::{CollisionEvent, StepRecord};

use crate::{OutputResult, RunSummary};

/// Trait implemented by the text, CSV and SQLite report writers.
///
/// Call order is fixed: `write_header` once, then per step one `write_step`
/// followed by that step's `write_collision`s, `write_summary` once, then
/// `finish`.  Backends flush each step and collision as it is written so a
/// crashed run still leaves its events behind.
pub trait ReportWriter {
    /// Record the swarm as loaded, before any step runs.
    fn write_header(&mut self, plans: &[FlightPlan]) -> OutputResult<()>;

    /// Record where every participating drone ended a step.  `plans` is the
    /// swarm passed to `write_header`, for naming executed instructions.
    fn write_step(&mut self, record: &StepRecord, plans: &[FlightPlan]) -> OutputResult<()>;

    /// Append one collision event.
    fn write_collision(&mut self, event: &CollisionEvent) -> OutputResult<()>;

    /// Record the final totals and status.
    fn write_summary(&mut self, summary: &RunSummary) -> OutputResult<()>;

    /// Flush and close all underlying handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}

impl<W: ReportWriter + ?Sized> ReportWriter for Box<W> {
    fn write_header(&mut self, plans: &[FlightPlan]) -> OutputResult<()> {
        (**self).write_header(plans)
    }
    fn write_step(&mut self, record: &StepRecord, plans: &[FlightPlan]) -> OutputResult<()> {
        (**self).write_step(record, plans)
    }
    fn write_collision(&mut self, event: &CollisionEvent) -> OutputResult<()> {
        (**self).write_collision(event)
    }
    fn write_summary(&mut self, summary: &RunSummary) -> OutputResult<()> {
        (**self).write_summary(summary)
    }
    fn finish(&mut self) -> OutputResult<()> {
        (**self).finish()
    }
}

/// Fan out to several backends.  Every backend gets every call even when an
/// earlier one fails; the first error is returned.
impl<W: ReportWriter> ReportWriter for Vec<W> {
    fn write_header(&mut self, plans: &[FlightPlan]) -> OutputResult<()> {
        each(self, |w| w.write_header(plans))
    }
    fn write_step(&mut self, record: &StepRecord, plans: &[FlightPlan]) -> OutputResult<()> {
        each(self, |w| w.write_step(record, plans))
    }
    fn write_collision(&mut self, event: &CollisionEvent) -> OutputResult<()> {
        each(self, |w| w.write_collision(event))
    }
    fn write_summary(&mut self, summary: &RunSummary) -> OutputResult<()> {
        each(self, |w| w.write_summary(summary))
    }
    fn finish(&mut self) -> OutputResult<()> {
        each(self, |w| w.finish())
    }
}

fn each<W>(writers: &mut [W], mut call: impl FnMut(&mut W) -> OutputResult<()>) -> OutputResult<()> {
    let mut first = None;
    for writer in writers {
        if let Err(e) = call(writer) {
            first.get_or_insert(e);
        }
    }
    first.map_or(Ok(()), Err)
}
