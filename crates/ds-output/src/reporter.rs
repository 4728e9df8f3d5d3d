//! The event reporter: a single consumer thread that drains step records and
//! collision events into a [`ReportWriter`].
//!
//! The simulator's detector only ever sends on an unbounded channel, so a slow
//! disk never stalls a step.  The reporter exits once every sender is gone,
//! which happens when the run ends and the detector is shut down.

use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;

use ds_plan::FlightPlan;
use ds_sim::SimEvent;

use crate::writer::ReportWriter;
use crate::{OutputError, OutputResult, RunSummary};

/// What the reporter thread hands back once its channel closes.
struct Drained<W> {
    writer:      W,
    /// Collision events written.
    written:     u64,
    first_error: Option<OutputError>,
}

/// Handle to a running reporter thread.
///
/// # Usage
///
/// ```rust,ignore
/// let (tx, rx) = crossbeam_channel::unbounded();
/// let reporter = EventReporter::spawn(writer, &plans, rx)?;
/// let outcome = SimBuilder::new(config, plans).event_channel(tx).build()?.run(&mut obs)?;
/// reporter.finish(&RunSummary::from_outcome(&outcome, n))?;
/// ```
pub struct EventReporter<W> {
    thread: JoinHandle<Drained<W>>,
}

impl<W: ReportWriter + Send + 'static> EventReporter<W> {
    /// Write the report header for `plans`, then start draining `events` on a
    /// thread named `event-reporter`.
    pub fn spawn(
        mut writer: W,
        plans:      &[FlightPlan],
        events:     Receiver<SimEvent>,
    ) -> OutputResult<Self> {
        writer.write_header(plans)?;
        let plans = plans.to_vec();
        let thread = thread::Builder::new()
            .name("event-reporter".into())
            .spawn(move || drain(writer, &plans, events))?;
        Ok(Self { thread })
    }

    /// Wait for the channel to close, then write `summary` and close the
    /// writer.  Returns the writer so callers can inspect in-memory sinks.
    ///
    /// The summary and close are attempted even if an earlier write failed;
    /// the first error of the whole report is returned.
    ///
    /// Every sender of the event channel must have been dropped (i.e. the
    /// simulation has finished or been dropped), otherwise this blocks.
    pub fn finish(self, summary: &RunSummary) -> OutputResult<W> {
        let Drained { mut writer, written, first_error } =
            self.thread.join().map_err(|_| OutputError::ReporterPanicked)?;
        if first_error.is_none() && written != summary.events_emitted {
            tracing::warn!(
                written,
                emitted = summary.events_emitted,
                "reporter wrote a different number of events than the detector emitted",
            );
        }

        let summary_result = writer.write_summary(summary);
        let finish_result = writer.finish();
        if let Some(e) = first_error.or(summary_result.err()).or(finish_result.err()) {
            tracing::error!(error = %e, "report closed with errors");
            return Err(e);
        }
        tracing::info!(events = written, "report closed");
        Ok(writer)
    }
}

fn drain<W: ReportWriter>(mut writer: W, plans: &[FlightPlan], events: Receiver<SimEvent>) -> Drained<W> {
    let mut written = 0;
    let mut first_error = None;
    // Keep consuming after a write error so the channel never backs up.
    for event in events {
        let (step, result) = match &event {
            SimEvent::Step(record) => (record.step, writer.write_step(record, plans)),
            SimEvent::Collision(collision) => {
                let result = writer.write_collision(collision);
                if result.is_ok() {
                    written += 1;
                }
                (collision.step, result)
            }
        };
        if let Err(e) = result {
            tracing::error!(%step, error = %e, "failed to write report event");
            first_error.get_or_insert(e);
        }
    }
    Drained { writer, written, first_error }
}
