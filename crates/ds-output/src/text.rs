//! Human-readable run report.
//!
//! Layout:
//!
//! ```text
//! ==== Simulation Report ====
//! Report generated on: Sun Oct 19 14:03:12 2026
//! ===========================
//!
//! Initial Drone States (Loaded 2 drones):
//!   Drone ID 1: Start Pos (0, 0, 0), Instructions: 3
//!   ...
//! ---------------------------------------
//!
//! --- Time Step 1 ---
//!   Drone ID 1: Pos (1, 0, 0), Executed Instr 0 (RIGHT)
//!   Drone ID 2: Pos (3, 0, 0) - FINISHED flight plan.
//!   COLLISION! Drones 1 and 2 at (2, 0, 0). Timestamp: 2026-10-19 14:03:12
//! ...
//!
//! ==== Simulation Summary ====
//! ...
//! Overall Simulation Status: COMPLETED WITH COLLISIONS
//! ==========================
//!
//! ==== End of Report ====
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Local;

use ds_plan::FlightPlan;
use ds_sim::{CollisionEvent, StepRecord};

use crate::writer::ReportWriter;
use crate::{DroneStepRow, OutputResult, RunSummary};

/// `ctime`-style layout used for the report's generation time.
const GENERATED_FORMAT: &str = "%a %b %e %H:%M:%S %Y";
/// Layout of collision timestamps.
const EVENT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Writes the report as plain text to any [`Write`] sink.
pub struct TextReportWriter<W: Write> {
    out:      W,
    /// Events seen so far, repeated in the summary's event log.
    log:      Vec<CollisionEvent>,
    finished: bool,
}

impl TextReportWriter<BufWriter<File>> {
    /// Create (or truncate) the report file at `path`.
    pub fn create(path: &Path) -> OutputResult<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> TextReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, log: Vec::new(), finished: false }
    }

    /// Unwrap the sink (e.g. to inspect an in-memory report).
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportWriter for TextReportWriter<W> {
    fn write_header(&mut self, plans: &[FlightPlan]) -> OutputResult<()> {
        writeln!(self.out, "==== Simulation Report ====")?;
        writeln!(self.out, "Report generated on: {}", Local::now().format(GENERATED_FORMAT))?;
        writeln!(self.out, "===========================")?;
        writeln!(self.out)?;

        writeln!(self.out, "Initial Drone States (Loaded {} drones):", plans.len())?;
        for plan in plans {
            writeln!(
                self.out,
                "  Drone ID {}: Start Pos {}, Instructions: {}",
                plan.id.get(),
                plan.start,
                plan.len(),
            )?;
        }
        writeln!(self.out, "---------------------------------------")?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    fn write_step(&mut self, record: &StepRecord, plans: &[FlightPlan]) -> OutputResult<()> {
        writeln!(self.out, "--- Time Step {} ---", record.step.get())?;
        for row in DroneStepRow::from_record(record, plans) {
            if row.finished {
                writeln!(
                    self.out,
                    "  Drone ID {}: Pos ({}, {}, {}) - FINISHED flight plan.",
                    row.drone, row.x, row.y, row.z,
                )?;
            } else if let Some(index) = row.executed {
                writeln!(
                    self.out,
                    "  Drone ID {}: Pos ({}, {}, {}), Executed Instr {} ({})",
                    row.drone,
                    row.x,
                    row.y,
                    row.z,
                    index,
                    row.instruction_str(),
                )?;
            }
        }
        self.out.flush()?;
        Ok(())
    }

    fn write_collision(&mut self, event: &CollisionEvent) -> OutputResult<()> {
        writeln!(
            self.out,
            "  COLLISION! Drones {} and {} at {}. Timestamp: {}",
            event.first.get(),
            event.second.get(),
            event.position,
            event.timestamp.format(EVENT_FORMAT),
        )?;
        self.out.flush()?;
        self.log.push(*event);
        Ok(())
    }

    fn write_summary(&mut self, summary: &RunSummary) -> OutputResult<()> {
        let out = &mut self.out;
        if let Some(error) = &summary.error {
            writeln!(out, "ERROR: {error}")?;
        }
        writeln!(out)?;
        writeln!(out, "==== Simulation Summary ====")?;
        writeln!(out, "Total Drones Simulated: {}", summary.drones)?;
        writeln!(out, "Total Time Steps Executed: {}", summary.steps_executed)?;
        writeln!(out, "Total Collisions Detected: {}", summary.collisions)?;
        match summary.stop_reason {
            Some(reason) => writeln!(out, "Stop Reason: {reason}")?,
            None => writeln!(out, "Stop Reason: run did not start")?,
        }
        if !summary.lost_drones.is_empty() {
            writeln!(out, "Lost Drones: {}", summary.lost_list())?;
        }

        writeln!(out)?;
        writeln!(out, "Collision Event Log ({} entries):", self.log.len())?;
        if self.log.is_empty() {
            writeln!(out, "  No collisions occurred during the simulation.")?;
        }
        for (i, e) in self.log.iter().enumerate() {
            writeln!(
                out,
                "  Event {}: Time Step {}, Drones {} & {} at {}, Logged at: {}",
                i + 1,
                e.step.get(),
                e.first.get(),
                e.second.get(),
                e.position,
                e.timestamp.format(EVENT_FORMAT),
            )?;
        }

        writeln!(out)?;
        writeln!(out, "Overall Simulation Status: {}", summary.status.describe())?;
        writeln!(out, "==========================")?;
        out.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        writeln!(self.out)?;
        writeln!(self.out, "==== End of Report ====")?;
        self.out.flush()?;
        Ok(())
    }
}
