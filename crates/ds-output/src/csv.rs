//! CSV report backend.
//!
//! Creates three files in the configured output directory:
//! - `drone_steps.csv`: one row per drone per step it took part in
//! - `collisions.csv`: one row per collision event
//! - `run_summary.csv`: one row with the final totals

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::Writer;

use ds_plan::FlightPlan;
use ds_sim::{CollisionEvent, StepRecord};

use crate::writer::ReportWriter;
use crate::{CollisionRow, DroneStepRow, OutputResult, RunSummary};

/// Writes the step log, collision log and run summary as CSV.
pub struct CsvReportWriter {
    steps:        Writer<File>,
    collisions:   Writer<File>,
    summary_path: PathBuf,
    finished:     bool,
}

impl CsvReportWriter {
    /// Create `drone_steps.csv` and `collisions.csv` in `dir` and write their
    /// header rows.  The summary file is created when the summary is written.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut steps = Writer::from_path(dir.join("drone_steps.csv"))?;
        steps.write_record(["step", "drone", "x", "y", "z", "executed", "instruction", "finished"])?;
        steps.flush()?;

        let mut collisions = Writer::from_path(dir.join("collisions.csv"))?;
        collisions.write_record(["step", "unix_secs", "first", "second", "x", "y", "z"])?;
        collisions.flush()?;

        Ok(Self {
            steps,
            collisions,
            summary_path: dir.join("run_summary.csv"),
            finished:     false,
        })
    }
}

impl ReportWriter for CsvReportWriter {
    fn write_header(&mut self, _plans: &[FlightPlan]) -> OutputResult<()> {
        Ok(())
    }

    fn write_step(&mut self, record: &StepRecord, plans: &[FlightPlan]) -> OutputResult<()> {
        for row in DroneStepRow::from_record(record, plans) {
            self.steps.write_record(&[
                row.step.to_string(),
                row.drone.to_string(),
                row.x.to_string(),
                row.y.to_string(),
                row.z.to_string(),
                row.executed.map(|i| i.to_string()).unwrap_or_default(),
                row.instruction_str().to_owned(),
                row.finished.to_string(),
            ])?;
        }
        self.steps.flush()?;
        Ok(())
    }

    fn write_collision(&mut self, event: &CollisionEvent) -> OutputResult<()> {
        let row = CollisionRow::from(event);
        self.collisions.write_record(&[
            row.step.to_string(),
            row.unix_secs.to_string(),
            row.first.to_string(),
            row.second.to_string(),
            row.x.to_string(),
            row.y.to_string(),
            row.z.to_string(),
        ])?;
        self.collisions.flush()?;
        Ok(())
    }

    fn write_summary(&mut self, summary: &RunSummary) -> OutputResult<()> {
        let mut w = Writer::from_path(&self.summary_path)?;
        w.write_record([
            "drones", "steps_executed", "collisions", "events_emitted",
            "lost_drones", "stop_reason", "status", "error",
        ])?;
        w.write_record(&[
            summary.drones.to_string(),
            summary.steps_executed.to_string(),
            summary.collisions.to_string(),
            summary.events_emitted.to_string(),
            summary.lost_list(),
            summary.stop_reason_str().to_owned(),
            summary.status.to_string(),
            summary.error.clone().unwrap_or_default(),
        ])?;
        w.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.steps.flush()?;
        self.collisions.flush()?;
        Ok(())
    }
}
