//! SQLite report backend (feature `sqlite`).
//!
//! Creates a single `report.db` file in the configured output directory with
//! four tables: `drones`, `drone_steps`, `collisions` and `run_summary`.

use std::path::Path;

use rusqlite::Connection;

use ds_plan::FlightPlan;
use ds_sim::{CollisionEvent, StepRecord};

use crate::writer::ReportWriter;
use crate::{CollisionRow, DroneStepRow, OutputResult, RunSummary};

/// Writes the run report to an SQLite database.
pub struct SqliteReportWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteReportWriter {
    /// Open (or create) `report.db` in `dir` and initialise the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("report.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS drones (
                 drone_id     INTEGER PRIMARY KEY,
                 start_x      INTEGER NOT NULL,
                 start_y      INTEGER NOT NULL,
                 start_z      INTEGER NOT NULL,
                 instructions INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS drone_steps (
                 step        INTEGER NOT NULL,
                 drone_id    INTEGER NOT NULL,
                 x           INTEGER NOT NULL,
                 y           INTEGER NOT NULL,
                 z           INTEGER NOT NULL,
                 executed    INTEGER,
                 instruction TEXT,
                 finished    INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS collisions (
                 step      INTEGER NOT NULL,
                 unix_secs INTEGER NOT NULL,
                 first     INTEGER NOT NULL,
                 second    INTEGER NOT NULL,
                 x         INTEGER NOT NULL,
                 y         INTEGER NOT NULL,
                 z         INTEGER NOT NULL
             );
             CREATE TABLE IF NOT EXISTS run_summary (
                 drones         INTEGER NOT NULL,
                 steps_executed INTEGER NOT NULL,
                 collisions     INTEGER NOT NULL,
                 events_emitted INTEGER NOT NULL,
                 lost_drones    TEXT    NOT NULL,
                 stop_reason    TEXT    NOT NULL,
                 status         TEXT    NOT NULL,
                 error          TEXT
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl ReportWriter for SqliteReportWriter {
    fn write_header(&mut self, plans: &[FlightPlan]) -> OutputResult<()> {
        if plans.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT OR REPLACE INTO drones \
                 (drone_id, start_x, start_y, start_z, instructions) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for plan in plans {
                stmt.execute(rusqlite::params![
                    plan.id.get(),
                    plan.start.x,
                    plan.start.y,
                    plan.start.z,
                    plan.len() as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_step(&mut self, record: &StepRecord, plans: &[FlightPlan]) -> OutputResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO drone_steps \
                 (step, drone_id, x, y, z, executed, instruction, finished) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for row in DroneStepRow::from_record(record, plans) {
                stmt.execute(rusqlite::params![
                    row.step as i64,
                    row.drone,
                    row.x,
                    row.y,
                    row.z,
                    row.executed.map(|i| i as i64),
                    row.instruction.map(|i| i.as_str()),
                    row.finished,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_collision(&mut self, event: &CollisionEvent) -> OutputResult<()> {
        let row = CollisionRow::from(event);
        self.conn.execute(
            "INSERT INTO collisions (step, unix_secs, first, second, x, y, z) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                row.step as i64,
                row.unix_secs,
                row.first,
                row.second,
                row.x,
                row.y,
                row.z,
            ],
        )?;
        Ok(())
    }

    fn write_summary(&mut self, summary: &RunSummary) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO run_summary \
             (drones, steps_executed, collisions, events_emitted, lost_drones, stop_reason, status, error) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                summary.drones as i64,
                summary.steps_executed as i64,
                summary.collisions as i64,
                summary.events_emitted as i64,
                summary.lost_list(),
                summary.stop_reason_str(),
                summary.status.as_str(),
                summary.error.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
