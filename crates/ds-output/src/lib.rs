//! `ds-output`: run reports and console display for the rust_drone simulator.
//!
//! Step records and collision events are drained by an [`EventReporter`]
//! thread into any [`ReportWriter`].  Three backends are provided:
//!
//! | Feature   | Backend               | Files created                           |
//! |-----------|-----------------------|-----------------------------------------|
//! | *(none)*  | `TextReportWriter`    | any path (e.g. `simulation_report.txt`) |
//! | *(none)*  | `CsvReportWriter`     | `drone_steps.csv`, `collisions.csv`,    |
//! |           |                       | `run_summary.csv`                       |
//! | `sqlite`  | `SqliteReportWriter`  | `report.db`                             |
//!
//! [`ConsoleObserver`] implements `ds_sim::SimObserver` and prints the grid
//! view and per-drone status after every step.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ds_output::{EventReporter, RunSummary, TextReportWriter};
//!
//! let (tx, rx) = crossbeam_channel::unbounded();
//! let writer = TextReportWriter::create(Path::new("simulation_report.txt"))?;
//! let reporter = EventReporter::spawn(writer, &plans, rx)?;
//! let mut sim = SimBuilder::new(config, plans).event_channel(tx).build()?;
//! let outcome = sim.run(&mut NoopObserver)?;
//! reporter.finish(&RunSummary::from_outcome(&outcome, sim.plans().len()))?;
//! ```

pub mod csv;
pub mod display;
pub mod error;
pub mod observer;
pub mod reporter;
pub mod row;
pub mod text;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;


pub use crate::csv::CsvReportWriter;
pub use display::{GRID_HEIGHT, GRID_WIDTH, render_grid, render_status_list};
pub use error::{OutputError, OutputResult};
pub use observer::ConsoleObserver;
pub use reporter::EventReporter;
pub use row::{CollisionRow, DroneStepRow, RunSummary};
pub use text::TextReportWriter;
pub use writer::ReportWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteReportWriter;
