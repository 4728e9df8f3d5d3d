//! `ConsoleObserver<W>`: prints the swarm to a terminal as the run progresses.

use std::io::Write;

use ds_core::{DroneId, Step};
use ds_plan::FlightPlan;
use ds_sim::{DroneSnapshot, RunOutcome, SimObserver, StepVerdict};

use crate::display::{render_grid, render_status_list};
use crate::OutputError;

/// A [`SimObserver`] that writes the grid view and per-drone status list after
/// every step, plus a line for lost drones and the final status.
///
/// Errors from the sink are stored internally because `SimObserver` methods
/// have no return value.  After `sim.run()` returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct ConsoleObserver<W: Write> {
    out:        W,
    show_grid:  bool,
    plans:      Vec<FlightPlan>,
    last_error: Option<OutputError>,
}

impl<W: Write> ConsoleObserver<W> {
    pub fn new(out: W) -> Self {
        Self { out, show_grid: true, plans: Vec::new(), last_error: None }
    }

    /// Print only the status list, not the grid.
    pub fn without_grid(mut self) -> Self {
        self.show_grid = false;
        self
    }

    /// Take the stored write error (if any) after `sim.run()` returns.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        let result = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush());
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e.into());
            }
        }
    }
}

impl<W: Write> SimObserver for ConsoleObserver<W> {
    fn on_run_start(&mut self, plans: &[FlightPlan]) {
        self.plans = plans.to_vec();
        self.emit(&format!("Starting simulation with {} drones\n", plans.len()));
    }

    fn on_step_end(&mut self, step: Step, drones: &[DroneSnapshot], verdict: &StepVerdict) {
        let mut text = String::new();
        if self.show_grid {
            text.push_str(&render_grid(step, drones));
        }
        text.push_str(&render_status_list(step, drones, &self.plans));
        if verdict.collisions > 0 {
            text.push_str(&format!(
                "  {} collision(s) this step, {} total\n",
                verdict.collisions, verdict.total,
            ));
        }
        text.push('\n');
        self.emit(&text);
    }

    fn on_drone_lost(&mut self, step: Step, drone: DroneId) {
        self.emit(&format!("  Drone ID {} lost in step {}\n", drone.get(), step.get()));
    }

    fn on_run_end(&mut self, outcome: &RunOutcome) {
        self.emit(&format!(
            "Simulation finished after {} steps: {} ({} collisions)\n",
            outcome.steps_executed,
            outcome.status.describe(),
            outcome.collisions,
        ));
    }
}
