//! Simulation observer trait for progress reporting and display.

use ds_core::{DroneId, Step};
use ds_plan::FlightPlan;

use crate::detector::StepVerdict;
use crate::shared::DroneSnapshot;
use crate::sim::{CoordinatorPhase, RunOutcome};

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] from the coordinator's
/// thread at key points in the step loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.  Observers run while every worker is parked,
/// so they see a quiescent swarm.
///
/// # Example: collision printer
///
/// ```rust,ignore
/// struct CollisionPrinter;
///
/// impl SimObserver for CollisionPrinter {
///     fn on_step_end(&mut self, step: Step, _: &[DroneSnapshot], verdict: &StepVerdict) {
///         if verdict.collisions > 0 {
///             println!("{step}: {} new collision(s)", verdict.collisions);
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called once before any worker is released.
    fn on_run_start(&mut self, _plans: &[FlightPlan]) {}

    /// Called on every coordinator state transition.
    fn on_phase(&mut self, _step: Step, _phase: CoordinatorPhase) {}

    /// Called before the workers of `step` are released.
    fn on_step_start(&mut self, _step: Step) {}

    /// Called after the collision check of `step`, with every drone's state.
    fn on_step_end(
        &mut self,
        _step:     Step,
        _drones:   &[DroneSnapshot],
        _verdict:  &StepVerdict,
    ) {}

    /// Called when a worker stops responding and is taken out of the run.
    fn on_drone_lost(&mut self, _step: Step, _drone: DroneId) {}

    /// Called once after every thread has been joined.
    fn on_run_end(&mut self, _outcome: &RunOutcome) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call `run` but
/// don't want progress callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
