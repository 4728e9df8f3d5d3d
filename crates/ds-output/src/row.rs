//! Plain data row types written by report backends.

use ds_core::{DroneId, Instruction, RunStatus};
use ds_plan::FlightPlan;
use ds_sim::{CollisionEvent, RunOutcome, StepRecord, StopReason};

/// One collision, flattened for tabular backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionRow {
    pub step:      u64,
    pub unix_secs: i64,
    pub first:     u32,
    pub second:    u32,
    pub x:         i32,
    pub y:         i32,
    pub z:         i32,
}

impl From<&CollisionEvent> for CollisionRow {
    fn from(e: &CollisionEvent) -> Self {
        Self {
            step:      e.step.get(),
            unix_secs: e.timestamp.timestamp(),
            first:     e.first.get(),
            second:    e.second.get(),
            x:         e.position.x,
            y:         e.position.y,
            z:         e.position.z,
        }
    }
}

/// Where one drone stood at the end of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroneStepRow {
    pub step:        u64,
    pub drone:       u32,
    pub x:           i32,
    pub y:           i32,
    pub z:           i32,
    /// Index of the instruction executed in this step, `None` for an empty plan.
    pub executed:    Option<usize>,
    pub instruction: Option<Instruction>,
    pub finished:    bool,
}

impl DroneStepRow {
    /// One row per drone in `record`, in record order.  Instructions are
    /// looked up by drone id in `plans`.
    pub fn from_record(record: &StepRecord, plans: &[FlightPlan]) -> Vec<Self> {
        record
            .drones
            .iter()
            .map(|d| {
                let instruction = d.last_executed.and_then(|i| {
                    plans.iter().find(|p| p.id == d.id).and_then(|p| p.instruction(i))
                });
                Self {
                    step:     record.step.get(),
                    drone:    d.id.get(),
                    x:        d.position.x,
                    y:        d.position.y,
                    z:        d.position.z,
                    executed: d.last_executed,
                    instruction,
                    finished: d.finished,
                }
            })
            .collect()
    }

    /// Token of the executed instruction, or `""`.
    pub fn instruction_str(&self) -> &'static str {
        self.instruction.map_or("", Instruction::as_str)
    }
}

/// End-of-run totals, written once after the reporter has drained every
/// event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub drones:         usize,
    pub status:         RunStatus,
    /// `None` when the run never started.
    pub stop_reason:    Option<StopReason>,
    pub steps_executed: u64,
    pub collisions:     u64,
    pub events_emitted: u64,
    pub lost_drones:    Vec<DroneId>,
    /// Why the run could not be started or completed, if it failed outright.
    pub error:          Option<String>,
}

impl RunSummary {
    pub fn from_outcome(outcome: &RunOutcome, drones: usize) -> Self {
        Self {
            drones,
            status:         outcome.status,
            stop_reason:    Some(outcome.stop_reason),
            steps_executed: outcome.steps_executed,
            collisions:     outcome.collisions,
            events_emitted: outcome.events_emitted,
            lost_drones:    outcome.lost_drones.clone(),
            error:          None,
        }
    }

    /// Summary for a run that failed before its first step.
    pub fn not_started(drones: usize, error: impl Into<String>) -> Self {
        Self {
            drones,
            status:         RunStatus::FailureIncomplete,
            stop_reason:    None,
            steps_executed: 0,
            collisions:     0,
            events_emitted: 0,
            lost_drones:    Vec::new(),
            error:          Some(error.into()),
        }
    }

    /// `stop_reason` as written to tabular backends.
    pub fn stop_reason_str(&self) -> &'static str {
        self.stop_reason.map_or("not_started", StopReason::as_str)
    }

    /// Lost drone ids joined with `;`, empty if none.
    pub fn lost_list(&self) -> String {
        self.lost_drones
            .iter()
            .map(|d| d.get().to_string())
            .collect::<Vec<_>>()
            .join(";")
    }
}
