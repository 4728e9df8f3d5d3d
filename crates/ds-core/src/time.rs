//! Simulation time model and run limits.
//!
//! # Design
//!
//! Time is a monotonically increasing `Step` counter.  Step 1 is the first
//! step in which drones act; the simulation never revisits a step.  There is
//! no wall-clock mapping: a step is one lock-step round in which every active
//! drone executes exactly one instruction.

use std::fmt;

use crate::{DsError, DsResult};

// ── Step ─────────────────────────────────────────────────────────────────────

/// A global simulation step number.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step(pub u64);

impl Step {
    /// The first step executed by a run.
    pub const FIRST: Step = Step(1);

    /// The step after `self`.
    #[inline]
    pub fn next(self) -> Step {
        Step(self.0 + 1)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Run limits and pacing.
///
/// Every bound the engine enforces lives here rather than in constants so that
/// tests and the CLI can tighten or relax them.  Typically loaded from a TOML
/// file by the application crate (missing keys fall back to [`Default`]).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Largest number of drones a flight plan may declare.  Default: 10.
    pub max_drones: usize,

    /// Largest number of instructions in one drone's plan.  Default: 50.
    pub max_instructions: usize,

    /// Last step the coordinator may release (inclusive).  Reaching it with
    /// drones still active ends the run as incomplete.  Default: 100.
    pub max_steps: u64,

    /// Total collisions at which the run is aborted.  Default: 3.
    pub collision_threshold: u64,

    /// How long the coordinator waits for all released workers to report a
    /// step before declaring the missing ones lost.  Default: 5000 ms.
    pub worker_timeout_ms: u64,

    /// Pause after every step, for watching the grid display.  Default: 0.
    pub step_pause_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_drones:          10,
            max_instructions:    50,
            max_steps:           100,
            collision_threshold: 3,
            worker_timeout_ms:   5_000,
            step_pause_ms:       0,
        }
    }
}

impl SimConfig {
    /// The last step a run may execute.
    #[inline]
    pub fn last_step(&self) -> Step {
        Step(self.max_steps)
    }

    /// Reject limits under which no meaningful run is possible.
    pub fn validate(&self) -> DsResult<()> {
        if self.max_drones == 0 {
            return Err(DsError::Config("max_drones must be at least 1".into()));
        }
        if self.max_steps == 0 {
            return Err(DsError::Config("max_steps must be at least 1".into()));
        }
        if self.collision_threshold == 0 {
            return Err(DsError::Config("collision_threshold must be at least 1".into()));
        }
        if self.worker_timeout_ms == 0 {
            return Err(DsError::Config("worker_timeout_ms must be non-zero".into()));
        }
        Ok(())
    }
}
