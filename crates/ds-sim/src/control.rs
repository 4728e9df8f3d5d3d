//! Run-wide control state: the clock, the `running` flag and the collision
//! counter.
//!
//! One `SimControl` is shared (via `Arc`) by the coordinator, the detector and
//! every worker.  Nothing writes its fields directly; all changes go through
//! the transition methods below, which keep three invariants:
//!
//! - `current_step` and the collision counter never decrease;
//! - `running` goes from `true` to `false` exactly once and never back;
//! - the first [`StopReason`] recorded wins.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use ds_core::Step;

/// Why the run stopped.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum StopReason {
    /// No drone remained active.
    Completed,
    /// The collision counter reached the configured threshold.
    ThresholdExceeded,
    /// The last allowed step ran while drones were still active.
    StepBoundExceeded,
    /// The collision detector stopped answering.
    DetectorFailed,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::Completed         => "completed",
            StopReason::ThresholdExceeded => "threshold_exceeded",
            StopReason::StepBoundExceeded => "step_bound_exceeded",
            StopReason::DetectorFailed    => "detector_failed",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared clock, termination flag and collision counter.
pub struct SimControl {
    running:      AtomicBool,
    current_step: AtomicU64,
    collisions:   AtomicU64,
    threshold:    u64,
    stop_reason:  Mutex<Option<StopReason>>,
}

impl SimControl {
    pub fn new(collision_threshold: u64) -> Self {
        Self {
            running:      AtomicBool::new(true),
            current_step: AtomicU64::new(Step::FIRST.0),
            collisions:   AtomicU64::new(0),
            threshold:    collision_threshold,
            stop_reason:  Mutex::new(None),
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The step currently being (or about to be) executed.
    #[inline]
    pub fn current_step(&self) -> Step {
        Step(self.current_step.load(Ordering::SeqCst))
    }

    #[inline]
    pub fn collisions(&self) -> u64 {
        self.collisions.load(Ordering::SeqCst)
    }

    #[inline]
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    #[inline]
    pub fn threshold_reached(&self) -> bool {
        self.collisions() >= self.threshold
    }

    /// Why the run stopped, once it has.
    pub fn stop_reason(&self) -> Option<StopReason> {
        *self.stop_reason.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// End the run.  Returns `true` if this call did it; later calls are
    /// no-ops and do not overwrite the first reason.
    pub fn stop(&self, reason: StopReason) -> bool {
        let mut slot = self.stop_reason.lock().unwrap_or_else(PoisonError::into_inner);
        if self.running.swap(false, Ordering::SeqCst) {
            *slot = Some(reason);
            true
        } else {
            false
        }
    }

    /// Move the clock to the next step and return it.
    pub(crate) fn advance_step(&self) -> Step {
        Step(self.current_step.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Count one collision and return the new total.
    pub(crate) fn record_collision(&self) -> u64 {
        self.collisions.fetch_add(1, Ordering::SeqCst) + 1
    }
}
