//! Final outcome of a simulation run.

/// How a run ended.  Returned to the process boundary.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunStatus {
    /// Every drone completed its plan and nothing collided.
    Success,
    /// Every drone completed its plan; collisions stayed below the threshold.
    SuccessWithCollisions,
    /// The collision counter reached the configured threshold.
    FailureThreshold,
    /// Drones were still active when the run ended (step bound reached or a
    /// worker stopped responding).
    FailureIncomplete,
}

impl RunStatus {
    #[inline]
    pub fn is_success(self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::SuccessWithCollisions)
    }

    /// Process exit code: 0 for the success variants, 1 otherwise.
    #[inline]
    pub fn exit_code(self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }

    /// Short machine-friendly label, used in CSV and SQLite output.
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Success               => "success",
            RunStatus::SuccessWithCollisions => "success_with_collisions",
            RunStatus::FailureThreshold      => "failure_threshold",
            RunStatus::FailureIncomplete     => "failure_incomplete",
        }
    }

    /// Human-readable wording for the report summary.
    pub fn describe(self) -> &'static str {
        match self {
            RunStatus::Success =>
                "PASSED (All drones completed without critical issues)",
            RunStatus::SuccessWithCollisions =>
                "COMPLETED WITH COLLISIONS",
            RunStatus::FailureThreshold =>
                "FAILED (Collision threshold exceeded)",
            RunStatus::FailureIncomplete =>
                "FAILED (Not all drones completed their flight plan)",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
