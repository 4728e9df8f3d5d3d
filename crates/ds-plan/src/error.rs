use ds_core::DroneId;
use thiserror::Error;

/// Load-time failures.  Any of these prevents the run from starting.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("flight plan parse error on line {line}: {msg}")]
    Parse { line: u64, msg: String },

    /// One bad token rejects the whole plan; it is never skipped.
    #[error("unknown instruction {token:?} in plan of drone {drone}")]
    UnknownInstruction { drone: DroneId, token: String },

    #[error("drone id {0} appears more than once")]
    DuplicateId(DroneId),

    #[error("flight plan declares {got} drones, limit is {max}")]
    TooManyDrones { max: usize, got: usize },

    #[error("drone {drone} has {got} instructions, limit is {max}")]
    TooManyInstructions { drone: DroneId, max: usize, got: usize },

    #[error("instruction {index} of drone {drone} leaves the grid")]
    OutOfRange { drone: DroneId, index: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PlanResult<T> = Result<T, PlanError>;
