use ds_core::DsError;
use ds_plan::PlanError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(#[from] DsError),

    #[error("invalid flight plans: {0}")]
    Plan(#[from] PlanError),

    #[error("failed to spawn {what} thread: {source}")]
    Spawn {
        what:   String,
        #[source]
        source: std::io::Error,
    },

    #[error("simulation has already been run")]
    AlreadyRun,
}

pub type SimResult<T> = Result<T, SimError>;
