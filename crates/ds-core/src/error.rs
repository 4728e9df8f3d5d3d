//! Framework error type.
//!
//! Sub-crates define their own error enums and convert `DsError` into them
//! via `From` impls where a core operation (instruction parsing, config
//! validation) can fail inside their own code paths.

use thiserror::Error;

/// The top-level error type for `ds-core`.
#[derive(Debug, Error)]
pub enum DsError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown instruction {0:?}")]
    UnknownInstruction(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `ds-core`.
pub type DsResult<T> = Result<T, DsError>;
