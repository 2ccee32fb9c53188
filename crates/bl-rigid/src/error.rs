//! Error types for rigid-body world operations.

use thiserror::Error;

/// Errors raised by a rigid-body world.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Capacity exceeded: {what} (limit={limit})")]
    CapacityExceeded { what: &'static str, limit: usize },

    #[error("Unknown body handle: {index}")]
    UnknownBody { index: u32 },

    #[error("Unknown joint handle: {index}")]
    UnknownJoint { index: u32 },

    #[error("Non-finite state after step: {what}")]
    NonFinite { what: &'static str },

    #[error("World has been torn down")]
    TornDown,

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<bl_core::CoreError> for EngineError {
    fn from(e: bl_core::CoreError) -> Self {
        EngineError::Backend {
            message: e.to_string(),
        }
    }
}
