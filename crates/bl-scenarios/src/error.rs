//! Error types for scenario operations.

use bl_core::CoreError;
use bl_rigid::EngineError;
use thiserror::Error;

use crate::params::Field;
use crate::scenario::ScenarioKind;

/// Errors raised by scenario models.
///
/// None of these is fatal: the worst outcome is a stopped scenario with a
/// consistent pose.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("Invalid value for {field}: {value}")]
    InvalidParameter { field: Field, value: f64 },

    #[error("Edit '{edit}' does not apply to the {scenario} scenario")]
    UnsupportedEdit {
        scenario: ScenarioKind,
        edit: String,
    },

    #[error("Physics engine unavailable: {message}")]
    EngineUnavailable { message: String },

    #[error("Physics engine error: {0}")]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Unknown component: {id}")]
    UnknownComponent { id: u32 },

    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: &'static str },

    #[error("Unknown {what}: '{name}'")]
    UnknownName { what: &'static str, name: String },
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
