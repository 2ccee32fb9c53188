//! Error types for the bl-app service layer.

use std::path::PathBuf;

use bl_scenarios::ScenarioError;

/// Application error type shared by every frontend.
///
/// Scenario errors keep their structure so hosts can tell a rejected edit
/// from an unavailable engine.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Lab file error: {0}")]
    Project(String),

    #[error("Failed to read lab file: {path}")]
    LabFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("No scenario is mounted")]
    NotMounted,

    #[error("Session is busy publishing a frame")]
    Busy,

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error("View error: {0}")]
    View(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for bl-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<bl_project::ProjectError> for AppError {
    fn from(err: bl_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<bl_view::ViewError> for AppError {
    fn from(err: bl_view::ViewError) -> Self {
        AppError::View(err.to_string())
    }
}
