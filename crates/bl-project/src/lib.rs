//! bl-project: lab file format, migration and validation.

pub mod migrate;
pub mod schema;
pub mod validate;

use std::path::Path;

use tracing::info;

pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use validate::{ValidationError, validate_lab};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse, migrate and validate a YAML lab file.
pub fn from_yaml_str(content: &str) -> ProjectResult<LabFile> {
    let lab: LabFile = serde_yaml::from_str(content)?;
    finish_load(lab)
}

/// Parse, migrate and validate a JSON lab file.
pub fn from_json_str(content: &str) -> ProjectResult<LabFile> {
    let lab: LabFile = serde_json::from_str(content)?;
    finish_load(lab)
}

fn finish_load(lab: LabFile) -> ProjectResult<LabFile> {
    let lab = migrate_to_latest(lab)?;
    validate_lab(&lab)?;
    Ok(lab)
}

pub fn load_yaml(path: &Path) -> ProjectResult<LabFile> {
    let content = std::fs::read_to_string(path)?;
    let lab = from_yaml_str(&content)?;
    info!(path = %path.display(), scenarios = lab.scenarios.len(), "loaded lab file");
    Ok(lab)
}

pub fn save_yaml(path: &Path, lab: &LabFile) -> ProjectResult<()> {
    validate_lab(lab)?;
    let content = serde_yaml::to_string(lab)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<LabFile> {
    let content = std::fs::read_to_string(path)?;
    let lab = from_json_str(&content)?;
    info!(path = %path.display(), scenarios = lab.scenarios.len(), "loaded lab file");
    Ok(lab)
}

pub fn save_json(path: &Path, lab: &LabFile) -> ProjectResult<()> {
    validate_lab(lab)?;
    let content = serde_json::to_string_pretty(lab)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load by extension: `.json` as JSON, anything else as YAML.
pub fn load(path: &Path) -> ProjectResult<LabFile> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        load_json(path)
    } else {
        load_yaml(path)
    }
}
