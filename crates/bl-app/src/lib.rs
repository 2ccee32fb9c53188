//! Shared application service layer for Bongo Lab.
//!
//! Frontends (the CLI today, a renderer later) go through this crate for lab
//! file handling, mounting scenarios and running their frame loop.

pub mod error;
pub mod lab_service;
pub mod run_service;
pub mod session;

pub use error::{AppError, AppResult};
pub use lab_service::{
    ScenarioSummary, apply_preset, get_scenario, list_scenarios, load_lab, session_options,
    validate_lab,
};
pub use run_service::{FrameLog, HeadlessRun, RunSummary, ScheduledEdit, run_headless};
pub use session::{DEFAULT_MARGIN_PX, MountSource, Session, SessionOptions};
