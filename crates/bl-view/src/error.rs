use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewError {
    #[error("Invalid viewport {width}x{height}: both sides must be finite and positive")]
    InvalidViewport { width: f64, height: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

pub type ViewResult<T> = Result<T, ViewError>;
