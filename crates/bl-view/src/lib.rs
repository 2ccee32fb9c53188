//! bl-view: the rendering boundary.
//!
//! Contains:
//! - mapper (fit scene geometry into a pixel viewport)
//! - frame (per-frame snapshot handed to rendering)
//! - sampler (pulls one frame per display refresh and publishes it)
//! - scheduler (injectable per-frame callback source with cancel tokens)

pub mod error;
pub mod frame;
pub mod mapper;
pub mod sampler;
pub mod scheduler;

pub use error::{ViewError, ViewResult};
pub use frame::{Frame, ScenePoint};
pub use mapper::{SceneTransform, Viewport, fit_scene};
pub use sampler::{FrameSampler, FrameSink};
pub use scheduler::{CancelToken, FrameScheduler, ManualScheduler, TickFn};
