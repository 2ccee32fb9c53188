//! bl-core: stable foundation for the lab simulation crates.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + tolerances + float helpers)
//! - angle (degree/radian conversion and canonical ranges)
//! - ids (compact IDs for placed components)
//! - error (shared error types)

pub mod angle;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use angle::*;
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
