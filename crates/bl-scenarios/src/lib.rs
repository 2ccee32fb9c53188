//! Scenario models for the lab: pendulum, inclined plane, circuit, lever, optics.
//!
//! Each model owns its parameters, its physical state engine (a rigid-body
//! world or a closed-form recomputation) and its threshold detection, and
//! exposes them through the common [`Scenario`] interface.
//!
//! # Architecture
//!
//! - Parameters are plain structs edited through validating setters
//!   ([`Field::accept`] clamps, wraps or rejects)
//! - Integrator-backed models hold a world created by a [`bl_rigid::WorldFactory`]
//!   and release it on drop
//! - Analytic models recompute synchronously on every edit; running only gates
//!   threshold evaluation
//! - Poses are reported in physical units (metres, y up); mapping to pixels is
//!   the view layer's job

pub mod circuit;
pub mod error;
pub mod events;
pub mod geometry;
pub mod incline;
pub mod lever;
pub mod optics;
pub mod params;
pub mod pendulum;
pub mod scenario;
pub mod timing;

pub use circuit::{
    Circuit, CircuitComponent, CircuitDerived, CircuitLimits, CircuitParams, ComponentKind,
    Topology, total_resistance,
};
pub use error::{ScenarioError, ScenarioResult};
pub use events::{EventFlags, EventKind};
pub use geometry::{Bounds, NamedAngle, NamedPoint, Point, PoseSample, SceneGeometry};
pub use incline::{InclineDerived, InclineEngine, InclineParams, InclinedPlane, can_slide};
pub use lever::{Lever, LeverDerived, LeverParams};
pub use optics::{
    Material, MediumSide, Optics, OpticsDerived, OpticsParams, RayMode, SpectralBand, SurfaceKind,
    critical_angle_deg, snell,
};
pub use params::{Field, FieldRange, ParameterEdit};
pub use pendulum::{Pendulum, PendulumDerived, PendulumEngine, PendulumParams};
pub use scenario::{
    DerivedQuantities, EditOutcome, EngineStatus, MountOptions, RunState, Scenario, ScenarioKind,
    mount,
};
pub use bl_rigid::IntegratorType;
pub use timing::{FixedStepClock, StepOptions};
