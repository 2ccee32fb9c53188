//! Minimal 2D rigid-body world for the integrator-backed scenarios.
//!
//! Provides:
//! - `RigidWorld`, the capability set scenarios depend on (bodies, joints,
//!   property mutation, stepping, teardown)
//! - `World`, the bundled implementation: point-mass bodies, a rigid rope joint
//!   and a friction track joint
//! - Fixed-step RK4 / forward Euler integrators over a `TransientModel`
//! - `WorldFactory` so hosts can inject their own backend

pub mod body;
pub mod error;
pub mod integrator;
pub mod model;
pub mod world;

mod dynamics;

pub use body::{BodyDesc, BodyHandle, BodyKind, BodyState, Joint, JointHandle, Vec2};
pub use error::{EngineError, EngineResult};
pub use integrator::{ForwardEuler, Integrator, IntegratorType, RK4};
pub use model::TransientModel;
pub use world::{DefaultWorldFactory, RigidWorld, World, WorldConfig, WorldFactory};
