//! The rigid-body world: capability trait, bundled implementation, factory.

use bl_core::units::constants::G0_MPS2;
use tracing::{debug, warn};

use crate::body::{BodyDesc, BodyHandle, BodyKind, BodyState, Joint, JointHandle, Vec2};
use crate::dynamics::{self, BodyProps, WorldDynamics};
use crate::error::{EngineError, EngineResult};
use crate::integrator::IntegratorType;

/// Capability set the scenarios depend on.
///
/// Anything able to create bodies and joints, mutate their properties, step
/// and tear down can stand in for the bundled [`World`].
pub trait RigidWorld {
    fn gravity(&self) -> Vec2;
    fn set_gravity(&mut self, gravity: Vec2) -> EngineResult<()>;

    fn add_body(&mut self, desc: BodyDesc) -> EngineResult<BodyHandle>;
    fn add_joint(&mut self, body: BodyHandle, joint: Joint) -> EngineResult<JointHandle>;
    fn update_joint(&mut self, handle: JointHandle, joint: Joint) -> EngineResult<()>;

    fn set_mass(&mut self, body: BodyHandle, mass: f64) -> EngineResult<()>;
    fn body_mass(&self, body: BodyHandle) -> EngineResult<f64>;
    fn set_pose(&mut self, body: BodyHandle, state: BodyState) -> EngineResult<()>;
    fn body_state(&self, body: BodyHandle) -> EngineResult<BodyState>;

    /// Advance simulated time by `dt` seconds.
    fn step(&mut self, dt: f64) -> EngineResult<()>;
    /// Simulated time since creation (seconds).
    fn time(&self) -> f64;

    /// Release every body and joint. Idempotent; any later call fails with `TornDown`.
    fn teardown(&mut self);
    fn is_torn_down(&self) -> bool;
}

/// Creates worlds. Injected into scenarios so hosts and tests can swap backends.
pub trait WorldFactory {
    fn create(&self, config: &WorldConfig) -> EngineResult<Box<dyn RigidWorld>>;
}

impl<F> WorldFactory for F
where
    F: Fn(&WorldConfig) -> EngineResult<Box<dyn RigidWorld>>,
{
    fn create(&self, config: &WorldConfig) -> EngineResult<Box<dyn RigidWorld>> {
        self(config)
    }
}

/// Factory producing the bundled [`World`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultWorldFactory;

impl WorldFactory for DefaultWorldFactory {
    fn create(&self, config: &WorldConfig) -> EngineResult<Box<dyn RigidWorld>> {
        Ok(Box::new(World::new(config.clone())?))
    }
}

/// World construction options.
#[derive(Clone, Debug)]
pub struct WorldConfig {
    /// Gravity vector (m/s²)
    pub gravity: Vec2,
    /// Maximum number of bodies the world may hold
    pub max_bodies: usize,
    /// Maximum number of joints the world may hold
    pub max_joints: usize,
    pub integrator: IntegratorType,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -G0_MPS2),
            max_bodies: 16,
            max_joints: 16,
            integrator: IntegratorType::default(),
        }
    }
}

/// Bundled rigid-body world of constrained point masses.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    gravity: Vec2,
    props: Vec<BodyProps>,
    states: Vec<BodyState>,
    /// joint handle index -> owning body index
    joints: Vec<u32>,
    time: f64,
    torn_down: bool,
}

impl World {
    pub fn new(config: WorldConfig) -> EngineResult<Self> {
        if !config.gravity.iter().all(|c| c.is_finite()) {
            return Err(EngineError::InvalidArg {
                what: "gravity must be finite",
            });
        }
        if config.max_bodies == 0 {
            return Err(EngineError::InvalidArg {
                what: "max_bodies must be positive",
            });
        }
        Ok(Self {
            gravity: config.gravity,
            config,
            props: Vec::new(),
            states: Vec::new(),
            joints: Vec::new(),
            time: 0.0,
            torn_down: false,
        })
    }

    pub fn body_count(&self) -> usize {
        self.props.len()
    }

    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    fn ensure_live(&self) -> EngineResult<()> {
        if self.torn_down {
            Err(EngineError::TornDown)
        } else {
            Ok(())
        }
    }

    fn body_index(&self, body: BodyHandle) -> EngineResult<usize> {
        self.ensure_live()?;
        let index = body.0 as usize;
        if index < self.props.len() {
            Ok(index)
        } else {
            Err(EngineError::UnknownBody { index: body.0 })
        }
    }
}

impl RigidWorld for World {
    fn gravity(&self) -> Vec2 {
        self.gravity
    }

    fn set_gravity(&mut self, gravity: Vec2) -> EngineResult<()> {
        self.ensure_live()?;
        if !gravity.iter().all(|c| c.is_finite()) {
            return Err(EngineError::InvalidArg {
                what: "gravity must be finite",
            });
        }
        self.gravity = gravity;
        Ok(())
    }

    fn add_body(&mut self, desc: BodyDesc) -> EngineResult<BodyHandle> {
        self.ensure_live()?;
        desc.validate()?;
        if self.props.len() >= self.config.max_bodies {
            return Err(EngineError::CapacityExceeded {
                what: "bodies",
                limit: self.config.max_bodies,
            });
        }
        let handle = BodyHandle(self.props.len() as u32);
        self.props.push(BodyProps {
            kind: desc.kind,
            mass: desc.mass,
            label: desc.label,
            joint: None,
        });
        self.states.push(BodyState::at_rest(desc.position));
        Ok(handle)
    }

    fn add_joint(&mut self, body: BodyHandle, joint: Joint) -> EngineResult<JointHandle> {
        let index = self.body_index(body)?;
        joint.validate()?;
        if self.props[index].kind == BodyKind::Static {
            return Err(EngineError::InvalidArg {
                what: "joints attach dynamic bodies only",
            });
        }
        if self.props[index].joint.is_some() {
            return Err(EngineError::InvalidArg {
                what: "body already carries a joint",
            });
        }
        if self.joints.len() >= self.config.max_joints {
            return Err(EngineError::CapacityExceeded {
                what: "joints",
                limit: self.config.max_joints,
            });
        }
        let handle = JointHandle(self.joints.len() as u32);
        self.props[index].joint = Some(joint);
        self.joints.push(body.0);
        Ok(handle)
    }

    fn update_joint(&mut self, handle: JointHandle, joint: Joint) -> EngineResult<()> {
        self.ensure_live()?;
        joint.validate()?;
        let body = *self
            .joints
            .get(handle.0 as usize)
            .ok_or(EngineError::UnknownJoint { index: handle.0 })?;
        self.props[body as usize].joint = Some(joint);
        Ok(())
    }

    fn set_mass(&mut self, body: BodyHandle, mass: f64) -> EngineResult<()> {
        let index = self.body_index(body)?;
        if !(mass.is_finite() && mass > 0.0) {
            return Err(EngineError::InvalidArg {
                what: "mass must be positive",
            });
        }
        self.props[index].mass = mass;
        Ok(())
    }

    fn body_mass(&self, body: BodyHandle) -> EngineResult<f64> {
        let index = self.body_index(body)?;
        Ok(self.props[index].mass)
    }

    fn set_pose(&mut self, body: BodyHandle, state: BodyState) -> EngineResult<()> {
        let index = self.body_index(body)?;
        if !state.is_finite() {
            return Err(EngineError::InvalidArg {
                what: "pose must be finite",
            });
        }
        self.states[index] = state;
        Ok(())
    }

    fn body_state(&self, body: BodyHandle) -> EngineResult<BodyState> {
        let index = self.body_index(body)?;
        Ok(self.states[index])
    }

    fn step(&mut self, dt: f64) -> EngineResult<()> {
        self.ensure_live()?;
        if bl_core::ensure_finite(dt, "dt")? <= 0.0 {
            return Err(EngineError::InvalidArg {
                what: "dt must be positive",
            });
        }

        let mut model = WorldDynamics {
            gravity: self.gravity,
            bodies: &self.props,
        };
        let mut next = self
            .config
            .integrator
            .step(&mut model, self.time, &self.states, dt)?;

        for ((props, prev), state) in self.props.iter().zip(&self.states).zip(next.iter_mut()) {
            dynamics::project(self.gravity, props, prev, state);
        }

        // Keep the last good state on failure
        if let Some(bad) = next.iter().position(|s| !s.is_finite()) {
            let what = self.props[bad].label;
            warn!(body = what, t = self.time, "non-finite body state, step rejected");
            return Err(EngineError::NonFinite { what });
        }

        self.states = next;
        self.time += dt;
        Ok(())
    }

    fn time(&self) -> f64 {
        self.time
    }

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        debug!(
            bodies = self.props.len(),
            joints = self.joints.len(),
            "tearing down rigid world"
        );
        self.props.clear();
        self.states.clear();
        self.joints.clear();
        self.torn_down = true;
    }

    fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(WorldConfig::default()).unwrap()
    }

    #[test]
    fn free_fall_matches_closed_form() {
        let mut w = world();
        let b = w
            .add_body(BodyDesc::dynamic("ball", Vec2::new(0.0, 10.0), 1.0))
            .unwrap();
        for _ in 0..100 {
            w.step(0.01).unwrap();
        }
        let s = w.body_state(b).unwrap();
        let expected = 10.0 - 0.5 * G0_MPS2 * 1.0;
        assert!((s.position.y - expected).abs() < 1e-9);
        assert!((w.time() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn static_bodies_never_move() {
        let mut w = world();
        let anchor = w.add_body(BodyDesc::fixed("anchor", Vec2::new(1.0, 2.0))).unwrap();
        w.step(0.1).unwrap();
        assert_eq!(w.body_state(anchor).unwrap().position, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn capacity_limits_are_enforced() {
        let mut w = World::new(WorldConfig {
            max_bodies: 1,
            ..WorldConfig::default()
        })
        .unwrap();
        w.add_body(BodyDesc::fixed("a", Vec2::zeros())).unwrap();
        let err = w.add_body(BodyDesc::fixed("b", Vec2::zeros())).unwrap_err();
        assert!(matches!(err, EngineError::CapacityExceeded { what: "bodies", .. }));
    }

    #[test]
    fn teardown_is_idempotent_and_final() {
        let mut w = world();
        let b = w.add_body(BodyDesc::dynamic("ball", Vec2::zeros(), 1.0)).unwrap();
        w.teardown();
        w.teardown();
        assert!(w.is_torn_down());
        assert_eq!(w.body_count(), 0);
        assert_eq!(w.step(0.01), Err(EngineError::TornDown));
        assert_eq!(w.body_state(b), Err(EngineError::TornDown));
    }

    #[test]
    fn second_joint_on_same_body_rejected() {
        let mut w = world();
        let b = w.add_body(BodyDesc::dynamic("bob", Vec2::new(0.0, -1.0), 1.0)).unwrap();
        let rope = Joint::Distance {
            anchor: Vec2::zeros(),
            length: 1.0,
        };
        w.add_joint(b, rope).unwrap();
        assert!(w.add_joint(b, rope).is_err());
    }

    #[test]
    fn invalid_dt_rejected() {
        let mut w = world();
        assert!(w.step(0.0).is_err());
        assert!(w.step(f64::NAN).is_err());
    }

    #[test]
    fn closure_factory_can_fail() {
        let failing = |_: &WorldConfig| -> EngineResult<Box<dyn RigidWorld>> {
            Err(EngineError::CapacityExceeded {
                what: "worlds",
                limit: 0,
            })
        };
        assert!(failing.create(&WorldConfig::default()).is_err());
        assert!(DefaultWorldFactory.create(&WorldConfig::default()).is_ok());
    }
}
