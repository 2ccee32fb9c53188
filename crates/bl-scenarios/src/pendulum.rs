//! Simple pendulum: a bob on a rigid rope below a fixed anchor.

use std::f64::consts::TAU;

use bl_core::units::constants::G0_MPS2;
use bl_core::{deg_to_rad, swing_deg};
use bl_rigid::{
    BodyDesc, BodyHandle, BodyState, IntegratorType, Joint, JointHandle, RigidWorld, Vec2,
    WorldConfig, WorldFactory,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ScenarioError, ScenarioResult};
use crate::events::EventFlags;
use crate::geometry::{Bounds, NamedAngle, NamedPoint, Point, PoseSample, SceneGeometry};
use crate::params::{Field, ParameterEdit};
use crate::scenario::{DerivedQuantities, EngineStatus, RunState, Scenario, ScenarioKind};
use crate::timing::{FixedStepClock, StepOptions};

/// Bob radius (m), used for scene extent only.
pub const BOB_RADIUS_M: f64 = 0.1;
/// Bob mass (kg). The period does not depend on it.
pub const BOB_MASS_KG: f64 = 1.0;

fn anchor() -> Vec2 {
    Vec2::zeros()
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PendulumParams {
    /// Rope length (m)
    pub length: f64,
    /// Multiple of standard gravity
    pub gravity_scale: f64,
    /// Release angle from the downward vertical (deg, positive toward +x)
    pub release_angle: f64,
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self {
            length: 2.0,
            gravity_scale: 1.0,
            release_angle: 45.0,
        }
    }
}

impl PendulumParams {
    /// Set one field through its validating setter.
    pub fn with(mut self, field: Field, value: f64) -> ScenarioResult<Self> {
        let v = field.accept(value)?;
        match field {
            Field::Length => self.length = v,
            Field::GravityScale => self.gravity_scale = v,
            Field::ReleaseAngle => self.release_angle = v,
            other => {
                return Err(ParameterEdit::set(other, value).unsupported(ScenarioKind::Pendulum));
            }
        }
        Ok(self)
    }

    pub fn with_length(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::Length, value)
    }

    pub fn with_gravity_scale(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::GravityScale, value)
    }

    pub fn with_release_angle(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::ReleaseAngle, value)
    }

    pub fn gravity(&self) -> f64 {
        G0_MPS2 * self.gravity_scale
    }

    /// Small-angle period `2π√(L/g)` (s).
    pub fn period(&self) -> f64 {
        TAU * (self.length / self.gravity()).sqrt()
    }

    /// Bob position at release.
    pub fn start_position(&self) -> Vec2 {
        let a = deg_to_rad(self.release_angle);
        anchor() + self.length * Vec2::new(a.sin(), -a.cos())
    }

    fn values(&self) -> Vec<(Field, f64)> {
        vec![
            (Field::Length, self.length),
            (Field::GravityScale, self.gravity_scale),
            (Field::ReleaseAngle, self.release_angle),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PendulumDerived {
    pub length_m: f64,
    pub gravity_mps2: f64,
    pub period_s: f64,
    /// Current angle from the downward vertical (deg)
    pub swing_deg: f64,
    pub angular_velocity_rad_s: f64,
    pub speed_mps: f64,
}

/// Rigid-body world holding the anchor, the bob and the rope.
pub struct PendulumEngine {
    world: Box<dyn RigidWorld>,
    bob: BodyHandle,
    rope: JointHandle,
}

impl PendulumEngine {
    pub fn new(
        factory: &dyn WorldFactory,
        params: &PendulumParams,
        integrator: IntegratorType,
    ) -> ScenarioResult<Self> {
        let config = WorldConfig {
            gravity: Vec2::new(0.0, -params.gravity()),
            integrator,
            ..WorldConfig::default()
        };
        let mut world = factory.create(&config)?;
        match Self::populate(world.as_mut(), params) {
            Ok((bob, rope)) => Ok(Self { world, bob, rope }),
            Err(e) => {
                world.teardown();
                Err(e)
            }
        }
    }

    fn populate(
        world: &mut dyn RigidWorld,
        params: &PendulumParams,
    ) -> ScenarioResult<(BodyHandle, JointHandle)> {
        world.add_body(BodyDesc::fixed("anchor", anchor()))?;
        let bob = world.add_body(BodyDesc::dynamic(
            "bob",
            params.start_position(),
            BOB_MASS_KG,
        ))?;
        let rope = world.add_joint(
            bob,
            Joint::Distance {
                anchor: anchor(),
                length: params.length,
            },
        )?;
        Ok((bob, rope))
    }

    /// Push rope length and gravity into the live world.
    pub fn configure(&mut self, params: &PendulumParams) -> ScenarioResult<()> {
        self.world.set_gravity(Vec2::new(0.0, -params.gravity()))?;
        self.world.update_joint(
            self.rope,
            Joint::Distance {
                anchor: anchor(),
                length: params.length,
            },
        )?;
        Ok(())
    }

    /// Bob at the release angle, at rest.
    pub fn reset_pose(&mut self, params: &PendulumParams) -> ScenarioResult<()> {
        self.world
            .set_pose(self.bob, BodyState::at_rest(params.start_position()))?;
        Ok(())
    }

    pub fn step(&mut self, dt: f64) -> ScenarioResult<()> {
        self.world.step(dt)?;
        Ok(())
    }

    pub fn bob_state(&self) -> ScenarioResult<BodyState> {
        Ok(self.world.body_state(self.bob)?)
    }
}

impl Drop for PendulumEngine {
    fn drop(&mut self) {
        self.world.teardown();
    }
}

pub struct Pendulum {
    params: PendulumParams,
    engine: Option<PendulumEngine>,
    status: EngineStatus,
    run_state: RunState,
    clock: FixedStepClock,
    /// Last known good bob state.
    bob: BodyState,
}

impl Pendulum {
    pub fn new(factory: &dyn WorldFactory, step: StepOptions) -> Self {
        Self::with_params(factory, step, PendulumParams::default())
    }

    pub fn with_params(
        factory: &dyn WorldFactory,
        step: StepOptions,
        params: PendulumParams,
    ) -> Self {
        let (engine, status) = match PendulumEngine::new(factory, &params, step.integrator) {
            Ok(engine) => (Some(engine), EngineStatus::Ready),
            Err(e) => {
                warn!(error = %e, "pendulum world unavailable");
                let message = e.to_string();
                (None, EngineStatus::Unavailable { message })
            }
        };
        Self {
            bob: BodyState::at_rest(params.start_position()),
            params,
            engine,
            status,
            run_state: RunState::Stopped,
            clock: FixedStepClock::new(step),
        }
    }

    pub fn params(&self) -> &PendulumParams {
        &self.params
    }

    /// Configure the engine and put the bob at its start pose.
    fn resync(&mut self) -> ScenarioResult<()> {
        self.clock.reset();
        self.bob = BodyState::at_rest(self.params.start_position());
        let Some(engine) = self.engine.as_mut() else {
            return Ok(());
        };
        let synced = engine
            .configure(&self.params)
            .and_then(|()| engine.reset_pose(&self.params));
        match synced {
            Ok(()) => {
                self.status = EngineStatus::Ready;
                Ok(())
            }
            Err(e) => {
                self.fault(&e);
                Err(e)
            }
        }
    }

    fn fault(&mut self, e: &ScenarioError) {
        warn!(error = %e, "pendulum engine fault, stopping");
        self.run_state = RunState::Stopped;
        self.status = EngineStatus::Faulted {
            message: e.to_string(),
        };
    }

    fn unavailable(&self) -> Option<ScenarioError> {
        match &self.status {
            EngineStatus::Unavailable { message } => Some(ScenarioError::EngineUnavailable {
                message: message.clone(),
            }),
            _ => None,
        }
    }

    fn arm(&self) -> Vec2 {
        self.bob.position - anchor()
    }
}

impl Scenario for Pendulum {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Pendulum
    }

    fn run_state(&self) -> RunState {
        self.run_state
    }

    fn set_running(&mut self, running: bool) -> ScenarioResult<()> {
        if running == self.run_state.is_running() {
            return Ok(());
        }
        if running {
            if let Some(e) = self.unavailable() {
                return Err(e);
            }
            self.resync()?;
            self.run_state = RunState::Running;
        } else {
            self.run_state = RunState::Stopped;
            self.resync()?;
        }
        info!(scenario = "pendulum", running, "run state changed");
        Ok(())
    }

    fn apply_edit(&mut self, edit: &ParameterEdit) -> ScenarioResult<()> {
        match *edit {
            ParameterEdit::Set { field, value } => {
                self.params = self.params.with(field, value)?;
                self.resync()
            }
            _ => Err(edit.unsupported(ScenarioKind::Pendulum)),
        }
    }

    fn advance(&mut self, elapsed: f64) -> ScenarioResult<()> {
        if !self.run_state.is_running() {
            return Ok(());
        }
        let steps = self.clock.take_steps(elapsed);
        let dt = self.clock.options.dt;
        let Some(engine) = self.engine.as_mut() else {
            return Ok(());
        };
        let mut outcome = Ok(());
        for _ in 0..steps {
            match engine.step(dt).and_then(|()| engine.bob_state()) {
                Ok(state) => self.bob = state,
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }
        if let Err(e) = &outcome {
            self.fault(e);
        }
        outcome
    }

    fn sample_pose(&self) -> PoseSample {
        let arm = self.arm();
        PoseSample {
            points: vec![
                NamedPoint::new("anchor", anchor().into()),
                NamedPoint::new("bob", self.bob.position.into()),
            ],
            angles: vec![NamedAngle {
                name: "swing",
                degrees: swing_deg(arm.x, arm.y),
            }],
        }
    }

    fn geometry(&self) -> SceneGeometry {
        let reach = self.params.length + BOB_RADIUS_M;
        SceneGeometry {
            bounds: Bounds::centered(anchor().into(), reach),
            reference_length_m: self.params.length,
            anchors: vec![NamedPoint::new("anchor", Point::ORIGIN)],
        }
    }

    fn derived(&self) -> DerivedQuantities {
        let arm = self.arm();
        let r2 = arm.norm_squared();
        let v = self.bob.velocity;
        // ω = (r × v) / |r|²
        let omega = if r2 > 1e-12 {
            (arm.x * v.y - arm.y * v.x) / r2
        } else {
            0.0
        };
        DerivedQuantities::Pendulum(PendulumDerived {
            length_m: self.params.length,
            gravity_mps2: self.params.gravity(),
            period_s: self.params.period(),
            swing_deg: swing_deg(arm.x, arm.y),
            angular_velocity_rad_s: omega,
            speed_mps: v.norm(),
        })
    }

    fn events(&self) -> EventFlags {
        EventFlags::default()
    }

    fn status(&self) -> EngineStatus {
        self.status.clone()
    }

    fn values(&self) -> Vec<(Field, f64)> {
        self.params.values()
    }

    fn reset(&mut self) -> ScenarioResult<()> {
        debug!("pendulum reset to defaults");
        self.run_state = RunState::Stopped;
        self.params = PendulumParams::default();
        self.resync()
    }
}
