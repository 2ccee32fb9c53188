//! Inclined plane: a block sliding down a hinged plane with Coulomb friction.
//!
//! The plane pivots around a hinge at the origin and extends `PLANE_LENGTH_M`
//! along the incline angle. The block starts at the upper end and slides toward
//! the lower one when `|tan θ| > μ`.

use bl_core::units::constants::{G0_MPS2, weight};
use bl_core::units::{as_newtons, kg};
use bl_core::{deg_to_rad, heading_deg, wrap_deg_unsigned};
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

/// Plane length (m).
pub const PLANE_LENGTH_M: f64 = 4.0;
/// Block edge length (m), used for scene extent only.
pub const BLOCK_SIZE_M: f64 = 0.4;

/// `tan` in degrees with exact zeros and poles.
///
/// Multiples of 180° give exactly 0 and odd multiples of 90° give ±∞, so the
/// feasibility predicate does not depend on rounding of `to_radians`.
fn tan_deg(deg: f64) -> f64 {
    let w = wrap_deg_unsigned(deg);
    if w == 0.0 || w == 180.0 {
        0.0
    } else if w == 90.0 {
        f64::INFINITY
    } else if w == 270.0 {
        f64::NEG_INFINITY
    } else {
        deg_to_rad(w).tan()
    }
}

/// Whether a block on a plane at `angle_deg` with friction `friction` slides.
pub fn can_slide(angle_deg: f64, friction: f64) -> bool {
    tan_deg(angle_deg).abs() > friction
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InclineParams {
    /// Incline angle (deg, [0, 360))
    pub incline_angle: f64,
    /// Coulomb friction coefficient
    pub friction: f64,
    /// Block mass (kg)
    pub mass: f64,
}

impl Default for InclineParams {
    fn default() -> Self {
        Self {
            incline_angle: 30.0,
            friction: 0.2,
            mass: 1.0,
        }
    }
}

impl InclineParams {
    pub fn with(mut self, field: Field, value: f64) -> ScenarioResult<Self> {
        let v = field.accept(value)?;
        match field {
            Field::InclineAngle => self.incline_angle = v,
            Field::Friction => self.friction = v,
            Field::Mass => self.mass = v,
            other => {
                return Err(
                    ParameterEdit::set(other, value).unsupported(ScenarioKind::InclinedPlane)
                );
            }
        }
        Ok(self)
    }

    pub fn with_incline_angle(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::InclineAngle, value)
    }

    pub fn with_friction(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::Friction, value)
    }

    pub fn with_mass(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::Mass, value)
    }

    pub fn is_feasible(&self) -> bool {
        can_slide(self.incline_angle, self.friction)
    }

    /// Unit vector from the hinge along the plane.
    fn direction(&self) -> Vec2 {
        let a = deg_to_rad(self.incline_angle);
        Vec2::new(a.cos(), a.sin())
    }

    fn upper_end_is_far(&self) -> bool {
        deg_to_rad(self.incline_angle).sin() >= 0.0
    }

    pub fn hinge(&self) -> Vec2 {
        Vec2::zeros()
    }

    pub fn plane_end(&self) -> Vec2 {
        self.hinge() + PLANE_LENGTH_M * self.direction()
    }

    /// Upper end of the plane, where the block is released.
    pub fn start(&self) -> Vec2 {
        if self.upper_end_is_far() {
            self.plane_end()
        } else {
            self.hinge()
        }
    }

    /// Unit vector pointing down the plane.
    pub fn downhill(&self) -> Vec2 {
        if self.upper_end_is_far() {
            -self.direction()
        } else {
            self.direction()
        }
    }

    /// `g(|sin θ| − μ|cos θ|)` when sliding, else 0 (m/s²).
    pub fn theoretical_acceleration(&self) -> f64 {
        if !self.is_feasible() {
            return 0.0;
        }
        let a = deg_to_rad(self.incline_angle);
        (G0_MPS2 * (a.sin().abs() - self.friction * a.cos().abs())).max(0.0)
    }

    fn track(&self) -> ScenarioResult<Joint> {
        Ok(Joint::track(self.start(), self.downhill(), self.friction)?)
    }

    fn values(&self) -> Vec<(Field, f64)> {
        vec![
            (Field::InclineAngle, self.incline_angle),
            (Field::Friction, self.friction),
            (Field::Mass, self.mass),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct InclineDerived {
    pub angle_deg: f64,
    pub can_slide: bool,
    /// Velocity along the plane, positive downhill (m/s)
    pub velocity_mps: f64,
    pub acceleration_mps2: f64,
    /// Distance from the release point, positive downhill (m)
    pub travelled_m: f64,
    pub normal_force_n: f64,
    /// Kinetic friction while sliding, holding friction otherwise (N)
    pub friction_force_n: f64,
    pub auto_resets: u32,
}

/// Rigid-body world holding the plane and the block on its friction track.
pub struct InclineEngine {
    world: Box<dyn RigidWorld>,
    block: BodyHandle,
    track: JointHandle,
    feasible: bool,
}

impl InclineEngine {
    pub fn new(
        factory: &dyn WorldFactory,
        params: &InclineParams,
        integrator: IntegratorType,
    ) -> ScenarioResult<Self> {
        let config = WorldConfig {
            integrator,
            ..WorldConfig::default()
        };
        let mut world = factory.create(&config)?;
        match Self::populate(world.as_mut(), params) {
            Ok((block, track)) => Ok(Self {
                world,
                block,
                track,
                feasible: params.is_feasible(),
            }),
            Err(e) => {
                world.teardown();
                Err(e)
            }
        }
    }

    fn populate(
        world: &mut dyn RigidWorld,
        params: &InclineParams,
    ) -> ScenarioResult<(BodyHandle, JointHandle)> {
        world.add_body(BodyDesc::fixed("plane", params.hinge()))?;
        let block = world.add_body(BodyDesc::dynamic("block", params.start(), params.mass))?;
        let track = world.add_joint(block, params.track()?)?;
        Ok((block, track))
    }

    /// Push angle, friction and mass into the live world.
    pub fn configure(&mut self, params: &InclineParams) -> ScenarioResult<()> {
        self.world.set_mass(self.block, params.mass)?;
        self.world.update_joint(self.track, params.track()?)?;
        self.feasible = params.is_feasible();
        Ok(())
    }

    /// Block at the upper end, at rest.
    pub fn reset_pose(&mut self, params: &InclineParams) -> ScenarioResult<()> {
        self.world
            .set_pose(self.block, BodyState::at_rest(params.start()))?;
        Ok(())
    }

    pub fn is_feasible(&self) -> bool {
        self.feasible
    }

    /// Advance one substep. Refused (velocity frozen) when the block cannot slide.
    pub fn step(&mut self, dt: f64) -> ScenarioResult<bool> {
        if !self.feasible {
            let held = self.world.body_state(self.block)?;
            self.world
                .set_pose(self.block, BodyState::at_rest(held.position))?;
            return Ok(false);
        }
        self.world.step(dt)?;
        Ok(true)
    }

    pub fn block_state(&self) -> ScenarioResult<BodyState> {
        Ok(self.world.body_state(self.block)?)
    }
}

impl Drop for InclineEngine {
    fn drop(&mut self) {
        self.world.teardown();
    }
}

pub struct InclinedPlane {
    params: InclineParams,
    engine: Option<InclineEngine>,
    status: EngineStatus,
    run_state: RunState,
    clock: FixedStepClock,
    block: BodyState,
    auto_resets: u32,
}

impl InclinedPlane {
    pub fn new(factory: &dyn WorldFactory, step: StepOptions) -> Self {
        Self::with_params(factory, step, InclineParams::default())
    }

    pub fn with_params(
        factory: &dyn WorldFactory,
        step: StepOptions,
        params: InclineParams,
    ) -> Self {
        let (engine, status) = match InclineEngine::new(factory, &params, step.integrator) {
            Ok(engine) => (Some(engine), EngineStatus::Ready),
            Err(e) => {
                warn!(error = %e, "inclined plane world unavailable");
                let message = e.to_string();
                (None, EngineStatus::Unavailable { message })
            }
        };
        Self {
            block: BodyState::at_rest(params.start()),
            params,
            engine,
            status,
            run_state: RunState::Stopped,
            clock: FixedStepClock::new(step),
            auto_resets: 0,
        }
    }

    pub fn params(&self) -> &InclineParams {
        &self.params
    }

    pub fn travelled(&self) -> f64 {
        (self.block.position - self.params.start()).dot(&self.params.downhill())
    }

    /// Put the block back at the top of the plane without touching parameters.
    pub fn reset_position(&mut self) -> ScenarioResult<()> {
        self.clock.reset();
        self.block = BodyState::at_rest(self.params.start());
        if let Some(engine) = self.engine.as_mut() {
            if let Err(e) = engine.reset_pose(&self.params) {
                self.fault(&e);
                return Err(e);
            }
        }
        Ok(())
    }

    fn resync(&mut self) -> ScenarioResult<()> {
        self.clock.reset();
        self.block = BodyState::at_rest(self.params.start());
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
        warn!(error = %e, "inclined plane engine fault, stopping");
        self.run_state = RunState::Stopped;
        self.status = EngineStatus::Faulted {
            message: e.to_string(),
        };
    }

    /// One substep followed by the runaway check.
    fn substep(&mut self, dt: f64) -> ScenarioResult<()> {
        let Some(engine) = self.engine.as_mut() else {
            return Ok(());
        };
        if !engine.step(dt)? {
            return Ok(());
        }
        self.block = engine.block_state()?;
        let travelled = (self.block.position - self.params.start()).dot(&self.params.downhill());
        if travelled > PLANE_LENGTH_M {
            engine.reset_pose(&self.params)?;
            self.block = BodyState::at_rest(self.params.start());
            self.auto_resets = self.auto_resets.saturating_add(1);
            debug!(resets = self.auto_resets, "block left the plane, auto-reset");
        }
        Ok(())
    }

    /// Angle recovered from the hinge-to-block vector, or the parameter when
    /// the block sits on the hinge.
    fn sampled_angle(&self) -> f64 {
        let arm = self.block.position - self.params.hinge();
        if arm.norm() > 1e-9 {
            heading_deg(arm.x, arm.y)
        } else {
            self.params.incline_angle
        }
    }
}

impl Scenario for InclinedPlane {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::InclinedPlane
    }

    fn run_state(&self) -> RunState {
        self.run_state
    }

    fn set_running(&mut self, running: bool) -> ScenarioResult<()> {
        if running == self.run_state.is_running() {
            return Ok(());
        }
        if running {
            if let EngineStatus::Unavailable { message } = &self.status {
                return Err(ScenarioError::EngineUnavailable {
                    message: message.clone(),
                });
            }
            self.resync()?;
            self.run_state = RunState::Running;
        } else {
            self.run_state = RunState::Stopped;
            self.resync()?;
        }
        info!(scenario = "inclined_plane", running, "run state changed");
        Ok(())
    }

    fn apply_edit(&mut self, edit: &ParameterEdit) -> ScenarioResult<()> {
        match *edit {
            ParameterEdit::Set { field, value } => {
                self.params = self.params.with(field, value)?;
                self.resync()
            }
            _ => Err(edit.unsupported(ScenarioKind::InclinedPlane)),
        }
    }

    fn advance(&mut self, elapsed: f64) -> ScenarioResult<()> {
        if !self.run_state.is_running() {
            return Ok(());
        }
        let steps = self.clock.take_steps(elapsed);
        let dt = self.clock.options.dt;
        for _ in 0..steps {
            if let Err(e) = self.substep(dt) {
                self.fault(&e);
                return Err(e);
            }
        }
        Ok(())
    }

    fn sample_pose(&self) -> PoseSample {
        PoseSample {
            points: vec![
                NamedPoint::new("hinge", self.params.hinge().into()),
                NamedPoint::new("plane_end", self.params.plane_end().into()),
                NamedPoint::new("block", self.block.position.into()),
            ],
            angles: vec![NamedAngle {
                name: "incline",
                degrees: self.sampled_angle(),
            }],
        }
    }

    fn geometry(&self) -> SceneGeometry {
        // The plane sweeps a full circle as the angle changes; fit that so the
        // view does not jump on every edit.
        let bounds = Bounds::centered(Point::ORIGIN, PLANE_LENGTH_M).padded(BLOCK_SIZE_M);
        SceneGeometry {
            bounds,
            reference_length_m: PLANE_LENGTH_M,
            anchors: vec![
                NamedPoint::new("hinge", self.params.hinge().into()),
                NamedPoint::new("plane_end", self.params.plane_end().into()),
            ],
        }
    }

    fn derived(&self) -> DerivedQuantities {
        let p = &self.params;
        let a = deg_to_rad(p.incline_angle);
        let w = as_newtons(weight(kg(p.mass)));
        let normal = w * a.cos().abs();
        let sliding = p.is_feasible();
        let friction_force = if sliding {
            p.friction * normal
        } else {
            w * a.sin().abs()
        };
        DerivedQuantities::InclinedPlane(InclineDerived {
            angle_deg: p.incline_angle,
            can_slide: sliding,
            velocity_mps: self.block.velocity.dot(&p.downhill()),
            acceleration_mps2: p.theoretical_acceleration(),
            travelled_m: self.travelled(),
            normal_force_n: normal,
            friction_force_n: friction_force,
            auto_resets: self.auto_resets,
        })
    }

    fn events(&self) -> EventFlags {
        EventFlags {
            can_slide: self.params.is_feasible(),
            ..EventFlags::default()
        }
    }

    fn status(&self) -> EngineStatus {
        self.status.clone()
    }

    fn values(&self) -> Vec<(Field, f64)> {
        self.params.values()
    }

    fn reset(&mut self) -> ScenarioResult<()> {
        debug!("inclined plane reset to defaults");
        self.run_state = RunState::Stopped;
        self.params = InclineParams::default();
        self.auto_resets = 0;
        self.resync()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bl_rigid::DefaultWorldFactory;

    fn plane(params: InclineParams) -> InclinedPlane {
        InclinedPlane::with_params(&DefaultWorldFactory, StepOptions::default(), params)
    }

    fn derived(p: &InclinedPlane) -> InclineDerived {
        match p.derived() {
            DerivedQuantities::InclinedPlane(d) => d,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cardinal_angles() {
        for mu in [0.01, 0.2, 1.0] {
            assert!(!can_slide(0.0, mu));
            assert!(!can_slide(180.0, mu));
            assert!(can_slide(90.0, mu));
            assert!(can_slide(270.0, mu));
        }
        // frictionless flat plane still holds
        assert!(!can_slide(0.0, 0.0));
        assert!(!can_slide(360.0, 0.0));
    }

    #[test]
    fn boundary_at_friction_angle() {
        let mu = 0.5f64;
        let critical = mu.atan().to_degrees();
        assert!(!can_slide(critical - 1e-6, mu));
        assert!(can_slide(critical + 1e-6, mu));
        assert!(can_slide(45.0, 0.99));
        assert!(!can_slide(45.0, 1.0));
    }

    #[test]
    fn start_is_upper_end() {
        let p = InclineParams::default();
        assert!(p.start().y > p.hinge().y);
        let p = p.with_incline_angle(210.0).unwrap();
        assert_eq!(p.start(), p.hinge());
        assert!(p.plane_end().y < 0.0);
        assert!(p.downhill().y < 0.0);
    }

    #[test]
    fn block_slides_downhill() {
        let mut p = plane(InclineParams::default());
        p.set_running(true).unwrap();
        for _ in 0..30 {
            p.advance(1.0 / 60.0).unwrap();
        }
        let d = derived(&p);
        assert!(d.can_slide);
        assert!(d.velocity_mps > 0.0);
        assert!(d.travelled_m > 0.0);
        let expected = 9.81 * (0.5 - 0.2 * 3f64.sqrt() / 2.0);
        assert!((d.acceleration_mps2 - expected).abs() < 1e-9);
    }

    #[test]
    fn infeasible_block_stays_put() {
        let params = InclineParams::default().with_friction(0.9).unwrap();
        let mut p = plane(params);
        let start = p.sample_pose().point("block").unwrap();
        p.set_running(true).unwrap();
        for _ in 0..60 {
            p.advance(1.0 / 60.0).unwrap();
        }
        assert_eq!(p.sample_pose().point("block").unwrap(), start);
        let d = derived(&p);
        assert_eq!(d.velocity_mps, 0.0);
        assert_eq!(d.acceleration_mps2, 0.0);
        assert!(!p.events().can_slide);
    }

    #[test]
    fn runaway_block_auto_resets() {
        let params = InclineParams::default()
            .with_incline_angle(90.0)
            .unwrap()
            .with_friction(0.0)
            .unwrap();
        let mut p = plane(params);
        p.set_running(true).unwrap();
        // free fall over 4 m takes ~0.9 s
        for _ in 0..120 {
            p.advance(1.0 / 60.0).unwrap();
        }
        let d = derived(&p);
        assert!(d.auto_resets >= 1);
        assert!(d.travelled_m <= PLANE_LENGTH_M);
    }

    #[test]
    fn sampled_angle_tracks_parameter() {
        for angle in [10.0, 30.0, 135.0, 200.0, 300.0] {
            let p = plane(InclineParams::default().with_incline_angle(angle).unwrap());
            let sampled = p.sample_pose().angle("incline").unwrap();
            assert!((sampled - angle).abs() < 1e-9, "{angle} vs {sampled}");
        }
    }

    #[test]
    fn reset_position_keeps_parameters() {
        let params = InclineParams::default().with_friction(0.1).unwrap();
        let mut p = plane(params);
        p.set_running(true).unwrap();
        p.advance(0.05).unwrap();
        p.reset_position().unwrap();
        assert_eq!(p.params().friction, 0.1);
        assert!(p.travelled().abs() < 1e-12);
    }

    #[test]
    fn held_block_friction_balances_gravity() {
        let params = InclineParams::default()
            .with_friction(1.0)
            .unwrap()
            .with_mass(2.0)
            .unwrap();
        let p = plane(params);
        let d = derived(&p);
        assert!((d.friction_force_n - 2.0 * 9.81 * 0.5).abs() < 1e-9);
    }
}
