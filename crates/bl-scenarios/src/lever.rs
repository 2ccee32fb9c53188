//! First-class lever: two masses balanced on a beam around a central pivot.

use bl_core::units::constants::weight;
use bl_core::units::{as_newtons, kg};
use bl_core::{Tolerances, deg_to_rad, nearly_equal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ScenarioResult;
use crate::events::EventFlags;
use crate::geometry::{Bounds, NamedAngle, NamedPoint, Point, PoseSample, SceneGeometry};
use crate::params::{Field, ParameterEdit};
use crate::scenario::{DerivedQuantities, EngineStatus, RunState, Scenario, ScenarioKind};

/// Beam half-length (m).
pub const HALF_BEAM_M: f64 = 3.0;
/// Largest tilt shown for a fully one-sided load (deg).
pub const MAX_TILT_DEG: f64 = 20.0;

const BALANCE_TOL: Tolerances = Tolerances {
    abs: 1e-9,
    rel: 1e-6,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeverParams {
    pub mass_left: f64,
    pub mass_right: f64,
    pub distance_left: f64,
    pub distance_right: f64,
}

impl Default for LeverParams {
    fn default() -> Self {
        Self {
            mass_left: 2.0,
            mass_right: 1.0,
            distance_left: 1.0,
            distance_right: 2.0,
        }
    }
}

impl LeverParams {
    pub fn with(mut self, field: Field, value: f64) -> ScenarioResult<Self> {
        let v = field.accept(value)?;
        match field {
            Field::MassLeft => self.mass_left = v,
            Field::MassRight => self.mass_right = v,
            Field::DistanceLeft => self.distance_left = v,
            Field::DistanceRight => self.distance_right = v,
            other => {
                return Err(ParameterEdit::set(other, value).unsupported(ScenarioKind::Lever));
            }
        }
        Ok(self)
    }

    pub fn with_mass_left(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::MassLeft, value)
    }

    pub fn with_mass_right(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::MassRight, value)
    }

    pub fn with_distance_left(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::DistanceLeft, value)
    }

    pub fn with_distance_right(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::DistanceRight, value)
    }

    /// `(left, right)` moments about the pivot (N·m).
    pub fn moments(&self) -> (f64, f64) {
        let left = as_newtons(weight(kg(self.mass_left))) * self.distance_left;
        let right = as_newtons(weight(kg(self.mass_right))) * self.distance_right;
        (left, right)
    }

    pub fn is_balanced(&self) -> bool {
        let (l, r) = self.moments();
        nearly_equal(l, r, BALANCE_TOL)
    }

    /// Resting tilt (deg), positive clockwise (right side down).
    ///
    /// Proportional to the normalized imbalance, so it never exceeds
    /// `MAX_TILT_DEG` in magnitude.
    pub fn tilt(&self) -> f64 {
        let (l, r) = self.moments();
        let total = l + r;
        if self.is_balanced() || total <= 0.0 {
            return 0.0;
        }
        MAX_TILT_DEG * (r - l) / total
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LeverDerived {
    pub moment_left_nm: f64,
    pub moment_right_nm: f64,
    /// Right minus left (N·m)
    pub imbalance_nm: f64,
    pub equilibrium: bool,
    /// Displayed tilt (deg); zero while stopped
    pub tilt_deg: f64,
}

pub struct Lever {
    params: LeverParams,
    run_state: RunState,
}

impl Default for Lever {
    fn default() -> Self {
        Self::new()
    }
}

impl Lever {
    pub fn new() -> Self {
        Self::with_params(LeverParams::default())
    }

    pub fn with_params(params: LeverParams) -> Self {
        Self {
            params,
            run_state: RunState::Stopped,
        }
    }

    pub fn params(&self) -> &LeverParams {
        &self.params
    }

    fn shown_tilt(&self) -> f64 {
        if self.run_state.is_running() {
            self.params.tilt()
        } else {
            0.0
        }
    }

    /// Point on the beam at signed distance `along` from the pivot (right positive).
    fn on_beam(along: f64, tilt_deg: f64) -> Point {
        let t = deg_to_rad(tilt_deg);
        Point::new(along * t.cos(), -along * t.sin())
    }
}

impl Scenario for Lever {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Lever
    }

    fn run_state(&self) -> RunState {
        self.run_state
    }

    fn set_running(&mut self, running: bool) -> ScenarioResult<()> {
        if running != self.run_state.is_running() {
            self.run_state = if running {
                RunState::Running
            } else {
                RunState::Stopped
            };
            info!(scenario = "lever", running, "run state changed");
        }
        Ok(())
    }

    fn apply_edit(&mut self, edit: &ParameterEdit) -> ScenarioResult<()> {
        match *edit {
            ParameterEdit::Set { field, value } => {
                self.params = self.params.with(field, value)?;
                Ok(())
            }
            _ => Err(edit.unsupported(ScenarioKind::Lever)),
        }
    }

    fn advance(&mut self, _elapsed: f64) -> ScenarioResult<()> {
        Ok(())
    }

    fn sample_pose(&self) -> PoseSample {
        let tilt = self.shown_tilt();
        let p = &self.params;
        PoseSample {
            points: vec![
                NamedPoint::new("pivot", Point::ORIGIN),
                NamedPoint::new("beam_left", Self::on_beam(-HALF_BEAM_M, tilt)),
                NamedPoint::new("beam_right", Self::on_beam(HALF_BEAM_M, tilt)),
                NamedPoint::new("mass_left", Self::on_beam(-p.distance_left, tilt)),
                NamedPoint::new("mass_right", Self::on_beam(p.distance_right, tilt)),
            ],
            angles: vec![NamedAngle {
                name: "tilt",
                degrees: tilt,
            }],
        }
    }

    fn geometry(&self) -> SceneGeometry {
        // beam ends sweep at most MAX_TILT_DEG; hanging masses add a little below
        let drop = HALF_BEAM_M * deg_to_rad(MAX_TILT_DEG).sin();
        let bounds = Bounds {
            min: Point::new(-HALF_BEAM_M, -drop - 0.5),
            max: Point::new(HALF_BEAM_M, drop + 0.5),
        }
        .padded(0.2);
        SceneGeometry {
            bounds,
            reference_length_m: 2.0 * HALF_BEAM_M,
            anchors: vec![NamedPoint::new("pivot", Point::ORIGIN)],
        }
    }

    fn derived(&self) -> DerivedQuantities {
        let (l, r) = self.params.moments();
        DerivedQuantities::Lever(LeverDerived {
            moment_left_nm: l,
            moment_right_nm: r,
            imbalance_nm: r - l,
            equilibrium: self.params.is_balanced(),
            tilt_deg: self.shown_tilt(),
        })
    }

    fn events(&self) -> EventFlags {
        EventFlags {
            equilibrium: self.run_state.is_running() && self.params.is_balanced(),
            ..EventFlags::default()
        }
    }

    fn status(&self) -> EngineStatus {
        EngineStatus::Ready
    }

    fn values(&self) -> Vec<(Field, f64)> {
        let p = &self.params;
        vec![
            (Field::MassLeft, p.mass_left),
            (Field::MassRight, p.mass_right),
            (Field::DistanceLeft, p.distance_left),
            (Field::DistanceRight, p.distance_right),
        ]
    }

    fn reset(&mut self) -> ScenarioResult<()> {
        debug!("lever reset to defaults");
        self.run_state = RunState::Stopped;
        self.params = LeverParams::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lever_balances() {
        // 2 kg at 1 m vs 1 kg at 2 m
        let p = LeverParams::default();
        assert!(p.is_balanced());
        assert_eq!(p.tilt(), 0.0);
        let (l, r) = p.moments();
        assert!((l - 2.0 * 9.81).abs() < 1e-12);
        assert!((r - l).abs() < 1e-12);
    }

    #[test]
    fn heavier_side_goes_down() {
        let right_heavy = LeverParams::default().with_mass_right(3.0).unwrap();
        assert!(right_heavy.tilt() > 0.0);
        let left_heavy = LeverParams::default().with_distance_left(3.0).unwrap();
        assert!(left_heavy.tilt() < 0.0);
    }

    #[test]
    fn one_sided_load_hits_max_tilt() {
        let p = LeverParams::default().with_distance_left(0.0).unwrap();
        assert!((p.tilt() - MAX_TILT_DEG).abs() < 1e-12);
    }

    #[test]
    fn empty_arms_are_balanced() {
        let p = LeverParams::default()
            .with_distance_left(0.0)
            .unwrap()
            .with_distance_right(0.0)
            .unwrap();
        assert!(p.is_balanced());
        assert_eq!(p.tilt(), 0.0);
    }

    #[test]
    fn rotation_and_equilibrium_shown_only_while_running() {
        let mut lever = Lever::with_params(LeverParams::default().with_mass_right(4.0).unwrap());
        assert_eq!(lever.sample_pose().angle("tilt"), Some(0.0));
        lever.set_running(true).unwrap();
        assert!(lever.sample_pose().angle("tilt").unwrap() > 0.0);
        let right = lever.sample_pose().point("beam_right").unwrap();
        assert!(right.y < 0.0);

        let mut balanced = Lever::new();
        assert!(!balanced.events().equilibrium);
        balanced.set_running(true).unwrap();
        assert!(balanced.events().equilibrium);
    }

    #[test]
    fn beam_stays_inside_geometry() {
        let mut lever = Lever::with_params(LeverParams::default().with_distance_left(0.0).unwrap());
        lever.set_running(true).unwrap();
        let bounds = lever.geometry().bounds;
        for p in lever.sample_pose().points {
            assert!(bounds.contains(p.at), "{} outside", p.name);
        }
    }
}
