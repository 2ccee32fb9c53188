//! Reflection and refraction of a light ray at the interface between two media.
//!
//! The interface lies on the x axis with the incident medium above it. Angles
//! are measured from the normal (the y axis).

use bl_core::{deg_to_rad, rad_to_deg};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ScenarioResult;
use crate::events::EventFlags;
use crate::geometry::{Bounds, NamedAngle, NamedPoint, Point, PoseSample, SceneGeometry};
use crate::params::{Field, ParameterEdit};
use crate::scenario::{DerivedQuantities, EngineStatus, RunState, Scenario, ScenarioKind};

/// Drawn ray length (m).
const RAY_LENGTH_M: f64 = 1.0;

/// Refraction angle (deg) from Snell's law, `None` under total internal
/// reflection or for a non-physical index.
pub fn snell(n1: f64, n2: f64, incidence_deg: f64) -> Option<f64> {
    let s = refracted_sine(n1, n2, incidence_deg)?;
    if s.abs() > 1.0 {
        return None;
    }
    Some(rad_to_deg(s.asin()))
}

/// `sin θ2 = (n1/n2)·sin θ1`, `None` when `n2` is not positive.
fn refracted_sine(n1: f64, n2: f64, incidence_deg: f64) -> Option<f64> {
    if !(n2 > 0.0) {
        return None;
    }
    Some(n1 / n2 * deg_to_rad(incidence_deg).sin())
}

/// Critical angle (deg); only defined going into a less dense medium.
pub fn critical_angle_deg(n1: f64, n2: f64) -> Option<f64> {
    if n1 > n2 && n2 > 0.0 {
        Some(rad_to_deg((n2 / n1).asin()))
    } else {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Air,
    Water,
    Glass,
    Plexiglass,
    Diamond,
}

impl Material {
    pub const ALL: [Material; 5] = [
        Material::Air,
        Material::Water,
        Material::Glass,
        Material::Plexiglass,
        Material::Diamond,
    ];

    pub fn refractive_index(self) -> f64 {
        match self {
            Material::Air => 1.00,
            Material::Water => 1.33,
            Material::Glass => 1.50,
            Material::Plexiglass => 1.49,
            Material::Diamond => 2.42,
        }
    }
}

/// Which medium a preset applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediumSide {
    /// Medium the ray comes from (`n1`)
    Incident,
    /// Medium the ray enters (`n2`)
    Transmitted,
}

impl MediumSide {
    fn field(self) -> Field {
        match self {
            MediumSide::Incident => Field::N1,
            MediumSide::Transmitted => Field::N2,
        }
    }
}

/// Shape of the interface. Rendering only; the physics uses the local normal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    #[default]
    Plane,
    Concave,
    Convex,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RayMode {
    Reflection,
    Refraction,
    #[default]
    Both,
}

/// Colour band of visible light.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectralBand {
    Violet,
    Blue,
    Green,
    Yellow,
    Orange,
    Red,
}

impl SpectralBand {
    pub fn from_wavelength_nm(nm: f64) -> Self {
        if nm < 450.0 {
            SpectralBand::Violet
        } else if nm < 500.0 {
            SpectralBand::Blue
        } else if nm < 570.0 {
            SpectralBand::Green
        } else if nm < 590.0 {
            SpectralBand::Yellow
        } else if nm < 620.0 {
            SpectralBand::Orange
        } else {
            SpectralBand::Red
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpticsParams {
    /// Angle of incidence from the normal (deg)
    pub incidence_angle: f64,
    pub n1: f64,
    pub n2: f64,
    /// Wavelength (nm)
    pub wavelength: f64,
    pub surface: SurfaceKind,
    pub ray_mode: RayMode,
}

impl Default for OpticsParams {
    fn default() -> Self {
        Self {
            incidence_angle: 30.0,
            n1: 1.0,
            n2: 1.5,
            wavelength: 550.0,
            surface: SurfaceKind::Plane,
            ray_mode: RayMode::Both,
        }
    }
}

impl OpticsParams {
    pub fn with(mut self, field: Field, value: f64) -> ScenarioResult<Self> {
        let v = field.accept(value)?;
        match field {
            Field::IncidenceAngle => self.incidence_angle = v,
            Field::N1 => self.n1 = v,
            Field::N2 => self.n2 = v,
            Field::Wavelength => self.wavelength = v,
            other => {
                return Err(ParameterEdit::set(other, value).unsupported(ScenarioKind::Optics));
            }
        }
        Ok(self)
    }

    pub fn with_incidence_angle(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::IncidenceAngle, value)
    }

    pub fn with_n1(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::N1, value)
    }

    pub fn with_n2(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::N2, value)
    }

    pub fn with_wavelength(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::Wavelength, value)
    }

    pub fn with_medium(self, side: MediumSide, material: Material) -> ScenarioResult<Self> {
        self.with(side.field(), material.refractive_index())
    }

    pub fn refraction_deg(&self) -> Option<f64> {
        snell(self.n1, self.n2, self.incidence_angle)
    }

    pub fn is_total_internal_reflection(&self) -> bool {
        self.refraction_deg().is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OpticsDerived {
    pub incidence_deg: f64,
    pub reflection_deg: f64,
    /// `None` under total internal reflection
    pub refraction_deg: Option<f64>,
    /// `(n1/n2)·sin θ1`; above 1 means total internal reflection
    pub sin_refracted: f64,
    pub total_internal_reflection: bool,
    pub critical_angle_deg: Option<f64>,
    pub wavelength_nm: f64,
    pub band: SpectralBand,
    pub surface: SurfaceKind,
    pub ray_mode: RayMode,
}

pub struct Optics {
    params: OpticsParams,
    run_state: RunState,
}

impl Default for Optics {
    fn default() -> Self {
        Self::new()
    }
}

impl Optics {
    pub fn new() -> Self {
        Self::with_params(OpticsParams::default())
    }

    pub fn with_params(params: OpticsParams) -> Self {
        Self {
            params,
            run_state: RunState::Stopped,
        }
    }

    pub fn params(&self) -> &OpticsParams {
        &self.params
    }

    fn shows_reflection(&self) -> bool {
        self.params.ray_mode != RayMode::Refraction || self.params.is_total_internal_reflection()
    }

    fn shows_refraction(&self) -> bool {
        self.params.ray_mode != RayMode::Reflection
    }
}

impl Scenario for Optics {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Optics
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
            info!(scenario = "optics", running, "run state changed");
        }
        Ok(())
    }

    fn apply_edit(&mut self, edit: &ParameterEdit) -> ScenarioResult<()> {
        match *edit {
            ParameterEdit::Set { field, value } => {
                self.params = self.params.with(field, value)?;
            }
            ParameterEdit::Surface { surface } => self.params.surface = surface,
            ParameterEdit::RayMode { mode } => self.params.ray_mode = mode,
            ParameterEdit::Medium { side, material } => {
                self.params = self.params.with_medium(side, material)?;
            }
            _ => return Err(edit.unsupported(ScenarioKind::Optics)),
        }
        Ok(())
    }

    fn advance(&mut self, _elapsed: f64) -> ScenarioResult<()> {
        Ok(())
    }

    fn sample_pose(&self) -> PoseSample {
        let theta1 = deg_to_rad(self.params.incidence_angle);
        let (s1, c1) = theta1.sin_cos();
        let mut points = vec![
            NamedPoint::new("hit", Point::ORIGIN),
            NamedPoint::new(
                "source",
                Point::new(-RAY_LENGTH_M * s1, RAY_LENGTH_M * c1),
            ),
        ];
        let mut angles = vec![NamedAngle {
            name: "incidence",
            degrees: self.params.incidence_angle,
        }];
        if self.shows_reflection() {
            points.push(NamedPoint::new(
                "reflected_end",
                Point::new(RAY_LENGTH_M * s1, RAY_LENGTH_M * c1),
            ));
            angles.push(NamedAngle {
                name: "reflection",
                degrees: self.params.incidence_angle,
            });
        }
        if let Some(theta2) = self.params.refraction_deg().filter(|_| self.shows_refraction()) {
            let (s2, c2) = deg_to_rad(theta2).sin_cos();
            points.push(NamedPoint::new(
                "refracted_end",
                Point::new(RAY_LENGTH_M * s2, -RAY_LENGTH_M * c2),
            ));
            angles.push(NamedAngle {
                name: "refraction",
                degrees: theta2,
            });
        }
        PoseSample { points, angles }
    }

    fn geometry(&self) -> SceneGeometry {
        SceneGeometry {
            bounds: Bounds::centered(Point::ORIGIN, RAY_LENGTH_M).padded(0.1),
            reference_length_m: RAY_LENGTH_M,
            anchors: vec![
                NamedPoint::new("interface_left", Point::new(-RAY_LENGTH_M, 0.0)),
                NamedPoint::new("interface_right", Point::new(RAY_LENGTH_M, 0.0)),
            ],
        }
    }

    fn derived(&self) -> DerivedQuantities {
        let p = &self.params;
        let refraction = p.refraction_deg();
        DerivedQuantities::Optics(OpticsDerived {
            incidence_deg: p.incidence_angle,
            reflection_deg: p.incidence_angle,
            refraction_deg: refraction,
            sin_refracted: refracted_sine(p.n1, p.n2, p.incidence_angle).unwrap_or(0.0),
            total_internal_reflection: refraction.is_none(),
            critical_angle_deg: critical_angle_deg(p.n1, p.n2),
            wavelength_nm: p.wavelength,
            band: SpectralBand::from_wavelength_nm(p.wavelength),
            surface: p.surface,
            ray_mode: p.ray_mode,
        })
    }

    fn events(&self) -> EventFlags {
        EventFlags {
            total_internal_reflection: self.run_state.is_running()
                && self.params.is_total_internal_reflection(),
            ..EventFlags::default()
        }
    }

    fn status(&self) -> EngineStatus {
        EngineStatus::Ready
    }

    fn values(&self) -> Vec<(Field, f64)> {
        let p = &self.params;
        vec![
            (Field::IncidenceAngle, p.incidence_angle),
            (Field::N1, p.n1),
            (Field::N2, p.n2),
            (Field::Wavelength, p.wavelength),
        ]
    }

    fn reset(&mut self) -> ScenarioResult<()> {
        debug!("optics reset to defaults");
        self.run_state = RunState::Stopped;
        self.params = OpticsParams::default();
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn tir_iff_past_critical_angle(
            n1 in 1.0f64..3.0, n2 in 1.0f64..3.0, incidence in 0.0f64..90.0
        ) {
            let tir = snell(n1, n2, incidence).is_none();
            match critical_angle_deg(n1, n2) {
                Some(c) => {
                    prop_assume!((incidence - c).abs() > 1e-6);
                    prop_assert_eq!(tir, incidence > c);
                }
                None => prop_assert!(!tir),
            }
        }

        #[test]
        fn refraction_angle_is_in_range(
            n1 in 1.0f64..3.0, n2 in 1.0f64..3.0, incidence in 0.0f64..90.0
        ) {
            if let Some(theta2) = snell(n1, n2, incidence) {
                prop_assert!(theta2 >= 0.0 && theta2 <= 90.0 + 1e-9);
            }
        }
    }
}
