//! Parameter store primitives: named fields, documented ranges, edits.
//!
//! Every numeric edit goes through [`Field::accept`]:
//! - non-finite input is rejected
//! - periodic fields (incline angle) wrap into `[0, 360)`
//! - everything else is clamped into its range

use std::fmt;
use std::str::FromStr;

use bl_core::{clamp_report, wrap_deg_unsigned};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::circuit::{ComponentKind, Topology};
use crate::error::{ScenarioError, ScenarioResult};
use crate::optics::{Material, MediumSide, RayMode, SurfaceKind};
use crate::scenario::ScenarioKind;

/// A numeric parameter exposed to the editing UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    // pendulum
    Length,
    GravityScale,
    ReleaseAngle,
    // inclined plane
    InclineAngle,
    Friction,
    Mass,
    // circuit
    Voltage,
    BaseResistance,
    ComponentResistance,
    // lever
    MassLeft,
    MassRight,
    DistanceLeft,
    DistanceRight,
    // optics
    IncidenceAngle,
    N1,
    N2,
    Wavelength,
}

/// Valid range of a field. `wrap` marks periodic fields.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldRange {
    pub min: f64,
    pub max: f64,
    pub wrap: bool,
}

impl FieldRange {
    const fn clamp(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            wrap: false,
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        if self.wrap {
            v >= self.min && v < self.max
        } else {
            v >= self.min && v <= self.max
        }
    }
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::Length,
        Field::GravityScale,
        Field::ReleaseAngle,
        Field::InclineAngle,
        Field::Friction,
        Field::Mass,
        Field::Voltage,
        Field::BaseResistance,
        Field::ComponentResistance,
        Field::MassLeft,
        Field::MassRight,
        Field::DistanceLeft,
        Field::DistanceRight,
        Field::IncidenceAngle,
        Field::N1,
        Field::N2,
        Field::Wavelength,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::Length => "length",
            Field::GravityScale => "gravity_scale",
            Field::ReleaseAngle => "release_angle",
            Field::InclineAngle => "incline_angle",
            Field::Friction => "friction",
            Field::Mass => "mass",
            Field::Voltage => "voltage",
            Field::BaseResistance => "base_resistance",
            Field::ComponentResistance => "component_resistance",
            Field::MassLeft => "mass_left",
            Field::MassRight => "mass_right",
            Field::DistanceLeft => "distance_left",
            Field::DistanceRight => "distance_right",
            Field::IncidenceAngle => "incidence_angle",
            Field::N1 => "n1",
            Field::N2 => "n2",
            Field::Wavelength => "wavelength",
        }
    }

    /// Unit suffix for display.
    pub fn unit(self) -> &'static str {
        match self {
            Field::Length | Field::DistanceLeft | Field::DistanceRight => "m",
            Field::ReleaseAngle | Field::InclineAngle | Field::IncidenceAngle => "deg",
            Field::Mass | Field::MassLeft | Field::MassRight => "kg",
            Field::Voltage => "V",
            Field::BaseResistance | Field::ComponentResistance => "ohm",
            Field::Wavelength => "nm",
            Field::GravityScale | Field::Friction | Field::N1 | Field::N2 => "",
        }
    }

    /// Scenario owning this field.
    pub fn scenario(self) -> ScenarioKind {
        match self {
            Field::Length | Field::GravityScale | Field::ReleaseAngle => ScenarioKind::Pendulum,
            Field::InclineAngle | Field::Friction | Field::Mass => ScenarioKind::InclinedPlane,
            Field::Voltage | Field::BaseResistance | Field::ComponentResistance => {
                ScenarioKind::Circuit
            }
            Field::MassLeft | Field::MassRight | Field::DistanceLeft | Field::DistanceRight => {
                ScenarioKind::Lever
            }
            Field::IncidenceAngle | Field::N1 | Field::N2 | Field::Wavelength => {
                ScenarioKind::Optics
            }
        }
    }

    pub fn range(self) -> FieldRange {
        match self {
            Field::Length => FieldRange::clamp(0.2, 5.0),
            Field::GravityScale => FieldRange::clamp(0.1, 3.0),
            Field::ReleaseAngle => FieldRange::clamp(-180.0, 180.0),
            Field::InclineAngle => FieldRange {
                min: 0.0,
                max: 360.0,
                wrap: true,
            },
            Field::Friction => FieldRange::clamp(0.0, 1.0),
            Field::Mass | Field::MassLeft | Field::MassRight => FieldRange::clamp(0.1, 10.0),
            Field::Voltage => FieldRange::clamp(0.0, 24.0),
            Field::BaseResistance | Field::ComponentResistance => {
                FieldRange::clamp(1.0, 10_000.0)
            }
            Field::DistanceLeft | Field::DistanceRight => FieldRange::clamp(0.0, 3.0),
            Field::IncidenceAngle => FieldRange::clamp(0.0, 90.0),
            Field::N1 | Field::N2 => FieldRange::clamp(1.0, 3.0),
            Field::Wavelength => FieldRange::clamp(380.0, 750.0),
        }
    }

    /// Validate a raw UI value for this field.
    pub fn accept(self, value: f64) -> ScenarioResult<f64> {
        if !value.is_finite() {
            return Err(ScenarioError::InvalidParameter { field: self, value });
        }
        let range = self.range();
        if range.wrap {
            return Ok(wrap_deg_unsigned(value));
        }
        let (accepted, clamped) = clamp_report(value, range.min, range.max);
        if clamped {
            debug!(field = self.name(), value, accepted, "parameter clamped to range");
        }
        Ok(accepted)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Field::ALL
            .into_iter()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| ScenarioError::UnknownName {
                what: "field",
                name: s.to_string(),
            })
    }
}

/// One edit coming from the parameter UI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "edit", rename_all = "snake_case")]
pub enum ParameterEdit {
    /// Set a numeric field.
    Set { field: Field, value: f64 },
    /// Circuit: series or parallel.
    Topology { topology: Topology },
    /// Circuit: append a component from the palette.
    AddComponent { kind: ComponentKind },
    /// Circuit: remove a placed component by id.
    RemoveComponent { id: u32 },
    /// Circuit: change a placed component's value (ohms; volts for a battery).
    UpdateComponent { id: u32, value: f64 },
    /// Optics: interface shape.
    Surface { surface: SurfaceKind },
    /// Optics: which rays to emit.
    RayMode { mode: RayMode },
    /// Optics: set one medium's index from a material preset.
    Medium { side: MediumSide, material: Material },
}

impl ParameterEdit {
    pub fn set(field: Field, value: f64) -> Self {
        ParameterEdit::Set { field, value }
    }

    /// Scenario this edit targets.
    pub fn scenario(&self) -> ScenarioKind {
        match self {
            ParameterEdit::Set { field, .. } => field.scenario(),
            ParameterEdit::Topology { .. }
            | ParameterEdit::AddComponent { .. }
            | ParameterEdit::RemoveComponent { .. }
            | ParameterEdit::UpdateComponent { .. } => ScenarioKind::Circuit,
            ParameterEdit::Surface { .. }
            | ParameterEdit::RayMode { .. }
            | ParameterEdit::Medium { .. } => ScenarioKind::Optics,
        }
    }

    pub(crate) fn unsupported(&self, scenario: ScenarioKind) -> ScenarioError {
        ScenarioError::UnsupportedEdit {
            scenario,
            edit: self.to_string(),
        }
    }
}

impl fmt::Display for ParameterEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterEdit::Set { field, value } => write!(f, "{field}={value}"),
            ParameterEdit::Topology { topology } => write!(f, "topology={topology:?}"),
            ParameterEdit::AddComponent { kind } => write!(f, "add {kind:?}"),
            ParameterEdit::RemoveComponent { id } => write!(f, "remove #{id}"),
            ParameterEdit::UpdateComponent { id, value } => write!(f, "#{id}={value}"),
            ParameterEdit::Surface { surface } => write!(f, "surface={surface:?}"),
            ParameterEdit::RayMode { mode } => write!(f, "ray_mode={mode:?}"),
            ParameterEdit::Medium { side, material } => write!(f, "{side:?}={material:?}"),
        }
    }
}
