//! Lab file schema definitions.

use std::collections::BTreeMap;

use bl_scenarios::{CircuitLimits, IntegratorType, ParameterEdit, ScenarioKind, StepOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabFile {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub viewport: ViewportDef,
    #[serde(default)]
    pub timing: TimingDef,
    #[serde(default)]
    pub circuit_limits: CircuitLimits,
    #[serde(default)]
    pub scenarios: Vec<ScenarioDef>,
}

impl LabFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: crate::migrate::LATEST_VERSION,
            name: name.into(),
            viewport: ViewportDef::default(),
            timing: TimingDef::default(),
            circuit_limits: CircuitLimits::default(),
            scenarios: Vec::new(),
        }
    }

    pub fn scenario(&self, id: &str) -> Option<&ScenarioDef> {
        self.scenarios.iter().find(|s| s.id == id)
    }
}

/// Drawing surface size in pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ViewportDef {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportDef {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
        }
    }
}

/// Fixed-step integration settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimingDef {
    pub step_dt_s: f64,
    pub max_substeps: u32,
    /// `rk4` or `forward_euler`.
    #[serde(default)]
    pub integrator: IntegratorType,
}

impl Default for TimingDef {
    fn default() -> Self {
        let step = StepOptions::default();
        Self {
            step_dt_s: step.dt,
            max_substeps: step.max_substeps,
            integrator: step.integrator,
        }
    }
}

impl From<TimingDef> for StepOptions {
    fn from(def: TimingDef) -> Self {
        StepOptions {
            dt: def.step_dt_s,
            max_substeps: def.max_substeps,
            integrator: def.integrator,
        }
    }
}

/// A named scenario preset.
///
/// `params` maps field names to values; they pass through the same clamping
/// setters as interactive edits. `edits` are applied afterwards, in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioDef {
    pub id: String,
    pub name: String,
    pub kind: ScenarioKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edits: Vec<ParameterEdit>,
}

impl ScenarioDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ScenarioKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            params: BTreeMap::new(),
            edits: Vec::new(),
        }
    }

    pub fn with_param(mut self, field: bl_scenarios::Field, value: f64) -> Self {
        self.params.insert(field.name().to_string(), value);
        self
    }

    pub fn with_edit(mut self, edit: ParameterEdit) -> Self {
        self.edits.push(edit);
        self
    }
}
