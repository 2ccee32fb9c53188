//! The common scenario interface and mounting.

use std::fmt;
use std::str::FromStr;

use bl_rigid::WorldFactory;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::circuit::{Circuit, CircuitDerived, CircuitLimits};
use crate::error::{ScenarioError, ScenarioResult};
use crate::events::EventFlags;
use crate::geometry::{PoseSample, SceneGeometry};
use crate::incline::{InclineDerived, InclinedPlane};
use crate::lever::{Lever, LeverDerived};
use crate::optics::{Optics, OpticsDerived};
use crate::params::{Field, ParameterEdit};
use crate::pendulum::{Pendulum, PendulumDerived};
use crate::timing::StepOptions;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Pendulum,
    InclinedPlane,
    Circuit,
    Lever,
    Optics,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 5] = [
        ScenarioKind::Pendulum,
        ScenarioKind::InclinedPlane,
        ScenarioKind::Circuit,
        ScenarioKind::Lever,
        ScenarioKind::Optics,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScenarioKind::Pendulum => "pendulum",
            ScenarioKind::InclinedPlane => "inclined_plane",
            ScenarioKind::Circuit => "circuit",
            ScenarioKind::Lever => "lever",
            ScenarioKind::Optics => "optics",
        }
    }

    /// Whether the scenario owns a rigid-body world.
    pub fn is_integrated(self) -> bool {
        matches!(self, ScenarioKind::Pendulum | ScenarioKind::InclinedPlane)
    }

    pub fn fields(self) -> impl Iterator<Item = Field> {
        Field::ALL.into_iter().filter(move |f| f.scenario() == self)
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioKind {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ScenarioKind::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ScenarioError::UnknownName {
                what: "scenario",
                name: s.to_string(),
            })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Stopped,
    Running,
}

impl RunState {
    pub fn is_running(self) -> bool {
        self == RunState::Running
    }
}

/// Health of the physical state engine behind a scenario.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EngineStatus {
    #[default]
    Ready,
    /// The world could not be created; the scenario cannot start.
    Unavailable { message: String },
    /// A step failed; cleared by the next successful start, edit or reset.
    Faulted { message: String },
}

impl EngineStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, EngineStatus::Ready)
    }
}

/// Per-scenario derived quantities, tagged by scenario.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "scenario", rename_all = "snake_case")]
pub enum DerivedQuantities {
    Pendulum(PendulumDerived),
    InclinedPlane(InclineDerived),
    Circuit(CircuitDerived),
    Lever(LeverDerived),
    Optics(OpticsDerived),
}

/// What happened when an edit came in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EditOutcome {
    /// The scenario was running and got stopped by the edit.
    pub stopped: bool,
}

/// Common interface of the five scenario models.
///
/// Chosen once per mount. Integrator-backed models advance simulated time in
/// [`Scenario::advance`]; analytic models recompute on every edit and treat
/// `advance` as a no-op.
pub trait Scenario {
    fn kind(&self) -> ScenarioKind;
    fn run_state(&self) -> RunState;

    /// Start or stop. Stopping restores the start pose.
    fn set_running(&mut self, running: bool) -> ScenarioResult<()>;

    /// Apply an edit and resynchronize geometry and pose. Callers stop first.
    fn apply_edit(&mut self, edit: &ParameterEdit) -> ScenarioResult<()>;

    /// Stop if running, then apply the edit.
    ///
    /// The scenario stays stopped afterwards; restarting is the caller's call.
    fn on_parameter_edit(&mut self, edit: &ParameterEdit) -> ScenarioResult<EditOutcome> {
        let kind = self.kind();
        if edit.scenario() != kind {
            return Err(edit.unsupported(kind));
        }
        let stopped = self.run_state().is_running();
        if stopped {
            self.set_running(false)?;
        }
        debug!(scenario = %kind, %edit, stopped, "parameter edit");
        self.apply_edit(edit)?;
        Ok(EditOutcome { stopped })
    }

    /// Advance by `elapsed` seconds of wall time.
    fn advance(&mut self, elapsed: f64) -> ScenarioResult<()>;

    fn sample_pose(&self) -> PoseSample;
    fn geometry(&self) -> SceneGeometry;
    fn derived(&self) -> DerivedQuantities;
    fn events(&self) -> EventFlags;
    fn status(&self) -> EngineStatus;

    /// Current numeric parameter values.
    fn values(&self) -> Vec<(Field, f64)>;

    /// Restore default parameters and stop.
    fn reset(&mut self) -> ScenarioResult<()>;
}

/// Settings shared by every mount.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MountOptions {
    pub step: StepOptions,
    pub circuit_limits: CircuitLimits,
}

impl MountOptions {
    pub fn validate(&self) -> ScenarioResult<()> {
        self.step.validate()?;
        self.circuit_limits.validate()
    }
}

/// Create a scenario with default parameters.
///
/// Integrator-backed scenarios ask `factory` for a world. If that fails the
/// scenario still mounts, reports [`EngineStatus::Unavailable`] and refuses to
/// start.
pub fn mount(
    kind: ScenarioKind,
    factory: &dyn WorldFactory,
    options: MountOptions,
) -> ScenarioResult<Box<dyn Scenario>> {
    options.validate()?;
    let scenario: Box<dyn Scenario> = match kind {
        ScenarioKind::Pendulum => Box::new(Pendulum::new(factory, options.step)),
        ScenarioKind::InclinedPlane => Box::new(InclinedPlane::new(factory, options.step)),
        ScenarioKind::Circuit => Box::new(Circuit::new(options.circuit_limits)),
        ScenarioKind::Lever => Box::new(Lever::new()),
        ScenarioKind::Optics => Box::new(Optics::new()),
    };
    info!(scenario = %kind, status = ?scenario.status(), "scenario mounted");
    Ok(scenario)
}
