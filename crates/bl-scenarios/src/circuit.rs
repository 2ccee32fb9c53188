//! DC circuit: a battery driving resistors and bulbs in series or parallel.
//!
//! Purely analytic. Current is recomputed on every edit; while running the
//! overcurrent and short-circuit thresholds are evaluated as well.

use bl_core::units::{as_amps, ohms, volts};
use bl_core::{ComponentId, Id, IdAllocator};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ScenarioError, ScenarioResult};
use crate::events::EventFlags;
use crate::geometry::{Bounds, NamedPoint, Point, PoseSample, SceneGeometry};
use crate::params::{Field, ParameterEdit};
use crate::scenario::{DerivedQuantities, EngineStatus, RunState, Scenario, ScenarioKind};

/// Loop outline (m) used to lay out component slots.
const LOOP_WIDTH_M: f64 = 4.0;
const LOOP_HEIGHT_M: f64 = 2.5;

pub const DEFAULT_RESISTOR_OHM: f64 = 100.0;
pub const DEFAULT_BULB_OHM: f64 = 10.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topology {
    #[default]
    Series,
    Parallel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Battery,
    Resistor,
    Bulb,
}

impl ComponentKind {
    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Battery => "battery",
            ComponentKind::Resistor => "resistor",
            ComponentKind::Bulb => "bulb",
        }
    }

    fn default_resistance(self) -> f64 {
        match self {
            ComponentKind::Battery => 0.0,
            ComponentKind::Resistor => DEFAULT_RESISTOR_OHM,
            ComponentKind::Bulb => DEFAULT_BULB_OHM,
        }
    }
}

/// Overcurrent thresholds (A).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircuitLimits {
    /// A bulb blows the first time current exceeds this.
    pub bulb_blow_current_a: f64,
    /// Short-circuit flag above this.
    pub short_circuit_current_a: f64,
}

impl Default for CircuitLimits {
    fn default() -> Self {
        Self {
            bulb_blow_current_a: 0.5,
            short_circuit_current_a: 2.0,
        }
    }
}

impl CircuitLimits {
    pub fn validate(&self) -> ScenarioResult<()> {
        let blow = self.bulb_blow_current_a;
        let short = self.short_circuit_current_a;
        if !(blow.is_finite() && short.is_finite()) {
            return Err(ScenarioError::InvalidConfig {
                what: "circuit limits must be finite",
            });
        }
        if !(0.0 < blow && blow < short) {
            return Err(ScenarioError::InvalidConfig {
                what: "circuit limits must satisfy 0 < blow < short",
            });
        }
        Ok(())
    }
}

/// A placed component.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CircuitComponent {
    pub id: ComponentId,
    pub kind: ComponentKind,
    /// Ohms; zero for the battery
    pub resistance_ohm: f64,
    /// Bulbs only; stays set until the circuit is reset
    pub blown: bool,
}

impl CircuitComponent {
    fn fresh(id: ComponentId, kind: ComponentKind) -> Self {
        Self {
            id,
            kind,
            resistance_ohm: kind.default_resistance(),
            blown: false,
        }
    }

    /// Whether this component currently carries resistance in the loop.
    fn is_active_load(&self) -> bool {
        match self.kind {
            ComponentKind::Battery => false,
            ComponentKind::Resistor => true,
            ComponentKind::Bulb => !self.blown,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitParams {
    /// Battery EMF (V)
    pub voltage: f64,
    /// Resistance used when the loop holds no load (Ω)
    pub base_resistance: f64,
    pub topology: Topology,
}

impl Default for CircuitParams {
    fn default() -> Self {
        Self {
            voltage: 9.0,
            base_resistance: 100.0,
            topology: Topology::Series,
        }
    }
}

impl CircuitParams {
    pub fn with(mut self, field: Field, value: f64) -> ScenarioResult<Self> {
        let v = field.accept(value)?;
        match field {
            Field::Voltage => self.voltage = v,
            Field::BaseResistance => self.base_resistance = v,
            other => {
                return Err(ParameterEdit::set(other, value).unsupported(ScenarioKind::Circuit));
            }
        }
        Ok(self)
    }

    pub fn with_voltage(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::Voltage, value)
    }

    pub fn with_base_resistance(self, value: f64) -> ScenarioResult<Self> {
        self.with(Field::BaseResistance, value)
    }
}

/// Equivalent resistance of `loads` (Ω).
///
/// Series sums, parallel takes the reciprocal of the summed reciprocals. An
/// empty load list, or a result that is not strictly positive, falls back to
/// `base`.
pub fn total_resistance(topology: Topology, loads: &[f64], base: f64) -> f64 {
    if loads.is_empty() {
        return base;
    }
    let r = match topology {
        Topology::Series => loads.iter().sum::<f64>(),
        Topology::Parallel => {
            let g: f64 = loads.iter().map(|r| 1.0 / r).sum();
            1.0 / g
        }
    };
    if r.is_finite() && r > 0.0 { r } else { base }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CircuitDerived {
    pub topology: Topology,
    pub voltage_v: f64,
    pub total_resistance_ohm: f64,
    pub current_a: f64,
    pub power_w: f64,
    pub blown_bulbs: usize,
    pub short_circuit: bool,
    pub components: Vec<CircuitComponent>,
}

pub struct Circuit {
    params: CircuitParams,
    limits: CircuitLimits,
    components: Vec<CircuitComponent>,
    ids: IdAllocator,
    run_state: RunState,
    total_resistance: f64,
    current: f64,
    short_circuit: bool,
}

impl Circuit {
    pub fn new(limits: CircuitLimits) -> Self {
        let mut circuit = Self {
            params: CircuitParams::default(),
            limits,
            components: Vec::new(),
            ids: IdAllocator::new(),
            run_state: RunState::Stopped,
            total_resistance: 0.0,
            current: 0.0,
            short_circuit: false,
        };
        circuit.restore_defaults();
        circuit
    }

    /// Replace the component list with the given kinds at their default values.
    pub fn with_components(limits: CircuitLimits, kinds: &[ComponentKind]) -> Self {
        let mut circuit = Self::new(limits);
        circuit.place(kinds);
        circuit.evaluate();
        circuit
    }

    pub fn params(&self) -> &CircuitParams {
        &self.params
    }

    pub fn components(&self) -> &[CircuitComponent] {
        &self.components
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Replace every component; ids restart from zero.
    fn place(&mut self, kinds: &[ComponentKind]) {
        self.components = (0u32..)
            .zip(kinds)
            .map(|(index, kind)| CircuitComponent::fresh(Id::from_index(index), *kind))
            .collect();
        let placed = u32::try_from(self.components.len()).unwrap_or(u32::MAX);
        self.ids = IdAllocator::starting_at(placed);
    }

    /// Default parameters and components. Ids restart, so the result does not
    /// depend on what was placed before.
    fn restore_defaults(&mut self) {
        self.params = CircuitParams::default();
        self.place(&[
            ComponentKind::Battery,
            ComponentKind::Resistor,
            ComponentKind::Bulb,
        ]);
        self.short_circuit = false;
        self.evaluate();
    }

    pub fn add_component(&mut self, kind: ComponentKind) -> ScenarioResult<ComponentId> {
        let id = self.ids.allocate()?;
        self.components.push(CircuitComponent::fresh(id, kind));
        debug!(id = id.index(), kind = kind.name(), "component added");
        self.evaluate();
        Ok(id)
    }

    pub fn remove_component(&mut self, id: u32) -> ScenarioResult<CircuitComponent> {
        let pos = self.position(id)?;
        let removed = self.components.remove(pos);
        debug!(id, kind = removed.kind.name(), "component removed");
        self.evaluate();
        Ok(removed)
    }

    /// Change a component's value: ohms for loads, volts for the battery.
    pub fn update_component(&mut self, id: u32, value: f64) -> ScenarioResult<()> {
        let pos = self.position(id)?;
        if self.components[pos].kind == ComponentKind::Battery {
            self.params = self.params.with_voltage(value)?;
        } else {
            let ohm = Field::ComponentResistance.accept(value)?;
            self.components[pos].resistance_ohm = ohm;
        }
        self.evaluate();
        Ok(())
    }

    /// Set every resistor to the same value.
    fn set_all_resistors(&mut self, value: f64) -> ScenarioResult<()> {
        let ohm = Field::ComponentResistance.accept(value)?;
        for c in &mut self.components {
            if c.kind == ComponentKind::Resistor {
                c.resistance_ohm = ohm;
            }
        }
        self.evaluate();
        Ok(())
    }

    /// Un-blow bulbs, clear the short flag, restore defaults and stop.
    pub fn reset_circuit(&mut self) {
        self.run_state = RunState::Stopped;
        self.restore_defaults();
        info!("circuit reset");
    }

    fn position(&self, id: u32) -> ScenarioResult<usize> {
        self.components
            .iter()
            .position(|c| c.id.index() == id)
            .ok_or(ScenarioError::UnknownComponent { id })
    }

    fn has_source(&self) -> bool {
        self.components
            .iter()
            .any(|c| c.kind == ComponentKind::Battery)
    }

    /// `(R, I)` for the current component states.
    fn solve(&self) -> (f64, f64) {
        let loads: Vec<f64> = self
            .components
            .iter()
            .filter(|c| c.is_active_load())
            .map(|c| c.resistance_ohm)
            .collect();
        let r = total_resistance(self.params.topology, &loads, self.params.base_resistance);
        let i = if self.has_source() {
            as_amps(volts(self.params.voltage) / ohms(r))
        } else {
            0.0
        };
        (r, i)
    }

    /// Recompute current; while running, apply the overcurrent thresholds.
    fn evaluate(&mut self) {
        let (mut r, mut i) = self.solve();
        if self.run_state.is_running() {
            if i > self.limits.bulb_blow_current_a {
                let mut blown = 0;
                for c in &mut self.components {
                    if c.kind == ComponentKind::Bulb && !c.blown {
                        c.blown = true;
                        blown += 1;
                    }
                }
                if blown > 0 {
                    warn!(current_a = i, blown, "overcurrent, bulbs blown");
                    (r, i) = self.solve();
                }
            }
            // judged after bulbs blow so re-evaluating the same state agrees
            self.short_circuit = i > self.limits.short_circuit_current_a;
            if self.short_circuit {
                warn!(current_a = i, "short circuit");
            }
        } else {
            self.short_circuit = false;
        }
        self.total_resistance = r;
        self.current = i;
    }

    fn blown_bulbs(&self) -> usize {
        self.components.iter().filter(|c| c.blown).count()
    }

    /// Slot position of the `index`-th of `count` components, spread evenly
    /// clockwise around the loop starting at the top-left corner.
    fn slot(index: usize, count: usize) -> Point {
        let w = LOOP_WIDTH_M;
        let h = LOOP_HEIGHT_M;
        let perimeter = 2.0 * (w + h);
        let s = perimeter * (index as f64 + 0.5) / count.max(1) as f64;
        let (x0, y0) = (-0.5 * w, 0.5 * h);
        if s < w {
            Point::new(x0 + s, y0)
        } else if s < w + h {
            Point::new(x0 + w, y0 - (s - w))
        } else if s < 2.0 * w + h {
            Point::new(x0 + w - (s - w - h), y0 - h)
        } else {
            Point::new(x0, y0 - h + (s - 2.0 * w - h))
        }
    }
}

impl Scenario for Circuit {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Circuit
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
            info!(scenario = "circuit", running, "run state changed");
        }
        self.evaluate();
        Ok(())
    }

    fn apply_edit(&mut self, edit: &ParameterEdit) -> ScenarioResult<()> {
        match *edit {
            ParameterEdit::Set {
                field: Field::ComponentResistance,
                value,
            } => self.set_all_resistors(value),
            ParameterEdit::Set { field, value } => {
                self.params = self.params.with(field, value)?;
                self.evaluate();
                Ok(())
            }
            ParameterEdit::Topology { topology } => {
                self.params.topology = topology;
                self.evaluate();
                Ok(())
            }
            ParameterEdit::AddComponent { kind } => {
                self.add_component(kind)?;
                Ok(())
            }
            ParameterEdit::RemoveComponent { id } => self.remove_component(id).map(|_| ()),
            ParameterEdit::UpdateComponent { id, value } => self.update_component(id, value),
            _ => Err(edit.unsupported(ScenarioKind::Circuit)),
        }
    }

    fn advance(&mut self, _elapsed: f64) -> ScenarioResult<()> {
        Ok(())
    }

    fn sample_pose(&self) -> PoseSample {
        let count = self.components.len();
        PoseSample {
            points: self
                .components
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    NamedPoint::new(format!("{}#{}", c.kind.name(), c.id), Self::slot(i, count))
                })
                .collect(),
            angles: Vec::new(),
        }
    }

    fn geometry(&self) -> SceneGeometry {
        let half = Point::new(0.5 * LOOP_WIDTH_M, 0.5 * LOOP_HEIGHT_M);
        let corners = [
            Point::new(-half.x, half.y),
            Point::new(half.x, half.y),
            Point::new(half.x, -half.y),
            Point::new(-half.x, -half.y),
        ];
        let bounds = Bounds {
            min: Point::new(-half.x, -half.y),
            max: half,
        }
        .padded(0.5);
        SceneGeometry {
            bounds,
            reference_length_m: LOOP_WIDTH_M,
            anchors: ["top_left", "top_right", "bottom_right", "bottom_left"]
                .into_iter()
                .zip(corners)
                .map(|(name, at)| NamedPoint::new(name, at))
                .collect(),
        }
    }

    fn derived(&self) -> DerivedQuantities {
        let r = self.total_resistance;
        DerivedQuantities::Circuit(CircuitDerived {
            topology: self.params.topology,
            voltage_v: self.params.voltage,
            total_resistance_ohm: r,
            current_a: self.current,
            power_w: self.current * self.current * r,
            blown_bulbs: self.blown_bulbs(),
            short_circuit: self.short_circuit,
            components: self.components.clone(),
        })
    }

    fn events(&self) -> EventFlags {
        let running = self.run_state.is_running();
        EventFlags {
            bulb_blown: running && self.blown_bulbs() > 0,
            short_circuit: running && self.short_circuit,
            ..EventFlags::default()
        }
    }

    fn status(&self) -> EngineStatus {
        EngineStatus::Ready
    }

    fn values(&self) -> Vec<(Field, f64)> {
        vec![
            (Field::Voltage, self.params.voltage),
            (Field::BaseResistance, self.params.base_resistance),
        ]
    }

    fn reset(&mut self) -> ScenarioResult<()> {
        self.reset_circuit();
        Ok(())
    }
}
