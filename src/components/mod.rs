//! Component catalogue for the circuit engine.
//!
//! Rather than a deep inheritance tree, a component is one flat
//! [`Component`] struct holding the electrical state every variant
//! shares, plus a [`ComponentKind`] tag carrying the variant-specific
//! data. Capabilities that only some variants have (toggling,
//! continuous adjustment) are expressed as traits on the variant state
//! types and dispatched by pattern matching.
//!
//! Variants:
//! - Sources: Battery, Cell
//! - Resistive: FixedResistor, VariableResistor, Thermistor, LightSensor
//! - Loads: Bulb, Heater, Motor
//! - Semiconductors: Diode, Led
//! - Switching: Switch, TwoWaySwitch
//! - Storage: Capacitor
//! - Junctions: Connector, TwoWaySwitch
//! - Meters: Ammeter, Voltmeter

mod capacitor;
mod diode;
mod junction;
mod loads;
mod meter;
mod resistive;
mod source;
mod switch;

pub use capacitor::{CapacitorPhase, CapacitorState};
pub use diode::{DiodeState, LockTransition};
pub use junction::{parallel_resistance, JunctionState, TwoWayState};
pub use loads::{BulbParams, HeaterState, MotorState};
pub use meter::MeterState;
pub use resistive::{LightSensorParams, ResistorParams, ThermistorParams, VariableResistorState};
pub use source::SourceParams;
pub use switch::SwitchState;

use crate::circuit::{CircuitId, ComponentId, WireId};
use crate::engine::EnvironmentContext;
use crate::R_INFINITE;

/// A variant with a user-driven open/close or select action.
pub trait Togglable {
    fn toggle(&mut self);
}

/// A variant with a continuously adjustable setting in `[0, 1]`.
pub trait Adjustable {
    fn set_fraction(&mut self, fraction: f64);
    fn fraction(&self) -> f64;
}

/// Variant tag plus variant-specific data.
#[derive(Debug, Clone)]
pub enum ComponentKind {
    Battery(SourceParams),
    Cell(SourceParams),
    FixedResistor(ResistorParams),
    VariableResistor(VariableResistorState),
    Thermistor(ThermistorParams),
    LightSensor(LightSensorParams),
    Bulb(BulbParams),
    Led(DiodeState),
    Switch(SwitchState),
    Diode(DiodeState),
    Capacitor(CapacitorState),
    Heater(HeaterState),
    Motor(MotorState),
    Connector(JunctionState),
    TwoWaySwitch(TwoWayState),
    Ammeter(MeterState),
    Voltmeter(MeterState),
}

impl ComponentKind {
    /// A battery with the given electromotive force in volts.
    pub fn battery(volts: f64) -> Self {
        ComponentKind::Battery(SourceParams::new(volts))
    }

    /// A single cell (smaller source, same behavior as a battery).
    pub fn cell(volts: f64) -> Self {
        ComponentKind::Cell(SourceParams::new(volts))
    }

    /// A fixed resistor.
    pub fn resistor(ohms: f64) -> Self {
        ComponentKind::FixedResistor(ResistorParams::new(ohms))
    }

    /// A variable resistor at full track resistance.
    pub fn variable_resistor(ohms: f64) -> Self {
        ComponentKind::VariableResistor(VariableResistorState::new(ohms))
    }

    /// An NTC thermistor.
    pub fn thermistor(ohms_at_ambient: f64) -> Self {
        ComponentKind::Thermistor(ThermistorParams::new(ohms_at_ambient))
    }

    /// A light-dependent resistor.
    pub fn light_sensor(dark_ohms: f64) -> Self {
        ComponentKind::LightSensor(LightSensorParams::new(dark_ohms))
    }

    /// A filament bulb with the given rating.
    pub fn bulb(ohms: f64, wattage: f64) -> Self {
        ComponentKind::Bulb(BulbParams::new(ohms, wattage))
    }

    /// A light-emitting diode (forward-only, luminous while conducting).
    pub fn led() -> Self {
        ComponentKind::Led(DiodeState::new(true))
    }

    /// A push switch, initially closed.
    pub fn switch() -> Self {
        ComponentKind::Switch(SwitchState::new(true))
    }

    /// A diode allowing conventional forward flow only.
    pub fn diode() -> Self {
        ComponentKind::Diode(DiodeState::new(true))
    }

    /// A diode mounted against conventional flow.
    pub fn diode_reversed() -> Self {
        ComponentKind::Diode(DiodeState::new(false))
    }

    /// A capacitor with the given capacitance (farads) and target volts.
    pub fn capacitor(farads: f64, target_volts: f64) -> Self {
        ComponentKind::Capacitor(CapacitorState::new(farads, target_volts))
    }

    /// A resistive heater.
    pub fn heater(ohms: f64) -> Self {
        ComponentKind::Heater(HeaterState::new(ohms))
    }

    /// A DC motor.
    pub fn motor(ohms: f64, max_current: f64) -> Self {
        ComponentKind::Motor(MotorState::new(ohms, max_current))
    }

    /// A two-branch parallel connector.
    pub fn connector() -> Self {
        ComponentKind::Connector(JunctionState::new())
    }

    /// A two-way (exclusive select) switch.
    pub fn two_way_switch() -> Self {
        ComponentKind::TwoWaySwitch(TwoWayState::new())
    }

    /// An ammeter (in series, near-zero resistance).
    pub fn ammeter() -> Self {
        ComponentKind::Ammeter(MeterState::ammeter())
    }

    /// A voltmeter (in a junction branch, very high resistance).
    pub fn voltmeter() -> Self {
        ComponentKind::Voltmeter(MeterState::voltmeter())
    }

    /// Stable type tag used by the persistence schema.
    pub fn tag(&self) -> &'static str {
        match self {
            ComponentKind::Battery(_) => "battery",
            ComponentKind::Cell(_) => "cell",
            ComponentKind::FixedResistor(_) => "resistor",
            ComponentKind::VariableResistor(_) => "variable-resistor",
            ComponentKind::Thermistor(_) => "thermistor",
            ComponentKind::LightSensor(_) => "light-sensor",
            ComponentKind::Bulb(_) => "bulb",
            ComponentKind::Led(_) => "led",
            ComponentKind::Switch(_) => "switch",
            ComponentKind::Diode(_) => "diode",
            ComponentKind::Capacitor(_) => "capacitor",
            ComponentKind::Heater(_) => "heater",
            ComponentKind::Motor(_) => "motor",
            ComponentKind::Connector(_) => "connector",
            ComponentKind::TwoWaySwitch(_) => "two-way-switch",
            ComponentKind::Ammeter(_) => "ammeter",
            ComponentKind::Voltmeter(_) => "voltmeter",
        }
    }
}

/// A circuit component: shared electrical state plus variant data.
#[derive(Debug, Clone)]
pub struct Component {
    pub id: ComponentId,
    pub kind: ComponentKind,
    /// Present resistance; refreshed from variant state each tick.
    pub resistance: f64,
    pub voltage: f64,
    pub current: f64,
    /// Rated current; exceeding it matters to variant state machines.
    pub max_current: f64,
    pub on: bool,
    /// Terminal failure flag; a blown component no longer conducts or
    /// emits light until externally replaced.
    pub blown: bool,
    pub luminous: bool,
    /// Wires feeding into this component's input port.
    pub inputs: Vec<WireId>,
    /// Wires leaving this component's output port.
    pub outputs: Vec<WireId>,
    /// Circuit segment this component currently belongs to.
    pub circuit: Option<CircuitId>,
    /// Canvas position; rendering geometry only.
    pub position: (f64, f64),
}

impl Component {
    pub fn new(id: ComponentId, kind: ComponentKind) -> Self {
        let mut comp = Self {
            id,
            kind,
            resistance: 0.0,
            voltage: 0.0,
            current: 0.0,
            max_current: 5.0,
            on: true,
            blown: false,
            luminous: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
            circuit: None,
            position: (0.0, 0.0),
        };
        if let ComponentKind::Motor(m) = &comp.kind {
            comp.max_current = m.max_current;
        }
        comp.resistance = comp.base_resistance(&EnvironmentContext::default());
        comp
    }

    /// Maximum number of input wires this variant accepts.
    pub fn max_inputs(&self) -> usize {
        match self.kind {
            // Connectors serve as both fork (1 in) and merge (2 in)
            ComponentKind::Connector(_) => 2,
            _ => 1,
        }
    }

    /// Maximum number of output wires this variant accepts.
    pub fn max_outputs(&self) -> usize {
        match self.kind {
            ComponentKind::Connector(_) | ComponentKind::TwoWaySwitch(_) => 2,
            _ => 1,
        }
    }

    pub fn is_power_source(&self) -> bool {
        matches!(
            self.kind,
            ComponentKind::Battery(_) | ComponentKind::Cell(_)
        )
    }

    /// Whether this variant owns child branch circuits.
    pub fn is_junction(&self) -> bool {
        matches!(
            self.kind,
            ComponentKind::Connector(_) | ComponentKind::TwoWaySwitch(_)
        )
    }

    /// Electromotive force for sources, zero otherwise.
    pub fn emf(&self) -> f64 {
        match &self.kind {
            ComponentKind::Battery(s) | ComponentKind::Cell(s) => s.volts,
            _ => 0.0,
        }
    }

    /// Resistance derived from variant state and the environment.
    ///
    /// Never negative or NaN: every branch clamps at assignment, and a
    /// blown component is pinned at the open-circuit sentinel.
    pub fn base_resistance(&self, env: &EnvironmentContext) -> f64 {
        if self.blown {
            return R_INFINITE;
        }
        let r = match &self.kind {
            ComponentKind::Battery(s) | ComponentKind::Cell(s) => s.internal_resistance,
            ComponentKind::FixedResistor(r) => r.ohms,
            ComponentKind::VariableResistor(v) => v.effective_ohms(),
            ComponentKind::Thermistor(t) => t.ohms_at(env.temperature),
            ComponentKind::LightSensor(l) => l.ohms_at(env.light_level),
            ComponentKind::Bulb(b) => b.ohms,
            ComponentKind::Led(d) | ComponentKind::Diode(d) => d.resistance(),
            ComponentKind::Switch(_) => 0.0,
            ComponentKind::Capacitor(c) => c.series_resistance,
            ComponentKind::Heater(h) => h.ohms,
            ComponentKind::Motor(m) => m.ohms,
            // Junction scalar resistance is replaced by the branch
            // combinator during aggregation
            ComponentKind::Connector(_) | ComponentKind::TwoWaySwitch(_) => 0.0,
            ComponentKind::Ammeter(m) | ComponentKind::Voltmeter(m) => m.ohms,
        };
        if r.is_nan() {
            0.0
        } else {
            r.clamp(0.0, R_INFINITE)
        }
    }

    /// Branch circuits owned by this junction, if it is one.
    pub fn branches(&self) -> Option<[Option<CircuitId>; 2]> {
        match &self.kind {
            ComponentKind::Connector(j) => Some(j.branches),
            ComponentKind::TwoWaySwitch(t) => Some(t.junction.branches),
            _ => None,
        }
    }

    /// Selected branch slot for an exclusive junction.
    pub fn selected_branch(&self) -> Option<usize> {
        match &self.kind {
            ComponentKind::TwoWaySwitch(t) => Some(t.selected),
            _ => None,
        }
    }

    /// Charge percentage for capacitors, in `[0, 100]`.
    pub fn capacitor_percentage(&self) -> Option<f64> {
        match &self.kind {
            ComponentKind::Capacitor(c) => Some(c.percentage()),
            _ => None,
        }
    }

    /// Present temperature for heaters, degrees Celsius above ambient.
    pub fn heater_temperature(&self) -> Option<f64> {
        match &self.kind {
            ComponentKind::Heater(h) => Some(h.temperature()),
            _ => None,
        }
    }

    /// Shaft angle for motors, radians in `[0, 2pi)`.
    pub fn motor_angle(&self) -> Option<f64> {
        match &self.kind {
            ComponentKind::Motor(m) => Some(m.angle),
            _ => None,
        }
    }

    /// Last reading for meters.
    pub fn meter_reading(&self) -> Option<f64> {
        match &self.kind {
            ComponentKind::Ammeter(m) | ComponentKind::Voltmeter(m) => Some(m.reading),
            _ => None,
        }
    }

    /// Replace a blown component with a fresh part of the same rating.
    ///
    /// This is the external-reset path out of the terminal blown state.
    pub fn replace_blown(&mut self) {
        self.blown = false;
        self.luminous = false;
        self.voltage = 0.0;
        self.current = 0.0;
    }
}
