//! Save/load schema for assembled circuits.
//!
//! A saved circuit is a flat list of components in registry order. Each
//! entry carries its variant tag, canvas position, outgoing connections
//! (target index plus optional wire geometry), and a variant-specific
//! flat numeric record. Only topology and configuration are persisted;
//! transient electrical state (voltage, current, capacitor charge) is
//! rebuilt by ticking.
//!
//! Loading is tolerant at the field level: a `data` entry with the
//! wrong type or an out-of-range value is logged and skipped, leaving
//! the variant default in place. Structural problems fail the whole
//! load instead: an unknown variant tag, a connection referencing a
//! missing component index, or a connection set that violates port
//! arity.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::circuit::WireMaterial;
use crate::components::{
    Adjustable, ComponentKind, SwitchState, TwoWayState, VariableResistorState,
};
use crate::engine::Control;
use crate::error::{Result, VoltLabError};

/// One persisted connection leaving a component's output port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedConnection {
    /// Registry index of the component this wire feeds into.
    pub target: usize,
    /// Persisted material index; absent means the default conductor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Value>,
    /// Conductor radius in mm; absent means the default gauge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<Value>,
    /// Intermediate path points; rendering geometry only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<(f64, f64)>,
}

/// One persisted component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedComponent {
    /// Stable variant tag, as produced by [`ComponentKind::tag`].
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<(f64, f64)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<SavedConnection>,
    /// Variant-specific flat numeric record.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
}

/// A complete saved circuit document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedCircuit {
    pub components: Vec<SavedComponent>,
}

// ============ Save ============

/// Serialize a control's registry into the save schema.
pub fn save(control: &Control) -> SavedCircuit {
    let components = control
        .components()
        .iter()
        .map(|comp| {
            let connections = comp
                .outputs
                .iter()
                .map(|w| {
                    let wire = &control.wires()[w.0];
                    SavedConnection {
                        target: wire.target.0,
                        material: Some(Value::from(wire.material.index())),
                        radius: Some(Value::from(wire.radius)),
                        points: wire.points.clone(),
                    }
                })
                .collect();
            SavedComponent {
                kind: comp.kind.tag().to_string(),
                position: Some(comp.position),
                connections,
                data: variant_data(&comp.kind),
            }
        })
        .collect();
    SavedCircuit { components }
}

/// The variant-specific numeric record written on save.
fn variant_data(kind: &ComponentKind) -> BTreeMap<String, Value> {
    let mut data = BTreeMap::new();
    let mut put = |key: &str, v: f64| {
        data.insert(key.to_string(), Value::from(v));
    };
    match kind {
        ComponentKind::Battery(s) | ComponentKind::Cell(s) => put("volts", s.volts),
        ComponentKind::FixedResistor(r) => put("resistance", r.ohms),
        ComponentKind::VariableResistor(v) => {
            put("resistance", v.track_ohms);
            put("fraction", v.fraction);
        }
        ComponentKind::Thermistor(t) => put("resistance", t.ohms_at_ambient),
        ComponentKind::LightSensor(l) => put("resistance", l.dark_ohms),
        ComponentKind::Bulb(b) => {
            put("resistance", b.ohms);
            put("wattage", b.wattage);
        }
        ComponentKind::Switch(s) => put("closed", if s.closed { 1.0 } else { 0.0 }),
        ComponentKind::Diode(d) => put("forward", if d.allow_forward { 1.0 } else { 0.0 }),
        ComponentKind::Capacitor(c) => {
            put("capacitance", c.capacitance);
            put("target", c.target_volts);
        }
        ComponentKind::Heater(h) => put("resistance", h.ohms),
        ComponentKind::Motor(m) => {
            put("resistance", m.ohms);
            put("max-current", m.max_current);
        }
        ComponentKind::TwoWaySwitch(t) => put("selected", t.selected as f64),
        ComponentKind::Led(_)
        | ComponentKind::Connector(_)
        | ComponentKind::Ammeter(_)
        | ComponentKind::Voltmeter(_) => {}
    }
    data
}

// ============ Load ============

/// Rebuild a control from the save schema.
///
/// The result is unassembled; call [`Control::assemble`] with the
/// desired head before ticking.
pub fn load(saved: &SavedCircuit) -> Result<Control> {
    let mut control = Control::new();

    for (index, entry) in saved.components.iter().enumerate() {
        let kind = kind_from_saved(index, entry)?;
        let position = entry.position.unwrap_or((0.0, 0.0));
        control.add_component_at(kind, position);
    }

    for (index, entry) in saved.components.iter().enumerate() {
        for conn in &entry.connections {
            if conn.target >= saved.components.len() {
                return Err(VoltLabError::MissingSavedReference {
                    index,
                    target: conn.target,
                });
            }
            let material = wire_material(index, conn);
            let radius = wire_radius(index, conn);
            let id = control.connect_with(
                crate::circuit::ComponentId(index),
                crate::circuit::ComponentId(conn.target),
                material,
                radius,
            )?;
            control.wires[id.0].points = conn.points.clone();
        }
    }

    info!(
        "loaded saved circuit: {} components, {} wires",
        control.components().len(),
        control.wires().len()
    );
    Ok(control)
}

/// Decode one saved component's variant, applying its data record.
///
/// Field-level problems keep the variant default; an unknown tag fails
/// the load.
fn kind_from_saved(index: usize, entry: &SavedComponent) -> Result<ComponentKind> {
    let data = &entry.data;
    let kind = match entry.kind.as_str() {
        "battery" => ComponentKind::battery(positive(index, data, "volts").unwrap_or(9.0)),
        "cell" => ComponentKind::cell(positive(index, data, "volts").unwrap_or(1.5)),
        "resistor" => ComponentKind::resistor(positive(index, data, "resistance").unwrap_or(1.0)),
        "variable-resistor" => {
            let mut state =
                VariableResistorState::new(positive(index, data, "resistance").unwrap_or(1.0));
            if let Some(f) = number(index, data, "fraction") {
                if (0.0..=1.0).contains(&f) {
                    state.set_fraction(f);
                } else {
                    warn!("saved component {index}: fraction {f} out of range, using default");
                }
            }
            ComponentKind::VariableResistor(state)
        }
        "thermistor" => {
            ComponentKind::thermistor(positive(index, data, "resistance").unwrap_or(1000.0))
        }
        "light-sensor" => {
            ComponentKind::light_sensor(positive(index, data, "resistance").unwrap_or(5000.0))
        }
        "bulb" => ComponentKind::bulb(
            positive(index, data, "resistance").unwrap_or(2.0),
            positive(index, data, "wattage").unwrap_or(10.0),
        ),
        "led" => ComponentKind::led(),
        "switch" => {
            ComponentKind::Switch(SwitchState::new(flag(index, data, "closed").unwrap_or(true)))
        }
        "diode" => {
            if flag(index, data, "forward").unwrap_or(true) {
                ComponentKind::diode()
            } else {
                ComponentKind::diode_reversed()
            }
        }
        "capacitor" => ComponentKind::capacitor(
            positive(index, data, "capacitance").unwrap_or(1e-3),
            positive(index, data, "target").unwrap_or(5.0),
        ),
        "heater" => ComponentKind::heater(positive(index, data, "resistance").unwrap_or(5.0)),
        "motor" => ComponentKind::motor(
            positive(index, data, "resistance").unwrap_or(4.0),
            positive(index, data, "max-current").unwrap_or(1.0),
        ),
        "connector" => ComponentKind::connector(),
        "two-way-switch" => {
            let mut state = TwoWayState::new();
            if flag(index, data, "selected").unwrap_or(false) {
                state.selected = 1;
            }
            ComponentKind::TwoWaySwitch(state)
        }
        "ammeter" => ComponentKind::ammeter(),
        "voltmeter" => ComponentKind::voltmeter(),
        other => {
            return Err(VoltLabError::UnknownSavedType {
                index,
                kind: other.to_string(),
            })
        }
    };
    Ok(kind)
}

/// A finite numeric field, or `None` with a log entry if present but
/// malformed.
fn number(index: usize, data: &BTreeMap<String, Value>, key: &str) -> Option<f64> {
    let value = data.get(key)?;
    match value.as_f64() {
        Some(v) if v.is_finite() => Some(v),
        _ => {
            warn!("saved component {index}: ignoring invalid field '{key}' = {value}");
            None
        }
    }
}

/// A strictly positive numeric field.
fn positive(index: usize, data: &BTreeMap<String, Value>, key: &str) -> Option<f64> {
    let v = number(index, data, key)?;
    if v > 0.0 {
        Some(v)
    } else {
        warn!("saved component {index}: field '{key}' must be positive, got {v}");
        None
    }
}

/// A 0/1 (or boolean) flag field.
fn flag(index: usize, data: &BTreeMap<String, Value>, key: &str) -> Option<bool> {
    match data.get(key)? {
        Value::Bool(b) => Some(*b),
        value => match value.as_f64() {
            Some(v) if v == 0.0 => Some(false),
            Some(v) if v == 1.0 => Some(true),
            _ => {
                warn!("saved component {index}: ignoring invalid flag '{key}' = {value}");
                None
            }
        },
    }
}

/// Decode a connection's material index, keeping the default conductor
/// on a malformed or unknown index.
fn wire_material(index: usize, conn: &SavedConnection) -> WireMaterial {
    let Some(value) = &conn.material else {
        return WireMaterial::default();
    };
    value
        .as_u64()
        .and_then(|i| WireMaterial::from_index(i as usize))
        .unwrap_or_else(|| {
            warn!("saved component {index}: ignoring invalid wire material {value}");
            WireMaterial::default()
        })
}

/// Decode a connection's radius, keeping the default gauge on a
/// malformed value.
fn wire_radius(index: usize, conn: &SavedConnection) -> f64 {
    let Some(value) = &conn.radius else {
        return crate::circuit::Wire::DEFAULT_RADIUS;
    };
    match value.as_f64() {
        Some(r) if r.is_finite() && r > 0.0 => r,
        _ => {
            warn!("saved component {index}: ignoring invalid wire radius {value}");
            crate::circuit::Wire::DEFAULT_RADIUS
        }
    }
}

// ============ File I/O ============

/// Write a control's saved form to a JSON file.
pub fn save_to_path(control: &Control, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(&save(control))
        .map_err(|e| VoltLabError::malformed_save(e.to_string()))?;
    fs::write(path, json).map_err(|source| VoltLabError::SaveIo {
        path: path.display().to_string(),
        source,
    })
}

/// Read a saved circuit from a JSON file and rebuild the control.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Control> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| VoltLabError::SaveIo {
        path: path.display().to_string(),
        source,
    })?;
    let saved: SavedCircuit =
        serde_json::from_str(&text).map_err(|e| VoltLabError::malformed_save(e.to_string()))?;
    load(&saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::ComponentId;

    fn sample_control() -> Control {
        let mut control = Control::new();
        let b = control.add_component_at(ComponentKind::battery(9.0), (10.0, 20.0));
        let v = control.add_component(ComponentKind::variable_resistor(100.0));
        let cap = control.add_component(ComponentKind::capacitor(2200e-6, 5.0));
        control.set_fraction(v, 0.5).unwrap();
        control
            .connect_with(b, v, WireMaterial::Nichrome, 0.5)
            .unwrap();
        control.connect(v, cap).unwrap();
        control.connect(cap, b).unwrap();
        control
    }

    #[test]
    fn test_round_trip_preserves_topology_and_config() {
        let original = sample_control();
        let restored = load(&save(&original)).unwrap();

        assert_eq!(restored.components().len(), original.components().len());
        assert_eq!(restored.wires().len(), original.wires().len());
        for (a, b) in original.wires().iter().zip(restored.wires()) {
            assert_eq!(a.source, b.source);
            assert_eq!(a.target, b.target);
            assert_eq!(a.material, b.material);
            assert!((a.radius - b.radius).abs() < 1e-12);
        }

        assert!((restored.components()[0].position.0 - 10.0).abs() < 1e-12);
        match &restored.components()[1].kind {
            ComponentKind::VariableResistor(v) => {
                assert!((v.track_ohms - 100.0).abs() < 1e-12);
                assert!((v.fraction - 0.5).abs() < 1e-12);
            }
            other => panic!("unexpected kind: {}", other.tag()),
        }
        match &restored.components()[2].kind {
            ComponentKind::Capacitor(c) => {
                assert!((c.capacitance - 2200e-6).abs() < 1e-12);
                assert!((c.target_volts - 5.0).abs() < 1e-12);
            }
            other => panic!("unexpected kind: {}", other.tag()),
        }

        // The restored control assembles and ticks
        let mut restored = restored;
        restored.assemble(ComponentId(0)).unwrap();
        restored.tick().unwrap();
    }

    #[test]
    fn test_invalid_field_keeps_default() {
        let json = r#"{
            "components": [
                { "type": "resistor", "data": { "resistance": "lots" } },
                { "type": "bulb", "data": { "resistance": -3.0, "wattage": 5.0 } }
            ]
        }"#;
        let saved: SavedCircuit = serde_json::from_str(json).unwrap();
        let control = load(&saved).unwrap();

        match &control.components()[0].kind {
            ComponentKind::FixedResistor(r) => assert!((r.ohms - 1.0).abs() < 1e-12),
            other => panic!("unexpected kind: {}", other.tag()),
        }
        match &control.components()[1].kind {
            ComponentKind::Bulb(b) => {
                assert!((b.ohms - 2.0).abs() < 1e-12);
                assert!((b.wattage - 5.0).abs() < 1e-12);
            }
            other => panic!("unexpected kind: {}", other.tag()),
        }
    }

    #[test]
    fn test_unknown_type_fails_load() {
        let json = r#"{ "components": [ { "type": "flux-capacitor" } ] }"#;
        let saved: SavedCircuit = serde_json::from_str(json).unwrap();
        let err = load(&saved).unwrap_err();
        assert!(matches!(err, VoltLabError::UnknownSavedType { index: 0, .. }));
        assert!(err.is_save_data());
    }

    #[test]
    fn test_missing_reference_fails_load() {
        let json = r#"{
            "components": [
                { "type": "battery", "connections": [ { "target": 9 } ] }
            ]
        }"#;
        let saved: SavedCircuit = serde_json::from_str(json).unwrap();
        let err = load(&saved).unwrap_err();
        assert!(matches!(
            err,
            VoltLabError::MissingSavedReference { index: 0, target: 9 }
        ));
    }

    #[test]
    fn test_invalid_wire_geometry_falls_back() {
        let json = r#"{
            "components": [
                { "type": "battery",
                  "connections": [ { "target": 1, "material": 42, "radius": -1.0 } ] },
                { "type": "resistor", "data": { "resistance": 5.0 } }
            ]
        }"#;
        let saved: SavedCircuit = serde_json::from_str(json).unwrap();
        let control = load(&saved).unwrap();
        let wire = &control.wires()[0];
        assert_eq!(wire.material, WireMaterial::default());
        assert!((wire.radius - crate::circuit::Wire::DEFAULT_RADIUS).abs() < 1e-12);
    }

    #[test]
    fn test_switch_and_two_way_state_round_trip() {
        let mut control = Control::new();
        let s = control.add_component(ComponentKind::switch());
        let t = control.add_component(ComponentKind::two_way_switch());
        control.toggle(s).unwrap(); // open
        control.toggle(t).unwrap(); // select slot 1

        let restored = load(&save(&control)).unwrap();
        match &restored.component(s).unwrap().kind {
            ComponentKind::Switch(state) => assert!(!state.closed),
            other => panic!("unexpected kind: {}", other.tag()),
        }
        match &restored.component(t).unwrap().kind {
            ComponentKind::TwoWaySwitch(state) => assert_eq!(state.selected, 1),
            other => panic!("unexpected kind: {}", other.tag()),
        }
    }
}
