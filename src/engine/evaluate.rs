//! The per-tick evaluation pass.
//!
//! One tick is one synchronous walk from the head's circuit: refresh
//! resistances, reassert switch and two-way break bookkeeping, solve
//! the loop current, propagate it through every segment (junctions fan
//! out into their branches and back in), then run the component state
//! machines in traversal order. A visited guard ensures no component
//! is evaluated twice even though the topology closes back on the
//! head.
//!
//! All values written this tick are derived from the previous tick's
//! state, which is what makes the pass deterministic and order-stable.

use log::{debug, warn};

use crate::circuit::{path_resistance, trace, CircuitId, ComponentId};
use crate::components::{CapacitorPhase, Component, ComponentKind, DiodeState, LockTransition};
use crate::engine::control::Control;
use crate::error::{Result, VoltLabError};
use crate::{R_INFINITE, R_SHORT_FLOOR};

/// Ohm's law with the open/short conventions applied.
fn ohm_current(voltage: f64, resistance: f64) -> f64 {
    if resistance >= R_INFINITE {
        0.0
    } else {
        voltage / resistance.max(R_SHORT_FLOOR)
    }
}

/// LED light contribution while conducting.
const LED_LIGHT: f64 = 0.2;

/// Minimum current for an LED to visibly light.
const LED_THRESHOLD: f64 = 0.005;

pub(crate) fn run_tick(control: &mut Control) -> Result<()> {
    let head = control.head.ok_or(VoltLabError::NotAssembled)?;
    let root = control.components[head.0]
        .circuit
        .ok_or(VoltLabError::NotAssembled)?;

    refresh_resistances(control);
    reassert_breaks(control)?;

    // Solve the loop from the head
    let emf = control.components[head.0].emf();
    let total_r = circuit_resistance(control, root);
    let loop_current = if control.circuits[root.0].is_broken() {
        0.0
    } else {
        ohm_current(emf, total_r)
    };
    debug!(
        "tick {}: R_total={total_r:.4}, I_loop={loop_current:.4}",
        control.env.tick
    );

    // Propagate current, recording traversal order under the visited
    // guard
    let mut visited = vec![false; control.components.len()];
    let mut order = Vec::with_capacity(control.components.len());
    assign_segment(control, root, loop_current, &mut visited, &mut order);

    // Component state machines, in traversal order
    for &id in &order {
        step_component(control, id, head)?;
    }

    control.env.tick += 1;
    Ok(())
}

/// Refresh every component's resistance from its variant state and the
/// environment.
fn refresh_resistances(control: &mut Control) {
    let env = control.env.clone();
    for comp in &mut control.components {
        comp.resistance = comp.base_resistance(&env);
    }
}

/// Reassert switch breaks and two-way branch routing.
///
/// Both operations are idempotent, so running them every tick keeps
/// circuit state consistent with component state regardless of when
/// the external toggle landed.
fn reassert_breaks(control: &mut Control) -> Result<()> {
    for i in 0..control.components.len() {
        let id = ComponentId(i);
        match &control.components[i].kind {
            ComponentKind::Switch(s) => {
                let closed = s.closed;
                if let Some(cid) = control.components[i].circuit {
                    if closed {
                        control.circuits[cid.0].clear_break(id);
                    } else {
                        control.circuits[cid.0].declare_break(id);
                    }
                }
            }
            ComponentKind::TwoWaySwitch(t) => {
                let selected = t.selected;
                let branches = t.junction.branches;
                // Only a real fork routes; in series the two-way is a
                // plain pass-through
                if control.components[i].outputs.len() == 2 {
                    if branches[selected].is_none() {
                        return Err(VoltLabError::NoBranchSelected { component: id });
                    }
                    for (slot, branch) in branches.into_iter().enumerate() {
                        if let Some(b) = branch {
                            if slot == selected {
                                control.circuits[b.0].clear_break(id);
                            } else {
                                control.circuits[b.0].declare_break(id);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Total series resistance of a circuit segment, substituting the
/// branch combinator for junction members.
fn circuit_resistance(control: &Control, cid: CircuitId) -> f64 {
    let circuit = &control.circuits[cid.0];
    let mut sum = 0.0;
    for &id in &circuit.components {
        let comp = &control.components[id.0];
        sum += if comp.is_junction() {
            junction_resistance(control, comp)
        } else {
            comp.resistance
        };
    }
    for &w in &circuit.wires {
        sum += control.wires[w.0].extra_resistance();
    }
    sum.min(R_INFINITE)
}

/// Effective resistance a junction presents to its parent segment.
fn junction_resistance(control: &Control, comp: &Component) -> f64 {
    let branches = comp.branches().unwrap_or_default();
    if branches == [None, None] {
        // Series pass-through, no fork assembled
        return comp.resistance;
    }
    let r0 = effective_branch_resistance(control, branches[0]);
    let r1 = effective_branch_resistance(control, branches[1]);
    crate::components::parallel_resistance(r0, r1)
}

/// A missing or broken branch is an open circuit.
fn effective_branch_resistance(control: &Control, branch: Option<CircuitId>) -> f64 {
    match branch {
        None => R_INFINITE,
        Some(b) => {
            if control.circuits[b.0].is_broken() {
                R_INFINITE
            } else {
                circuit_resistance(control, b)
            }
        }
    }
}

/// Assign current and voltage through one segment, fanning out into
/// junction branches.
fn assign_segment(
    control: &mut Control,
    cid: CircuitId,
    current: f64,
    visited: &mut [bool],
    order: &mut Vec<ComponentId>,
) {
    let current = if control.circuits[cid.0].is_broken() {
        0.0
    } else {
        current
    };
    let members = control.circuits[cid.0].components.clone();
    for id in members {
        if visited[id.0] {
            continue;
        }
        visited[id.0] = true;
        order.push(id);

        let comp = &mut control.components[id.0];
        comp.current = current;
        if comp.is_power_source() {
            comp.voltage = comp.emf();
            continue;
        }
        if !comp.is_junction() {
            let v = current * comp.resistance;
            comp.voltage = if v.is_finite() { v } else { 0.0 };
            continue;
        }

        // Junction: voltage across the combinator, then split
        let branches = control.components[id.0].branches().unwrap_or_default();
        if branches == [None, None] {
            control.components[id.0].voltage = 0.0;
            continue;
        }
        let r0 = effective_branch_resistance(control, branches[0]);
        let r1 = effective_branch_resistance(control, branches[1]);
        let r_junction = crate::components::parallel_resistance(r0, r1);
        let v_across = if r_junction >= R_INFINITE {
            0.0
        } else {
            current * r_junction
        };
        control.components[id.0].voltage = v_across;

        let active = [r0 < R_INFINITE, r1 < R_INFINITE];
        for (slot, branch) in branches.into_iter().enumerate() {
            let Some(branch) = branch else { continue };
            let branch_current = match (active[0], active[1]) {
                // Sole active branch carries everything
                (true, false) if slot == 0 => current,
                (false, true) if slot == 1 => current,
                // Parallel division when both conduct
                (true, true) => ohm_current(v_across, [r0, r1][slot]),
                _ => 0.0,
            };
            assign_segment(control, branch, branch_current, visited, order);
        }
    }
}

/// Run one component's state machine for this tick.
fn step_component(control: &mut Control, id: ComponentId, head: ComponentId) -> Result<()> {
    let dt = control.env.dt();
    let tick = control.env.tick;
    let running = control.env.running;
    let i = id.0;

    match &control.components[i].kind {
        ComponentKind::Diode(_) => step_diode(control, id),
        ComponentKind::Led(_) => {
            step_diode(control, id);
            step_led_light(control, id);
        }
        ComponentKind::Bulb(_) => step_bulb(control, id, running),
        ComponentKind::Heater(_) => {
            let current = control.components[i].current;
            let on = control.components[i].on && current.abs() > 0.0;
            let delta = match &mut control.components[i].kind {
                ComponentKind::Heater(h) => {
                    if on {
                        h.heat_step(current, dt)
                    } else {
                        h.cool_step(dt, tick)
                    }
                }
                _ => unreachable!(),
            };
            control.env.add_temperature(delta);
        }
        ComponentKind::Motor(_) => {
            let current = control.components[i].current;
            let blown = control.components[i].blown;
            if let ComponentKind::Motor(m) = &mut control.components[i].kind {
                if !blown {
                    m.spin_step(current);
                }
            }
        }
        ComponentKind::Capacitor(_) => step_capacitor(control, id, head),
        ComponentKind::Ammeter(_) => {
            let current = control.components[i].current;
            if let ComponentKind::Ammeter(m) = &mut control.components[i].kind {
                m.reading = current;
            }
        }
        ComponentKind::Voltmeter(_) => {
            let voltage = control.components[i].voltage;
            if let ComponentKind::Voltmeter(m) = &mut control.components[i].kind {
                m.reading = voltage;
            }
        }
        // Switches and sources are handled before the solve; fixed and
        // sensing resistors have no per-tick state of their own
        _ => {}
    }
    Ok(())
}

/// Diode lock/unlock against the observed current direction.
fn step_diode(control: &mut Control, id: ComponentId) {
    let current = control.components[id.0].current;
    let transition = match &mut control.components[id.0].kind {
        ComponentKind::Diode(d) | ComponentKind::Led(d) => d.observe(current),
        _ => None,
    };
    let Some(transition) = transition else { return };
    let cid = control.components[id.0].circuit;
    match transition {
        LockTransition::Locked => {
            control.components[id.0].resistance = R_INFINITE;
            if let Some(cid) = cid {
                control.circuits[cid.0].declare_break(id);
            }
            debug!("{id} locked against reverse current");
        }
        LockTransition::Unlocked => {
            control.components[id.0].resistance = DiodeState::R_FORWARD;
            if let Some(cid) = cid {
                control.circuits[cid.0].clear_break(id);
            }
            debug!("{id} unlocked");
        }
    }
}

/// LED luminosity with an incremental environment write.
fn step_led_light(control: &mut Control, id: ComponentId) {
    let comp = &control.components[id.0];
    let locked = matches!(&comp.kind, ComponentKind::Led(d) if d.locked);
    let lit = !comp.blown && !locked && comp.current > LED_THRESHOLD;
    let was_lit = comp.luminous;
    control.components[id.0].luminous = lit;
    if lit != was_lit {
        let delta = if lit { LED_LIGHT } else { -LED_LIGHT };
        control.env.add_light(delta);
    }
}

/// Bulb overload and luminosity.
fn step_bulb(control: &mut Control, id: ComponentId, running: bool) {
    let comp = &control.components[id.0];
    let ComponentKind::Bulb(b) = &comp.kind else { return };
    let voltage = comp.voltage;
    let current = comp.current;
    let broken = comp
        .circuit
        .map(|cid| control.circuits[cid.0].is_broken())
        .unwrap_or(true);

    let mut blown = comp.blown;
    if !blown && running && !broken && b.overloaded(voltage, current) {
        warn!(
            "{id} blown: |{voltage:.2}V * {current:.2}A| exceeds {}W",
            b.wattage
        );
        blown = true;
    }
    let brightness = if blown {
        0.0
    } else {
        b.brightness(voltage, current)
    };
    let previously_emitted = b.emitted;

    let comp = &mut control.components[id.0];
    comp.blown = blown;
    comp.luminous = brightness > 0.0;
    if blown {
        comp.resistance = R_INFINITE;
    }
    if let ComponentKind::Bulb(b) = &mut comp.kind {
        b.emitted = brightness;
    }
    control.env.add_light(brightness - previously_emitted);
}

/// Capacitor phase resolution and RC stepping.
fn step_capacitor(control: &mut Control, id: ComponentId, head: ComponentId) {
    let dt = control.env.dt();

    let power_path = trace(&control.components, &control.wires, id, head, true, true);
    let self_path = trace(&control.components, &control.wires, id, id, true, false);
    let can_reach_power = power_path.is_some();
    let has_self_loop = self_path.is_some();

    let phase = match &mut control.components[id.0].kind {
        ComponentKind::Capacitor(c) => c.resolve_phase(can_reach_power, has_self_loop),
        _ => return,
    };

    match phase {
        CapacitorPhase::Charging | CapacitorPhase::Full => {
            let path = power_path.unwrap_or_default();
            // Charge through the access path plus the capacitor's own
            // series resistance (the path excludes its start)
            let r_path = path_resistance(&control.components, &path)
                + control.components[id.0].resistance;
            let plate_voltage = match &mut control.components[id.0].kind {
                ComponentKind::Capacitor(c) => {
                    c.charge_step(dt, r_path);
                    c.voltage
                }
                _ => return,
            };
            control.components[id.0].voltage = plate_voltage;
        }
        CapacitorPhase::Discharging => {
            let path = self_path.unwrap_or_default();
            let r_path = path_resistance(&control.components, &path);
            let (discharge_current, plate_voltage) = match &mut control.components[id.0].kind {
                ComponentKind::Capacitor(c) => {
                    c.discharge_step(dt, r_path);
                    (c.discharge_current(), c.voltage)
                }
                _ => return,
            };
            // The discharge loop carries the capacitor's current for
            // this tick
            for pid in path {
                let comp = &mut control.components[pid.0];
                comp.current = discharge_current;
                let v = discharge_current * comp.resistance;
                comp.voltage = if v.is_finite() { v } else { 0.0 };
            }
            control.components[id.0].voltage = plate_voltage;
        }
        CapacitorPhase::Null => {
            // Hold the (possibly stranded) charge
            let plate_voltage = match &control.components[id.0].kind {
                ComponentKind::Capacitor(c) => c.voltage,
                _ => return,
            };
            control.components[id.0].voltage = plate_voltage;
        }
    }
}
