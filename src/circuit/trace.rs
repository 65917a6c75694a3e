//! The trace walk: reachability and loop queries over the wire graph.
//!
//! `trace` performs a depth-first walk along wire edges. In restrained
//! mode it only follows conventional current-flow direction (a
//! component's output wires into their targets); unrestrained mode also
//! walks input wires backwards, which makes the query independent of
//! circuit polarity. Each component is visited at most once per walk,
//! so the closed loop topology cannot recurse forever.
//!
//! The walk honors flow constraints: it will not pass through a
//! component that cannot conduct (blown, open switch, locked diode),
//! and it only leaves a two-way switch through the selected output.
//! Structural reachability that ignores conduction lives in the
//! validation pass instead.
//!
//! The capacitor state machine is the main consumer: it asks whether it
//! can reach the power source (round trip required) and whether a
//! discharge loop back onto itself exists.

use log::trace as log_trace;

use super::types::{ComponentId, WireId};
use super::wire::Wire;
use crate::components::Component;

/// Find a directed path from `start` to `target` over the wire graph.
///
/// Returns the ordered component sequence excluding `start` and
/// including `target`, or `None` if no path exists.
///
/// * `unrestrained` - also walk input wires against flow direction
/// * `must_return` - additionally require a walk from `target` back to
///   `start` in the same mode, confirming a genuine round-trip loop
///
/// A query with `start == target` never succeeds on the trivial
/// zero-length path; at least one edge must be traversed.
pub fn trace(
    components: &[Component],
    wires: &[Wire],
    start: ComponentId,
    target: ComponentId,
    unrestrained: bool,
    must_return: bool,
) -> Option<Vec<ComponentId>> {
    let mut visited = vec![false; components.len()];
    let mut path = Vec::new();
    visited[start.0] = true;

    if !walk(
        components,
        wires,
        start,
        target,
        unrestrained,
        None,
        &mut visited,
        &mut path,
    ) {
        return None;
    }

    if must_return {
        // The return leg only needs to exist; its path is discarded.
        let mut back_visited = vec![false; components.len()];
        let mut back_path = Vec::new();
        back_visited[target.0] = true;
        if !walk(
            components,
            wires,
            target,
            start,
            unrestrained,
            None,
            &mut back_visited,
            &mut back_path,
        ) {
            log_trace!("trace {start}->{target}: forward ok, no return leg");
            return None;
        }
    }

    Some(path)
}

/// Recursive DFS step. On success `path` holds the components after
/// `current` up to and including `target`.
#[allow(clippy::too_many_arguments)]
fn walk(
    components: &[Component],
    wires: &[Wire],
    current: ComponentId,
    target: ComponentId,
    unrestrained: bool,
    arrived_by: Option<WireId>,
    visited: &mut [bool],
    path: &mut Vec<ComponentId>,
) -> bool {
    for (via, next) in neighbors(components, wires, current, unrestrained) {
        // An unrestrained walk may not immediately double back along
        // the wire it arrived by; that is not a loop.
        if Some(via) == arrived_by {
            continue;
        }
        // Arrival at the target is checked before the visited guard so
        // that a walk may close back onto its own starting point.
        if next == target {
            path.push(next);
            return true;
        }
        if visited[next.0] || !conducts(&components[next.0]) {
            continue;
        }
        visited[next.0] = true;
        path.push(next);
        if walk(
            components,
            wires,
            next,
            target,
            unrestrained,
            Some(via),
            visited,
            path,
        ) {
            return true;
        }
        path.pop();
    }
    false
}

/// Edge successors of `current`, in deterministic declaration order.
///
/// A two-way switch acting as a fork is only left through its selected
/// output.
fn neighbors(
    components: &[Component],
    wires: &[Wire],
    current: ComponentId,
    unrestrained: bool,
) -> Vec<(WireId, ComponentId)> {
    let comp = &components[current.0];
    let selected = comp.selected_branch();
    let mut out: Vec<(WireId, ComponentId)> = comp
        .outputs
        .iter()
        .enumerate()
        .filter(|(slot, _)| match selected {
            Some(sel) if comp.outputs.len() == 2 => *slot == sel,
            _ => true,
        })
        .map(|(_, w)| (*w, wires[w.0].target))
        .collect();
    if unrestrained {
        out.extend(comp.inputs.iter().map(|w| (*w, wires[w.0].source)));
    }
    out
}

/// Whether a walk may pass through this component.
fn conducts(comp: &Component) -> bool {
    use crate::components::ComponentKind;
    if comp.blown || comp.resistance >= crate::R_INFINITE {
        return false;
    }
    !matches!(&comp.kind, ComponentKind::Switch(s) if !s.closed)
}

/// Total series resistance along a traced path.
///
/// Sums member resistances, saturating at the open-circuit sentinel.
pub fn path_resistance(components: &[Component], path: &[ComponentId]) -> f64 {
    let sum: f64 = path.iter().map(|id| components[id.0].resistance).sum();
    sum.min(crate::R_INFINITE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentKind;
    use crate::engine::Control;

    /// battery -> r1 -> r2 -> battery
    fn simple_loop() -> (Control, ComponentId, ComponentId, ComponentId) {
        let mut control = Control::new();
        let b = control.add_component(ComponentKind::battery(10.0));
        let r1 = control.add_component(ComponentKind::resistor(2.0));
        let r2 = control.add_component(ComponentKind::resistor(3.0));
        control.connect(b, r1).unwrap();
        control.connect(r1, r2).unwrap();
        control.connect(r2, b).unwrap();
        (control, b, r1, r2)
    }

    #[test]
    fn test_trace_follows_flow_direction() {
        let (control, b, r1, r2) = simple_loop();
        let path = trace(control.components(), control.wires(), b, r2, false, false).unwrap();
        assert_eq!(path, vec![r1, r2]);
    }

    #[test]
    fn test_trace_against_flow_requires_unrestrained() {
        let mut control = Control::new();
        let b = control.add_component(ComponentKind::battery(10.0));
        let r = control.add_component(ComponentKind::resistor(5.0));
        control.connect(b, r).unwrap();
        // Open chain: r's only edge is the incoming wire from b, so a
        // restrained walk from r goes nowhere.
        assert!(trace(control.components(), control.wires(), r, b, false, false).is_none());

        let path = trace(control.components(), control.wires(), r, b, true, false).unwrap();
        assert_eq!(path, vec![b]);
    }

    #[test]
    fn test_self_trace_on_loop() {
        let (control, b, _r1, _r2) = simple_loop();
        let path = trace(control.components(), control.wires(), b, b, true, false).unwrap();
        assert!(!path.is_empty());
        assert_eq!(*path.last().unwrap(), b);
    }

    #[test]
    fn test_self_trace_without_loop_is_none() {
        let mut control = Control::new();
        let b = control.add_component(ComponentKind::battery(10.0));
        let r = control.add_component(ComponentKind::resistor(5.0));
        control.connect(b, r).unwrap();
        // No wire back: open chain, no self-loop
        assert!(trace(control.components(), control.wires(), b, b, true, false).is_none());
    }

    #[test]
    fn test_must_return_rejects_one_way_paths() {
        let mut control = Control::new();
        let b = control.add_component(ComponentKind::battery(10.0));
        let r = control.add_component(ComponentKind::resistor(5.0));
        control.connect(b, r).unwrap();

        assert!(trace(control.components(), control.wires(), b, r, false, false).is_some());
        assert!(trace(control.components(), control.wires(), b, r, false, true).is_none());

        let (closed, b, _r1, r2) = simple_loop();
        assert!(trace(closed.components(), closed.wires(), b, r2, false, true).is_some());
    }

    #[test]
    fn test_path_resistance_sums_members() {
        let (control, b, _r1, _r2) = simple_loop();
        let path = trace(control.components(), control.wires(), b, b, false, false).unwrap();
        // Path r1 -> r2 -> battery: 2 + 3 + 0
        assert!((path_resistance(control.components(), &path) - 5.0).abs() < 1e-12);
    }
}
