//! Assembly-time topology validation.
//!
//! Every configuration error surfaces here, before the first tick; the
//! evaluation pass itself never raises them.

use std::collections::VecDeque;

use super::types::ComponentId;
use super::wire::Wire;
use crate::components::Component;
use crate::error::{Result, VoltLabError};

/// Validate the wire graph ahead of circuit assembly.
///
/// Checks:
/// - The head is a power source
/// - No component exceeds its variant's port arity
/// - Every component is reachable from the head over some wire path
///   (structurally: polarity and conduction state both ignored)
pub fn validate_topology(
    components: &[Component],
    wires: &[Wire],
    head: ComponentId,
) -> Result<()> {
    let head_comp = components
        .get(head.0)
        .ok_or(VoltLabError::ComponentNotFound { component: head })?;
    if !head_comp.is_power_source() {
        return Err(VoltLabError::HeadNotPowerSource { component: head });
    }

    for comp in components {
        if comp.inputs.len() > comp.max_inputs() {
            return Err(VoltLabError::port_arity(
                comp.id,
                "input",
                comp.max_inputs(),
                comp.inputs.len(),
            ));
        }
        if comp.outputs.len() > comp.max_outputs() {
            return Err(VoltLabError::port_arity(
                comp.id,
                "output",
                comp.max_outputs(),
                comp.outputs.len(),
            ));
        }
    }

    let reachable = structural_reach(components, wires, head);
    for comp in components {
        if !reachable[comp.id.0] {
            return Err(VoltLabError::UnreachableComponent { component: comp.id });
        }
    }

    Ok(())
}

/// Components connected to `start` by any chain of wires, ignoring
/// direction and conduction. Open switches and blown parts are still
/// part of the assembled topology.
fn structural_reach(components: &[Component], wires: &[Wire], start: ComponentId) -> Vec<bool> {
    let mut seen = vec![false; components.len()];
    let mut queue = VecDeque::new();
    seen[start.0] = true;
    queue.push_back(start);
    while let Some(c) = queue.pop_front() {
        let comp = &components[c.0];
        let adjacent = comp
            .outputs
            .iter()
            .map(|w| wires[w.0].target)
            .chain(comp.inputs.iter().map(|w| wires[w.0].source));
        for n in adjacent {
            if !seen[n.0] {
                seen[n.0] = true;
                queue.push_back(n);
            }
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentKind;
    use crate::engine::Control;

    #[test]
    fn test_head_must_be_power_source() {
        let mut control = Control::new();
        let r = control.add_component(ComponentKind::resistor(5.0));
        let err = validate_topology(control.components(), control.wires(), r).unwrap_err();
        assert!(matches!(err, VoltLabError::HeadNotPowerSource { .. }));
    }

    #[test]
    fn test_unreachable_component_is_rejected() {
        let mut control = Control::new();
        let b = control.add_component(ComponentKind::battery(9.0));
        let r = control.add_component(ComponentKind::resistor(5.0));
        control.connect(b, r).unwrap();
        control.connect(r, b).unwrap();
        // Stray component with no wires at all
        let stray = control.add_component(ComponentKind::bulb(2.0, 10.0));

        let err = validate_topology(control.components(), control.wires(), b).unwrap_err();
        match err {
            VoltLabError::UnreachableComponent { component } => assert_eq!(component, stray),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_simple_loop_validates() {
        let mut control = Control::new();
        let b = control.add_component(ComponentKind::battery(9.0));
        let r = control.add_component(ComponentKind::resistor(5.0));
        control.connect(b, r).unwrap();
        control.connect(r, b).unwrap();
        assert!(validate_topology(control.components(), control.wires(), b).is_ok());
    }
}
