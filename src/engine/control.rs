//! The `Control`: owner of the component/wire/circuit arenas and the
//! entry point for assembly, external triggers, and ticking.
//!
//! All cross-references are stable indices into the arenas, so the
//! graph has no ownership cycles even though the electrical topology
//! is a closed loop.

use std::collections::VecDeque;

use log::{debug, info};

use crate::circuit::{validate_topology, Circuit, CircuitId, ComponentId, Wire, WireId, WireMaterial};
use crate::components::{Adjustable, Component, ComponentKind, Togglable};
use crate::engine::env::EnvironmentContext;
use crate::engine::evaluate;
use crate::error::{Result, VoltLabError};
use crate::AMBIENT_TEMPERATURE;

/// Process-wide simulation state for one circuit instance.
#[derive(Debug)]
pub struct Control {
    pub(crate) components: Vec<Component>,
    pub(crate) wires: Vec<Wire>,
    pub(crate) circuits: Vec<Circuit>,
    pub(crate) head: Option<ComponentId>,
    pub(crate) env: EnvironmentContext,
    /// Whether the renderer should draw value overlays; carried state
    /// for the UI layer, never read by the solver.
    pub show_info: bool,
}

impl Control {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
            wires: Vec::new(),
            circuits: Vec::new(),
            head: None,
            env: EnvironmentContext::default(),
            show_info: false,
        }
    }

    // ============ Registry ============

    /// Register a component and return its stable id.
    pub fn add_component(&mut self, kind: ComponentKind) -> ComponentId {
        let id = ComponentId(self.components.len());
        self.components.push(Component::new(id, kind));
        id
    }

    /// Register a component with a canvas position.
    pub fn add_component_at(&mut self, kind: ComponentKind, position: (f64, f64)) -> ComponentId {
        let id = self.add_component(kind);
        self.components[id.0].position = position;
        id
    }

    /// Wire `source`'s output port into `target`'s input port.
    pub fn connect(&mut self, source: ComponentId, target: ComponentId) -> Result<WireId> {
        self.connect_with(source, target, WireMaterial::default(), Wire::DEFAULT_RADIUS)
    }

    /// Wire two components with explicit conductor geometry.
    pub fn connect_with(
        &mut self,
        source: ComponentId,
        target: ComponentId,
        material: WireMaterial,
        radius: f64,
    ) -> Result<WireId> {
        for id in [source, target] {
            if id.0 >= self.components.len() {
                return Err(VoltLabError::ComponentNotFound { component: id });
            }
        }
        let src = &self.components[source.0];
        if src.outputs.len() >= src.max_outputs() {
            return Err(VoltLabError::port_arity(
                source,
                "output",
                src.max_outputs(),
                src.outputs.len() + 1,
            ));
        }
        let tgt = &self.components[target.0];
        if tgt.inputs.len() >= tgt.max_inputs() {
            return Err(VoltLabError::port_arity(
                target,
                "input",
                tgt.max_inputs(),
                tgt.inputs.len() + 1,
            ));
        }

        let id = WireId(self.wires.len());
        self.wires
            .push(Wire::new(id, source, target).with_geometry(material, radius));
        self.components[source.0].outputs.push(id);
        self.components[target.0].inputs.push(id);
        Ok(id)
    }

    // ============ Read accessors (render contract) ============

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    pub fn circuits(&self) -> &[Circuit] {
        &self.circuits
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0)
    }

    pub fn head(&self) -> Option<ComponentId> {
        self.head
    }

    pub fn env(&self) -> &EnvironmentContext {
        &self.env
    }

    /// Circuit segment a component belongs to, if assembled.
    pub fn circuit_of(&self, id: ComponentId) -> Option<&Circuit> {
        let cid = self.components.get(id.0)?.circuit?;
        self.circuits.get(cid.0)
    }

    // ============ Assembly ============

    /// Build the circuit set from the wire graph, rooted at `head`.
    ///
    /// Walks output wires from the head until the loop closes back on
    /// it. A component with two output wires forks: its branches are
    /// walked until they reconverge on a merge component, each branch
    /// becoming a child circuit owned by the junction. All
    /// configuration errors surface here, before the first tick.
    pub fn assemble(&mut self, head: ComponentId) -> Result<()> {
        validate_topology(&self.components, &self.wires, head)?;

        self.circuits.clear();
        for comp in &mut self.components {
            comp.circuit = None;
            if let Some(branches) = match &mut comp.kind {
                ComponentKind::Connector(j) => Some(&mut j.branches),
                ComponentKind::TwoWaySwitch(t) => Some(&mut t.junction.branches),
                _ => None,
            } {
                *branches = [None, None];
            }
        }

        let root = self.new_circuit();
        self.build_segment(root, head, head)?;
        self.head = Some(head);
        info!(
            "assembled {} components into {} circuit segment(s), head {head}",
            self.components.len(),
            self.circuits.len()
        );
        Ok(())
    }

    fn new_circuit(&mut self) -> CircuitId {
        let id = CircuitId(self.circuits.len());
        self.circuits.push(Circuit::new(id));
        id
    }

    /// Walk from `start` (inclusive) until reaching `stop` (exclusive),
    /// appending members to circuit `cid` and recursing into junction
    /// branches.
    fn build_segment(&mut self, cid: CircuitId, start: ComponentId, stop: ComponentId) -> Result<()> {
        let mut current = start;
        loop {
            if self.components[current.0].circuit.is_some() {
                // Two walks reached the same component: overlapping
                // branch circuits
                return Err(VoltLabError::DuplicateBranchAssignment { circuit: cid });
            }
            self.components[current.0].circuit = Some(cid);
            self.circuits[cid.0].components.push(current);

            let outputs = self.components[current.0].outputs.clone();
            let next = match outputs.len() {
                0 => return Err(VoltLabError::OpenLoop { last: current }),
                1 => {
                    self.circuits[cid.0].wires.push(outputs[0]);
                    self.wires[outputs[0].0].target
                }
                _ => self.build_junction(cid, current, &outputs)?,
            };

            if next == stop {
                return Ok(());
            }
            current = next;
        }
    }

    /// Build the two branch circuits of a fork and return the merge
    /// component where the outer walk resumes.
    fn build_junction(
        &mut self,
        _outer: CircuitId,
        junction: ComponentId,
        outputs: &[WireId],
    ) -> Result<ComponentId> {
        let head0 = self.wires[outputs[0].0].target;
        let head1 = self.wires[outputs[1].0].target;

        // The merge point is the nearest component (by hops from the
        // first branch head) that both branches can reach with the
        // current flow direction. The walks stop at the junction
        // itself, so the wrap-around through the rest of the loop does
        // not count as reconvergence.
        let d0 = self.flow_distances(head0, junction);
        let d1 = self.flow_distances(head1, junction);
        let merge = (0..self.components.len())
            .filter_map(|i| d0[i].zip(d1[i]).map(|(hops, _)| (hops, i)))
            .min_by_key(|(hops, _)| *hops)
            .map(|(_, i)| ComponentId(i))
            .ok_or(VoltLabError::UnterminatedBranch { junction })?;

        debug!("junction {junction} branches merge at {merge}");

        for (slot, branch_head) in [head0, head1].into_iter().enumerate() {
            let branch = self.new_circuit();
            self.circuits[branch.0].wires.push(outputs[slot]);
            match &mut self.components[junction.0].kind {
                ComponentKind::Connector(j) => j.set_branch(slot, branch),
                ComponentKind::TwoWaySwitch(t) => t.junction.set_branch(slot, branch),
                _ => unreachable!("only junction variants have two outputs"),
            }
            // A wire straight to the merge is a valid zero-resistance
            // branch with no members of its own
            if branch_head != merge {
                self.build_segment(branch, branch_head, merge)?;
            }
        }
        Ok(merge)
    }

    /// BFS hop counts from `start` following output wires only.
    ///
    /// `blocked` may be reached but is never expanded.
    fn flow_distances(&self, start: ComponentId, blocked: ComponentId) -> Vec<Option<usize>> {
        let mut dist = vec![None; self.components.len()];
        let mut queue = VecDeque::new();
        dist[start.0] = Some(0);
        queue.push_back(start);
        while let Some(c) = queue.pop_front() {
            if c == blocked {
                continue;
            }
            let d = dist[c.0].unwrap_or(0);
            for w in &self.components[c.0].outputs {
                let t = self.wires[w.0].target;
                if dist[t.0].is_none() {
                    dist[t.0] = Some(d + 1);
                    queue.push_back(t);
                }
            }
        }
        dist
    }

    // ============ Tick driver ============

    /// Run one evaluation pass over the assembled circuit.
    pub fn tick(&mut self) -> Result<()> {
        evaluate::run_tick(self)
    }

    /// Pause or resume overload checks and integrators.
    pub fn set_running(&mut self, running: bool) {
        self.env.running = running;
    }

    // ============ External triggers (input contract) ============

    /// Toggle a switch or two-way switch.
    pub fn toggle(&mut self, id: ComponentId) -> Result<()> {
        let comp = self
            .components
            .get_mut(id.0)
            .ok_or(VoltLabError::ComponentNotFound { component: id })?;
        match &mut comp.kind {
            ComponentKind::Switch(s) => {
                s.toggle();
                let closed = s.closed;
                let cid = comp.circuit;
                if let Some(cid) = cid {
                    if closed {
                        self.circuits[cid.0].clear_break(id);
                    } else {
                        self.circuits[cid.0].declare_break(id);
                    }
                }
                Ok(())
            }
            ComponentKind::TwoWaySwitch(t) => {
                t.toggle();
                // Branch break bookkeeping is reasserted at tick start
                Ok(())
            }
            _ => Err(VoltLabError::UnsupportedTrigger {
                component: id,
                trigger: "toggle",
            }),
        }
    }

    /// Select a two-way switch's active branch slot directly.
    pub fn select_branch(&mut self, id: ComponentId, slot: usize) -> Result<()> {
        let comp = self
            .components
            .get_mut(id.0)
            .ok_or(VoltLabError::ComponentNotFound { component: id })?;
        match &mut comp.kind {
            ComponentKind::TwoWaySwitch(t) => {
                t.selected = slot.min(1);
                Ok(())
            }
            _ => Err(VoltLabError::UnsupportedTrigger {
                component: id,
                trigger: "select_branch",
            }),
        }
    }

    /// Set a variable resistor's slider position.
    pub fn set_fraction(&mut self, id: ComponentId, fraction: f64) -> Result<()> {
        let comp = self
            .components
            .get_mut(id.0)
            .ok_or(VoltLabError::ComponentNotFound { component: id })?;
        match &mut comp.kind {
            ComponentKind::VariableResistor(v) => {
                v.set_fraction(fraction);
                Ok(())
            }
            _ => Err(VoltLabError::UnsupportedTrigger {
                component: id,
                trigger: "set_fraction",
            }),
        }
    }

    /// Adjust a power source's EMF.
    pub fn set_source_volts(&mut self, id: ComponentId, volts: f64) -> Result<()> {
        let comp = self
            .components
            .get_mut(id.0)
            .ok_or(VoltLabError::ComponentNotFound { component: id })?;
        match &mut comp.kind {
            ComponentKind::Battery(s) | ComponentKind::Cell(s) => {
                s.set_volts(volts);
                Ok(())
            }
            _ => Err(VoltLabError::UnsupportedTrigger {
                component: id,
                trigger: "set_source_volts",
            }),
        }
    }

    /// Switch a component's own on/off state (heaters and similar).
    pub fn set_on(&mut self, id: ComponentId, on: bool) -> Result<()> {
        let comp = self
            .components
            .get_mut(id.0)
            .ok_or(VoltLabError::ComponentNotFound { component: id })?;
        comp.on = on;
        Ok(())
    }

    /// Replace a blown component with a fresh part of the same rating.
    pub fn replace_blown(&mut self, id: ComponentId) -> Result<()> {
        let comp = self
            .components
            .get_mut(id.0)
            .ok_or(VoltLabError::ComponentNotFound { component: id })?;
        comp.replace_blown();
        Ok(())
    }

    // ============ Environment recomputation (explicit, not reactive) ============

    /// Recompute the aggregate light level from all luminous
    /// components. Call after any topology or state change that could
    /// affect it.
    pub fn update_light_level(&mut self) {
        let mut level = 0.0;
        for comp in &self.components {
            if !comp.luminous {
                continue;
            }
            level += match &comp.kind {
                ComponentKind::Bulb(b) => b.brightness(comp.voltage, comp.current),
                ComponentKind::Led(_) => 0.2,
                _ => 0.0,
            };
        }
        self.env.light_level = level.clamp(0.0, 1.0);
    }

    /// Recompute the aggregate temperature from all heat-emitting
    /// components. Call after any topology or state change that could
    /// affect it.
    pub fn update_temp(&mut self) {
        let mut temp = AMBIENT_TEMPERATURE;
        for comp in &self.components {
            if let ComponentKind::Heater(h) = &comp.kind {
                temp += h.temperature();
            }
        }
        self.env.temperature = temp;
    }
}

impl Default for Control {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_enforces_arity() {
        let mut control = Control::new();
        let b = control.add_component(ComponentKind::battery(9.0));
        let r1 = control.add_component(ComponentKind::resistor(2.0));
        let r2 = control.add_component(ComponentKind::resistor(3.0));
        control.connect(b, r1).unwrap();

        let err = control.connect(b, r2).unwrap_err();
        assert!(matches!(err, VoltLabError::PortArityExceeded { .. }));
    }

    #[test]
    fn test_assemble_simple_loop() {
        let mut control = Control::new();
        let b = control.add_component(ComponentKind::battery(9.0));
        let r = control.add_component(ComponentKind::resistor(5.0));
        control.connect(b, r).unwrap();
        control.connect(r, b).unwrap();

        control.assemble(b).unwrap();
        assert_eq!(control.circuits().len(), 1);
        let root = &control.circuits()[0];
        assert_eq!(root.components, vec![b, r]);
        assert_eq!(control.head(), Some(b));
    }

    #[test]
    fn test_assemble_parallel_branches() {
        // battery -> connector ==(r1 | r2)== merge -> battery
        let mut control = Control::new();
        let b = control.add_component(ComponentKind::battery(9.0));
        let fork = control.add_component(ComponentKind::connector());
        let r1 = control.add_component(ComponentKind::resistor(2.0));
        let r2 = control.add_component(ComponentKind::resistor(3.0));
        let merge = control.add_component(ComponentKind::connector());
        control.connect(b, fork).unwrap();
        control.connect(fork, r1).unwrap();
        control.connect(fork, r2).unwrap();
        control.connect(r1, merge).unwrap();
        control.connect(r2, merge).unwrap();
        control.connect(merge, b).unwrap();

        control.assemble(b).unwrap();
        // Root plus two branch circuits
        assert_eq!(control.circuits().len(), 3);
        let root = control.circuit_of(b).unwrap();
        assert!(root.contains(fork));
        assert!(root.contains(merge));
        assert!(!root.contains(r1));

        let branches = control.component(fork).unwrap().branches().unwrap();
        let b0 = branches[0].unwrap();
        let b1 = branches[1].unwrap();
        assert!(control.circuits()[b0.0].contains(r1));
        assert!(control.circuits()[b1.0].contains(r2));
    }

    #[test]
    fn test_assemble_unterminated_branch() {
        // Fork whose second branch dead-ends
        let mut control = Control::new();
        let b = control.add_component(ComponentKind::battery(9.0));
        let fork = control.add_component(ComponentKind::connector());
        let r1 = control.add_component(ComponentKind::resistor(2.0));
        let r2 = control.add_component(ComponentKind::resistor(3.0));
        control.connect(b, fork).unwrap();
        control.connect(fork, r1).unwrap();
        control.connect(fork, r2).unwrap();
        control.connect(r1, b).unwrap();

        let err = control.assemble(b).unwrap_err();
        assert!(err.is_configuration(), "unexpected error: {err}");
    }

    #[test]
    fn test_toggle_rejects_wrong_variant() {
        let mut control = Control::new();
        let r = control.add_component(ComponentKind::resistor(2.0));
        let err = control.toggle(r).unwrap_err();
        assert!(matches!(err, VoltLabError::UnsupportedTrigger { .. }));
    }

    #[test]
    fn test_reassembly_resets_membership() {
        let mut control = Control::new();
        let b = control.add_component(ComponentKind::battery(9.0));
        let r = control.add_component(ComponentKind::resistor(5.0));
        control.connect(b, r).unwrap();
        control.connect(r, b).unwrap();
        control.assemble(b).unwrap();
        control.assemble(b).unwrap();
        assert_eq!(control.circuits().len(), 1);
    }
}
