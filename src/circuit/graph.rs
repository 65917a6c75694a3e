//! Circuit segments.
//!
//! A [`Circuit`] is one ordered, traversable sub-path of the closed
//! loop: the member components in series order plus the wires linking
//! them. The root loop is one circuit; every junction owns two child
//! circuits for its branches.
//!
//! A circuit also records which component, if any, has interrupted
//! current flow along it. Break attribution is strict: only the
//! component that declared a break (or an explicit clear of the whole
//! segment) may remove it, so an open switch cannot accidentally
//! "repair" a lock declared by a diode elsewhere on the same segment.

use super::types::{CircuitId, ComponentId, WireId};

/// An ordered sub-path of components and wires with break bookkeeping.
#[derive(Debug, Clone)]
pub struct Circuit {
    pub id: CircuitId,
    /// Member components in series traversal order.
    pub components: Vec<ComponentId>,
    /// Wires linking the members (and entering/leaving the segment).
    pub wires: Vec<WireId>,
    /// The component currently interrupting this segment, if any.
    broken_by: Option<ComponentId>,
}

impl Circuit {
    /// Create an empty circuit segment.
    pub fn new(id: CircuitId) -> Self {
        Self {
            id,
            components: Vec::new(),
            wires: Vec::new(),
            broken_by: None,
        }
    }

    /// Whether current flow through this segment is interrupted.
    pub fn is_broken(&self) -> bool {
        self.broken_by.is_some()
    }

    /// The component attributed with the current break, if any.
    pub fn broken_by(&self) -> Option<ComponentId> {
        self.broken_by
    }

    /// Declare this segment broken, attributed to `by`.
    ///
    /// Idempotent per breaker: re-breaking by the same component is a
    /// no-op, and a second component cannot steal an existing break.
    /// Returns true if the break is now attributed to `by`.
    pub fn declare_break(&mut self, by: ComponentId) -> bool {
        match self.broken_by {
            None => {
                self.broken_by = Some(by);
                true
            }
            Some(owner) => owner == by,
        }
    }

    /// Clear the break, but only if `by` is the attributed breaker.
    ///
    /// Returns true if the segment is unbroken afterwards.
    pub fn clear_break(&mut self, by: ComponentId) -> bool {
        match self.broken_by {
            Some(owner) if owner == by => {
                self.broken_by = None;
                true
            }
            Some(_) => false,
            None => true,
        }
    }

    /// Unconditionally clear the break (topology teardown only).
    pub fn reset_break(&mut self) {
        self.broken_by = None;
    }

    /// Whether `component` is a member of this segment.
    pub fn contains(&self, component: ComponentId) -> bool {
        self.components.contains(&component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_break_is_idempotent_per_breaker() {
        let mut c = Circuit::new(CircuitId(0));
        let x = ComponentId(3);

        assert!(c.declare_break(x));
        assert!(c.declare_break(x));
        assert_eq!(c.broken_by(), Some(x));
    }

    #[test]
    fn test_break_cannot_be_stolen() {
        let mut c = Circuit::new(CircuitId(0));
        let x = ComponentId(3);
        let y = ComponentId(5);

        assert!(c.declare_break(x));
        assert!(!c.declare_break(y));
        assert_eq!(c.broken_by(), Some(x));
    }

    #[test]
    fn test_only_owner_clears() {
        let mut c = Circuit::new(CircuitId(0));
        let x = ComponentId(3);
        let y = ComponentId(5);

        c.declare_break(x);
        assert!(!c.clear_break(y));
        assert_eq!(c.broken_by(), Some(x));

        assert!(c.clear_break(x));
        assert_eq!(c.broken_by(), None);

        // Clearing an unbroken segment is fine
        assert!(c.clear_break(y));
    }
}
