//! Junction components: the parallel connector and the two-way switch.
//!
//! A junction owns two child circuit segments. The connector combines
//! them (parallel resistance, current split by branch resistance); the
//! two-way switch routes exclusively, holding its unselected branch in
//! a break attributed to the junction itself.

use crate::circuit::CircuitId;
use crate::components::Togglable;
use crate::R_INFINITE;

/// Parallel combination with open/short degeneracy rules.
///
/// A branch at the open sentinel yields the other branch; a zero branch
/// short-circuits the pair. Never divides by zero.
pub fn parallel_resistance(r1: f64, r2: f64) -> f64 {
    let open1 = r1 >= R_INFINITE;
    let open2 = r2 >= R_INFINITE;
    match (open1, open2) {
        (true, true) => R_INFINITE,
        (true, false) => r2,
        (false, true) => r1,
        (false, false) => {
            if r1 <= 0.0 || r2 <= 0.0 {
                0.0
            } else {
                (r1 * r2) / (r1 + r2)
            }
        }
    }
}

/// Branch bookkeeping shared by both junction variants.
#[derive(Debug, Clone, Default)]
pub struct JunctionState {
    /// The two owned child circuits, in output-port order.
    pub branches: [Option<CircuitId>; 2],
}

impl JunctionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a child circuit to a branch slot.
    pub fn set_branch(&mut self, slot: usize, circuit: CircuitId) {
        self.branches[slot] = Some(circuit);
    }
}

/// The exclusive-routing two-way switch.
#[derive(Debug, Clone)]
pub struct TwoWayState {
    pub junction: JunctionState,
    /// Index of the active branch slot (0 or 1).
    pub selected: usize,
}

impl TwoWayState {
    pub fn new() -> Self {
        Self {
            junction: JunctionState::new(),
            selected: 0,
        }
    }

    /// The branch slot currently forced broken.
    pub fn unselected(&self) -> usize {
        1 - self.selected
    }
}

impl Default for TwoWayState {
    fn default() -> Self {
        Self::new()
    }
}

impl Togglable for TwoWayState {
    fn toggle(&mut self) {
        self.selected = self.unselected();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parallel_equal_branches_halve() {
        assert!((parallel_resistance(10.0, 10.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_degenerate_cases() {
        assert_eq!(parallel_resistance(R_INFINITE, 7.0), 7.0);
        assert_eq!(parallel_resistance(7.0, R_INFINITE), 7.0);
        assert_eq!(parallel_resistance(R_INFINITE, R_INFINITE), R_INFINITE);
        assert_eq!(parallel_resistance(0.0, 7.0), 0.0);
        assert_eq!(parallel_resistance(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_two_way_toggle_alternates() {
        let mut t = TwoWayState::new();
        assert_eq!(t.selected, 0);
        assert_eq!(t.unselected(), 1);
        t.toggle();
        assert_eq!(t.selected, 1);
        t.toggle();
        assert_eq!(t.selected, 0);
    }

    proptest! {
        #[test]
        fn prop_parallel_never_exceeds_either_branch(
            r1 in 1e-6f64..1e9,
            r2 in 1e-6f64..1e9,
        ) {
            let rp = parallel_resistance(r1, r2);
            prop_assert!(rp <= r1.min(r2) + 1e-9);
            prop_assert!(rp >= 0.0);
        }
    }
}
