//! Diodes and LEDs: one-way conduction via the lock state machine.
//!
//! The engine does not model the Shockley curve. A diode conducts with
//! a small forward resistance until it observes current against its
//! allow-direction, at which point it locks: resistance jumps to the
//! near-infinite bound and the circuit is declared broken, attributed
//! to the diode. Observing compatible (non-negative) current while
//! locked unlocks it again and restores the low resistance.

use crate::R_INFINITE;

/// Result of feeding an observed current into the lock state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTransition {
    /// Reverse current observed; the diode just locked.
    Locked,
    /// Compatible current observed while locked; the diode released.
    Unlocked,
}

/// Lock state for a diode or LED.
#[derive(Debug, Clone)]
pub struct DiodeState {
    /// True if conventional forward flow (input port to output port)
    /// is the allowed direction.
    pub allow_forward: bool,
    pub locked: bool,
}

impl DiodeState {
    /// Forward conduction resistance in ohms.
    pub const R_FORWARD: f64 = 0.1;

    pub fn new(allow_forward: bool) -> Self {
        Self {
            allow_forward,
            locked: false,
        }
    }

    /// Present resistance: low while unlocked, the open bound while
    /// locked.
    pub fn resistance(&self) -> f64 {
        if self.locked {
            R_INFINITE
        } else {
            Self::R_FORWARD
        }
    }

    /// Feed the current observed this tick through the state machine.
    ///
    /// Returns the transition taken, if any. Zero current counts as
    /// compatible, so a diode that broke its own circuit releases on
    /// the following tick.
    pub fn observe(&mut self, current: f64) -> Option<LockTransition> {
        let oriented = if self.allow_forward { current } else { -current };
        if !self.locked && oriented < 0.0 {
            self.locked = true;
            Some(LockTransition::Locked)
        } else if self.locked && oriented >= 0.0 {
            self.locked = false;
            Some(LockTransition::Unlocked)
        } else {
            None
        }
    }
}
