//! The plain on/off switch.
//!
//! A switch does not model contact resistance; an open switch instead
//! declares its circuit broken (attributed to itself), and a closed
//! switch clears that break only if it still owns it. The circuit-side
//! bookkeeping lives in the engine; this type only tracks the contact
//! state.

use crate::components::Togglable;

/// Contact state of a switch.
#[derive(Debug, Clone)]
pub struct SwitchState {
    pub closed: bool,
}

impl SwitchState {
    pub fn new(closed: bool) -> Self {
        Self { closed }
    }
}

impl Togglable for SwitchState {
    fn toggle(&mut self) {
        self.closed = !self.closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_contact() {
        let mut s = SwitchState::new(true);
        s.toggle();
        assert!(!s.closed);
        s.toggle();
        assert!(s.closed);
    }
}
