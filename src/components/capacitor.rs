//! The capacitor: an explicit RC charge/discharge state machine.
//!
//! Each tick the engine resolves the capacitor's phase from two trace
//! queries (can it reach the power source round trip, and does a
//! discharge loop back onto itself exist) and then advances the stored
//! voltage along the exponential for the elapsed tick time:
//!
//!   charging:    v += (target - v) * (1 - e^(-dt/T))
//!   discharging: v *= e^(-dt/T)
//!
//! with T = R_path * C taken from the resolved access path. A stranded
//! charge (positive voltage, no power access, no self-loop) is held
//! constant indefinitely; there is deliberately no hidden leakage rule.

use crate::{CAPACITOR_FULL_FRACTION, R_SHORT_FLOOR};

/// Phase of the capacitor state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacitorPhase {
    /// Discharged, or charged but stranded with no path either way.
    Null,
    Charging,
    Discharging,
    /// At or above 99.3% of the target voltage.
    Full,
}

/// Capacitor configuration and stored charge.
#[derive(Debug, Clone)]
pub struct CapacitorState {
    /// Capacitance in farads.
    pub capacitance: f64,
    /// Supply voltage the capacitor charges toward.
    pub target_volts: f64,
    /// Present voltage across the plates.
    pub voltage: f64,
    /// Resistance the capacitor itself presents in the loop, and the
    /// divisor for the discharge current it pushes onto its path.
    pub series_resistance: f64,
    pub phase: CapacitorPhase,
}

impl CapacitorState {
    /// Default series resistance in ohms.
    pub const DEFAULT_SERIES_RESISTANCE: f64 = 10.0;

    pub fn new(farads: f64, target_volts: f64) -> Self {
        let farads = if farads.is_finite() && farads > 0.0 {
            farads
        } else {
            1e-3
        };
        let target = if target_volts.is_finite() && target_volts > 0.0 {
            target_volts
        } else {
            0.0
        };
        Self {
            capacitance: farads,
            target_volts: target,
            voltage: 0.0,
            series_resistance: Self::DEFAULT_SERIES_RESISTANCE,
            phase: CapacitorPhase::Null,
        }
    }

    /// Charge level as a percentage of the target, in `[0, 100]`.
    pub fn percentage(&self) -> f64 {
        if self.target_volts <= 0.0 {
            return 0.0;
        }
        (self.voltage / self.target_volts * 100.0).clamp(0.0, 100.0)
    }

    /// Resolve the phase for this tick from the two reachability
    /// queries.
    pub fn resolve_phase(&mut self, can_reach_power: bool, has_self_loop: bool) -> CapacitorPhase {
        self.phase = if can_reach_power {
            if self.percentage() >= CAPACITOR_FULL_FRACTION * 100.0 {
                CapacitorPhase::Full
            } else {
                CapacitorPhase::Charging
            }
        } else if self.voltage > 0.0 {
            if has_self_loop {
                CapacitorPhase::Discharging
            } else {
                // Stranded charge: held, not leaked
                CapacitorPhase::Null
            }
        } else {
            CapacitorPhase::Null
        };
        self.phase
    }

    /// Advance one charging step of `dt` seconds through a path of the
    /// given resistance.
    pub fn charge_step(&mut self, dt: f64, path_resistance: f64) {
        let t = self.time_constant(path_resistance);
        let alpha = 1.0 - (-dt / t).exp();
        self.voltage += (self.target_volts - self.voltage) * alpha;
        // The exponential never overshoots, but guard accumulated error
        self.voltage = self.voltage.min(self.target_volts);
    }

    /// Advance one discharging step of `dt` seconds through a path of
    /// the given resistance.
    pub fn discharge_step(&mut self, dt: f64, path_resistance: f64) {
        let t = self.time_constant(path_resistance);
        self.voltage *= (-dt / t).exp();
        if self.voltage < 1e-6 {
            self.voltage = 0.0;
        }
    }

    /// Current pushed onto the discharge path this tick.
    pub fn discharge_current(&self) -> f64 {
        self.voltage / self.series_resistance.max(R_SHORT_FLOOR)
    }

    fn time_constant(&self, path_resistance: f64) -> f64 {
        let r = if path_resistance.is_finite() && path_resistance > R_SHORT_FLOOR {
            path_resistance
        } else {
            R_SHORT_FLOOR
        };
        r * self.capacitance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charging_approaches_target_without_overshoot() {
        let mut c = CapacitorState::new(2200e-6, 5.0);
        let dt = 1.0 / 60.0;
        for _ in 0..10_000 {
            c.charge_step(dt, 10.0);
            assert!(c.voltage <= 5.0);
        }
        assert!(c.voltage > 4.99);
    }

    #[test]
    fn test_full_at_five_time_constants() {
        // R = 10 ohm, C = 2200 uF: T = 22 ms, 5T = 110 ms
        let mut c = CapacitorState::new(2200e-6, 5.0);
        let dt: f64 = 1.0 / 60.0;
        let ticks = (5.0 * 10.0 * 2200e-6 / dt).ceil() as usize;
        for _ in 0..ticks {
            c.charge_step(dt, 10.0);
        }
        assert_eq!(c.resolve_phase(true, false), CapacitorPhase::Full);
        assert!(c.percentage() >= 99.3);
    }

    #[test]
    fn test_phase_table() {
        let mut c = CapacitorState::new(1e-3, 5.0);

        // Uncharged, no access either way
        assert_eq!(c.resolve_phase(false, false), CapacitorPhase::Null);
        assert_eq!(c.resolve_phase(false, true), CapacitorPhase::Null);

        // Power access
        assert_eq!(c.resolve_phase(true, false), CapacitorPhase::Charging);

        // Charged, no power access: discharge only given a self-loop
        c.voltage = 3.0;
        assert_eq!(c.resolve_phase(false, true), CapacitorPhase::Discharging);
        assert_eq!(c.resolve_phase(false, false), CapacitorPhase::Null);
        assert!((c.voltage - 3.0).abs() < 1e-12, "stranded charge is held");
    }

    #[test]
    fn test_discharge_decays_to_zero() {
        let mut c = CapacitorState::new(2200e-6, 5.0);
        c.voltage = 5.0;
        let dt = 1.0 / 60.0;
        for _ in 0..100 {
            c.discharge_step(dt, 10.0);
        }
        assert_eq!(c.voltage, 0.0);
    }

    #[test]
    fn test_discharge_current_follows_ohms_law() {
        let mut c = CapacitorState::new(1e-3, 5.0);
        c.voltage = 5.0;
        assert!((c.discharge_current() - 0.5).abs() < 1e-12);
    }
}
