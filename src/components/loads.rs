//! Dissipative loads: the filament bulb, the heater's thermal
//! integrator and the motor's mechanical integrator.

use std::f64::consts::TAU;

/// A filament bulb with a wattage rating.
///
/// Exceeding the rating while current flows blows the filament; the
/// blown flag on the owning [`Component`](crate::components::Component)
/// is terminal until the part is replaced.
#[derive(Debug, Clone)]
pub struct BulbParams {
    pub ohms: f64,
    /// Rated power in watts.
    pub wattage: f64,
    /// Light contribution pushed to the environment on the last tick,
    /// kept so the per-tick write can be an incremental delta.
    pub emitted: f64,
}

impl BulbParams {
    pub fn new(ohms: f64, wattage: f64) -> Self {
        Self {
            ohms: if ohms.is_finite() && ohms > 0.0 { ohms } else { 1.0 },
            wattage: if wattage.is_finite() && wattage > 0.0 {
                wattage
            } else {
                10.0
            },
            emitted: 0.0,
        }
    }

    /// Whether the given operating point exceeds the rating.
    pub fn overloaded(&self, voltage: f64, current: f64) -> bool {
        (voltage * current).abs() > self.wattage
    }

    /// Emitted light as a fraction of full brightness, in `[0, 1]`.
    pub fn brightness(&self, voltage: f64, current: f64) -> f64 {
        ((voltage * current).abs() / self.wattage).clamp(0.0, 1.0)
    }
}

/// The heater's accumulated-energy thermal model.
///
/// While on and below the maximum, each tick integrates
/// `I^2 * R * efficiency` joules; accumulated energy maps linearly to
/// a temperature rise above ambient through the heat capacity. While
/// off, energy decays at a jittered but deterministic rate.
#[derive(Debug, Clone)]
pub struct HeaterState {
    pub ohms: f64,
    /// Fraction of electrical power converted to stored heat.
    pub efficiency: f64,
    /// Maximum temperature rise above ambient, degrees Celsius.
    pub max_temperature: f64,
    /// Joules per degree of temperature rise.
    pub heat_capacity: f64,
    /// Accumulated thermal energy in joules.
    pub energy: f64,
}

impl HeaterState {
    /// Baseline cooling power in watts while switched off.
    const COOLING_POWER: f64 = 40.0;

    pub fn new(ohms: f64) -> Self {
        Self {
            ohms: if ohms.is_finite() && ohms > 0.0 { ohms } else { 5.0 },
            efficiency: 0.9,
            max_temperature: 120.0,
            heat_capacity: 25.0,
            energy: 0.0,
        }
    }

    /// Temperature rise above ambient, degrees Celsius.
    pub fn temperature(&self) -> f64 {
        (self.energy / self.heat_capacity).min(self.max_temperature)
    }

    /// Integrate one heating tick. Returns the temperature delta.
    pub fn heat_step(&mut self, current: f64, dt: f64) -> f64 {
        let before = self.temperature();
        if before < self.max_temperature {
            let power = current * current * self.ohms * self.efficiency;
            self.energy += power * dt;
            self.energy = self.energy.min(self.max_temperature * self.heat_capacity);
        }
        self.temperature() - before
    }

    /// Integrate one cooling tick. The rate is jittered by a value
    /// derived from the tick counter, keeping the pass deterministic.
    /// Returns the (non-positive) temperature delta.
    pub fn cool_step(&mut self, dt: f64, tick: u64) -> f64 {
        let before = self.temperature();
        // Knuth multiplicative hash of the tick, mapped into [0.5, 1.0]
        let jitter = 0.5 + 0.5 * (tick.wrapping_mul(2654435761) % 1024) as f64 / 1024.0;
        self.energy = (self.energy - Self::COOLING_POWER * jitter * dt).max(0.0);
        self.temperature() - before
    }
}

/// The motor's shaft angle integrator.
#[derive(Debug, Clone)]
pub struct MotorState {
    pub ohms: f64,
    /// Rated current at which the shaft turns at full speed.
    pub max_current: f64,
    /// Radians per tick at rated current.
    pub speed_constant: f64,
    /// Shaft angle in radians, wrapped to `[0, 2pi)`.
    pub angle: f64,
}

impl MotorState {
    pub fn new(ohms: f64, max_current: f64) -> Self {
        Self {
            ohms: if ohms.is_finite() && ohms > 0.0 { ohms } else { 4.0 },
            max_current: if max_current.is_finite() && max_current > 0.0 {
                max_current
            } else {
                1.0
            },
            speed_constant: 0.4,
            angle: 0.0,
        }
    }

    /// Advance the shaft by one tick at the given current.
    pub fn spin_step(&mut self, current: f64) {
        let delta = current / self.max_current * self.speed_constant;
        self.angle = (self.angle + delta).rem_euclid(TAU);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulb_overload_boundary() {
        // 2 ohm, 10 W: 4 V * 2 A = 8 W fine, 5 V * 2.5 A = 12.5 W blows
        let b = BulbParams::new(2.0, 10.0);
        assert!(!b.overloaded(4.0, 2.0));
        assert!(b.overloaded(5.0, 2.5));
        // Sign-independent
        assert!(b.overloaded(-5.0, 2.5));
    }

    #[test]
    fn test_heater_integrates_and_clamps() {
        let mut h = HeaterState::new(5.0);
        let dt = 1.0 / 60.0;
        // 4 A through 5 ohm at 0.9 efficiency = 72 W
        let delta = h.heat_step(4.0, dt);
        assert!(delta > 0.0);
        assert!((h.energy - 72.0 * dt).abs() < 1e-9);

        for _ in 0..1_000_000 {
            h.heat_step(4.0, dt);
        }
        assert!((h.temperature() - h.max_temperature).abs() < 1e-9);
    }

    #[test]
    fn test_heater_cooling_is_bounded_and_deterministic() {
        let mut a = HeaterState::new(5.0);
        let mut b = HeaterState::new(5.0);
        a.energy = 1000.0;
        b.energy = 1000.0;
        let dt = 1.0 / 60.0;
        for tick in 0..50 {
            let da = a.cool_step(dt, tick);
            let db = b.cool_step(dt, tick);
            assert!(da <= 0.0);
            assert_eq!(da, db, "same tick and state must cool identically");
        }
        assert!(a.energy < 1000.0);

        for tick in 0..10_000 {
            a.cool_step(dt, tick);
        }
        assert_eq!(a.energy, 0.0);
    }

    #[test]
    fn test_motor_angle_wraps() {
        let mut m = MotorState::new(4.0, 1.0);
        for _ in 0..100 {
            m.spin_step(1.0);
            assert!(m.angle >= 0.0 && m.angle < TAU);
        }
        // Reverse current turns the shaft backwards
        let before = m.angle;
        m.spin_step(-1.0);
        assert!((m.angle - (before - m.speed_constant).rem_euclid(TAU)).abs() < 1e-9);
    }
}
