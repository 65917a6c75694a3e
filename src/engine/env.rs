//! The shared simulation environment.
//!
//! Environment scalars are not ambient globals: the evaluation pass
//! receives an explicit [`EnvironmentContext`] and components read and
//! write it in traversal order. A reader may therefore observe a value
//! written earlier in the same tick, or the previous tick's value if
//! the writer has not executed yet. That one-tick lag is a documented
//! approximation of the quasi-static model, not something the engine
//! tries to reorder away.

use crate::{AMBIENT_TEMPERATURE, DEFAULT_TICK_RATE};

/// Shared scalars read and written during a tick.
#[derive(Debug, Clone)]
pub struct EnvironmentContext {
    /// Air temperature in degrees Celsius (thermistors read this,
    /// heaters raise it).
    pub temperature: f64,
    /// Aggregate light level in `[0, 1]` (light sensors read this,
    /// luminous components raise it).
    pub light_level: f64,
    /// Whether the simulation is running; overload checks only fire
    /// while it is.
    pub running: bool,
    /// Ticks elapsed since the simulation started.
    pub tick: u64,
    /// Ticks per second, for converting ticks to elapsed time.
    pub tick_rate: f64,
}

impl Default for EnvironmentContext {
    fn default() -> Self {
        Self {
            temperature: AMBIENT_TEMPERATURE,
            light_level: 0.0,
            running: true,
            tick: 0,
            tick_rate: DEFAULT_TICK_RATE,
        }
    }
}

impl EnvironmentContext {
    /// Seconds covered by one tick.
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_rate
    }

    /// Seconds elapsed since the simulation started.
    pub fn elapsed_seconds(&self) -> f64 {
        self.tick as f64 / self.tick_rate
    }

    /// Apply a light-level delta, clamped to `[0, 1]`.
    pub fn add_light(&mut self, delta: f64) {
        if delta.is_finite() {
            self.light_level = (self.light_level + delta).clamp(0.0, 1.0);
        }
    }

    /// Apply a temperature delta, floored at ambient.
    pub fn add_temperature(&mut self, delta: f64) {
        if delta.is_finite() {
            self.temperature = (self.temperature + delta).max(AMBIENT_TEMPERATURE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deltas_clamp() {
        let mut env = EnvironmentContext::default();
        env.add_light(0.7);
        env.add_light(0.7);
        assert_eq!(env.light_level, 1.0);
        env.add_light(-2.0);
        assert_eq!(env.light_level, 0.0);

        env.add_temperature(-50.0);
        assert_eq!(env.temperature, AMBIENT_TEMPERATURE);
        env.add_temperature(f64::NAN);
        assert_eq!(env.temperature, AMBIENT_TEMPERATURE);
    }

    #[test]
    fn test_tick_time_conversion() {
        let mut env = EnvironmentContext::default();
        env.tick = 120;
        assert!((env.elapsed_seconds() - 2.0).abs() < 1e-12);
        assert!((env.dt() - 1.0 / 60.0).abs() < 1e-12);
    }
}
