//! Resistive components: fixed and variable resistors plus the two
//! environment-sensitive variants (thermistor, light sensor).

use crate::components::Adjustable;
use crate::{AMBIENT_TEMPERATURE, R_INFINITE};

/// A fixed resistor.
#[derive(Debug, Clone)]
pub struct ResistorParams {
    pub ohms: f64,
}

impl ResistorParams {
    pub fn new(ohms: f64) -> Self {
        Self {
            ohms: sanitize(ohms),
        }
    }

    pub fn set_ohms(&mut self, ohms: f64) {
        if ohms.is_finite() && ohms >= 0.0 {
            self.ohms = ohms.min(R_INFINITE);
        }
    }
}

/// A variable resistor: full track resistance scaled by the slider.
#[derive(Debug, Clone)]
pub struct VariableResistorState {
    /// Track resistance at fraction 1.0.
    pub track_ohms: f64,
    /// Slider position in `[0, 1]`; floored to avoid a dead short.
    pub fraction: f64,
}

impl VariableResistorState {
    /// Minimum slider fraction, keeping some resistance on the track.
    pub const MIN_FRACTION: f64 = 0.005;

    pub fn new(track_ohms: f64) -> Self {
        Self {
            track_ohms: sanitize(track_ohms),
            fraction: 1.0,
        }
    }

    pub fn effective_ohms(&self) -> f64 {
        self.track_ohms * self.fraction
    }
}

impl Adjustable for VariableResistorState {
    fn set_fraction(&mut self, fraction: f64) {
        if fraction.is_finite() {
            self.fraction = fraction.clamp(Self::MIN_FRACTION, 1.0);
        }
    }

    fn fraction(&self) -> f64 {
        self.fraction
    }
}

/// An NTC thermistor: resistance falls as temperature rises.
#[derive(Debug, Clone)]
pub struct ThermistorParams {
    /// Resistance at ambient temperature.
    pub ohms_at_ambient: f64,
}

impl ThermistorParams {
    /// Per-degree resistance ratio. 0.96 halves resistance roughly
    /// every 17 degrees above ambient.
    const RATIO_PER_DEGREE: f64 = 0.96;

    pub fn new(ohms_at_ambient: f64) -> Self {
        Self {
            ohms_at_ambient: sanitize(ohms_at_ambient),
        }
    }

    /// Resistance at the given environment temperature (Celsius).
    pub fn ohms_at(&self, temperature: f64) -> f64 {
        let delta = if temperature.is_finite() {
            temperature - AMBIENT_TEMPERATURE
        } else {
            0.0
        };
        let r = self.ohms_at_ambient * Self::RATIO_PER_DEGREE.powf(delta);
        r.clamp(0.1, self.ohms_at_ambient * 8.0)
    }
}

/// A light-dependent resistor: resistance falls as light rises.
#[derive(Debug, Clone)]
pub struct LightSensorParams {
    /// Resistance in complete darkness.
    pub dark_ohms: f64,
    /// Resistance under full illumination.
    pub bright_ohms: f64,
}

impl LightSensorParams {
    pub fn new(dark_ohms: f64) -> Self {
        let dark = sanitize(dark_ohms);
        Self {
            dark_ohms: dark,
            bright_ohms: (dark / 100.0).max(1.0),
        }
    }

    /// Resistance at the given light level in `[0, 1]`.
    pub fn ohms_at(&self, light_level: f64) -> f64 {
        let l = if light_level.is_finite() {
            light_level.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.dark_ohms + (self.bright_ohms - self.dark_ohms) * l
    }
}

fn sanitize(ohms: f64) -> f64 {
    if ohms.is_finite() && ohms > 0.0 {
        ohms.min(R_INFINITE)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_resistor_floor() {
        let mut v = VariableResistorState::new(100.0);
        v.set_fraction(0.0);
        assert!(v.effective_ohms() > 0.0);
        v.set_fraction(0.5);
        assert!((v.effective_ohms() - 50.0).abs() < 1e-9);
        v.set_fraction(f64::NAN);
        assert!((v.fraction() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_thermistor_is_monotonic_in_temperature() {
        let t = ThermistorParams::new(1000.0);
        let cold = t.ohms_at(0.0);
        let warm = t.ohms_at(AMBIENT_TEMPERATURE);
        let hot = t.ohms_at(80.0);
        assert!(cold > warm);
        assert!(warm > hot);
        assert!((warm - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_light_sensor_range() {
        let l = LightSensorParams::new(5000.0);
        assert!((l.ohms_at(0.0) - 5000.0).abs() < 1e-9);
        assert!((l.ohms_at(1.0) - 50.0).abs() < 1e-9);
        assert!(l.ohms_at(0.5) < 5000.0);
        // Out-of-range and malformed levels clamp
        assert!((l.ohms_at(7.0) - 50.0).abs() < 1e-9);
        assert!((l.ohms_at(f64::NAN) - 5000.0).abs() < 1e-9);
    }
}
