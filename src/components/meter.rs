//! Meters: passive readouts for the render layer.
//!
//! An ammeter sits in series with near-zero resistance and records the
//! loop current. A voltmeter is placed on a connector branch of its
//! own; its very high resistance draws almost nothing, and the voltage
//! assigned across it is the reading.

/// Reading state for both meter variants.
#[derive(Debug, Clone)]
pub struct MeterState {
    pub ohms: f64,
    /// Value captured on the last tick.
    pub reading: f64,
}

impl MeterState {
    /// Series resistance of an ammeter.
    pub const R_AMMETER: f64 = 0.01;
    /// Branch resistance of a voltmeter.
    pub const R_VOLTMETER: f64 = 1e7;

    pub fn ammeter() -> Self {
        Self {
            ohms: Self::R_AMMETER,
            reading: 0.0,
        }
    }

    pub fn voltmeter() -> Self {
        Self {
            ohms: Self::R_VOLTMETER,
            reading: 0.0,
        }
    }
}
