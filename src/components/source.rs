//! Power sources: batteries and cells.

/// Parameters shared by battery and cell sources.
#[derive(Debug, Clone)]
pub struct SourceParams {
    /// Electromotive force in volts.
    pub volts: f64,
    /// Internal series resistance in ohms.
    pub internal_resistance: f64,
}

impl SourceParams {
    /// Create a source with the given EMF and negligible internal
    /// resistance. Malformed input is clamped, never stored as NaN.
    pub fn new(volts: f64) -> Self {
        let volts = if volts.is_finite() { volts.max(0.0) } else { 0.0 };
        Self {
            volts,
            internal_resistance: 0.0,
        }
    }

    /// Set the EMF, clamping malformed input.
    pub fn set_volts(&mut self, volts: f64) {
        if volts.is_finite() {
            self.volts = volts.max(0.0);
        }
    }
}
