//! Wires: directed edges between component ports.
//!
//! A wire carries current from its source component's output port into
//! its target component's input port. Wires may contribute their own
//! resistance, derived from the configured material and gauge; the
//! intermediate path points are rendering geometry only and play no
//! part in the solver.

use serde::{Deserialize, Serialize};

use super::types::{ComponentId, WireId};

/// Conductor materials selectable for a wire.
///
/// Resistivity values are in ohm-millimeter (scaled for the nominal
/// 100 mm on-screen run length used by the resistance model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireMaterial {
    Copper,
    Aluminium,
    Iron,
    Nichrome,
}

impl WireMaterial {
    /// Resistivity in ohm·mm² per mm.
    pub fn resistivity(&self) -> f64 {
        match self {
            WireMaterial::Copper => 1.68e-5,
            WireMaterial::Aluminium => 2.65e-5,
            WireMaterial::Iron => 9.71e-5,
            WireMaterial::Nichrome => 1.10e-3,
        }
    }

    /// Material from its persisted index, if valid.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(WireMaterial::Copper),
            1 => Some(WireMaterial::Aluminium),
            2 => Some(WireMaterial::Iron),
            3 => Some(WireMaterial::Nichrome),
            _ => None,
        }
    }

    /// Persisted index of this material.
    pub fn index(&self) -> usize {
        match self {
            WireMaterial::Copper => 0,
            WireMaterial::Aluminium => 1,
            WireMaterial::Iron => 2,
            WireMaterial::Nichrome => 3,
        }
    }
}

impl Default for WireMaterial {
    fn default() -> Self {
        WireMaterial::Copper
    }
}

/// Nominal conductor run length in mm used by the resistance model.
const NOMINAL_LENGTH_MM: f64 = 100.0;

/// A directed wire between two components.
#[derive(Debug, Clone)]
pub struct Wire {
    pub id: WireId,
    /// Component whose output port this wire leaves.
    pub source: ComponentId,
    /// Component whose input port this wire enters.
    pub target: ComponentId,
    pub material: WireMaterial,
    /// Conductor radius in mm.
    pub radius: f64,
    /// Intermediate path points for rendering; not used by the solver.
    pub points: Vec<(f64, f64)>,
}

impl Wire {
    /// Default conductor radius in mm.
    pub const DEFAULT_RADIUS: f64 = 1.0;

    /// Create a new wire with default copper geometry.
    pub fn new(id: WireId, source: ComponentId, target: ComponentId) -> Self {
        Self {
            id,
            source,
            target,
            material: WireMaterial::default(),
            radius: Self::DEFAULT_RADIUS,
            points: Vec::new(),
        }
    }

    /// Set the conductor material and gauge.
    pub fn with_geometry(mut self, material: WireMaterial, radius: f64) -> Self {
        self.material = material;
        // A degenerate radius would blow up the area division below
        self.radius = if radius.is_finite() && radius > 0.0 {
            radius
        } else {
            Self::DEFAULT_RADIUS
        };
        self
    }

    /// Extra series resistance contributed by this wire.
    ///
    /// R = rho * L / A with the nominal run length and the configured
    /// circular cross-section.
    pub fn extra_resistance(&self) -> f64 {
        let area = std::f64::consts::PI * self.radius * self.radius;
        self.material.resistivity() * NOMINAL_LENGTH_MM / area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copper_wire_is_nearly_free() {
        let w = Wire::new(WireId(0), ComponentId(0), ComponentId(1));
        assert!(w.extra_resistance() < 0.01);
    }

    #[test]
    fn test_nichrome_beats_copper() {
        let cu = Wire::new(WireId(0), ComponentId(0), ComponentId(1));
        let ni = Wire::new(WireId(1), ComponentId(0), ComponentId(1))
            .with_geometry(WireMaterial::Nichrome, Wire::DEFAULT_RADIUS);
        assert!(ni.extra_resistance() > cu.extra_resistance() * 10.0);
    }

    #[test]
    fn test_invalid_radius_falls_back_to_default() {
        let w = Wire::new(WireId(0), ComponentId(0), ComponentId(1))
            .with_geometry(WireMaterial::Copper, 0.0);
        assert_eq!(w.radius, Wire::DEFAULT_RADIUS);

        let w = Wire::new(WireId(0), ComponentId(0), ComponentId(1))
            .with_geometry(WireMaterial::Copper, f64::NAN);
        assert_eq!(w.radius, Wire::DEFAULT_RADIUS);
    }

    #[test]
    fn test_material_index_roundtrip() {
        for m in [
            WireMaterial::Copper,
            WireMaterial::Aluminium,
            WireMaterial::Iron,
            WireMaterial::Nichrome,
        ] {
            assert_eq!(WireMaterial::from_index(m.index()), Some(m));
        }
        assert_eq!(WireMaterial::from_index(7), None);
    }
}
