//! Circuit graph primitives: identifiers, wires, circuit segments, the
//! trace walk, and assembly-time validation.

mod graph;
mod trace;
mod types;
mod validate;
mod wire;

pub use graph::Circuit;
pub use trace::{path_resistance, trace};
pub use types::{CircuitId, ComponentId, WireId};
pub use validate::validate_topology;
pub use wire::{Wire, WireMaterial};
