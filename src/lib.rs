//! # VoltLab Core
//!
//! The circuit graph and evaluation engine behind an interactive
//! electronics teaching tool.
//!
//! This library provides:
//! - A typed component catalogue (sources, resistive loads, switches,
//!   diodes, capacitors, junctions, meters) connected by directed wires
//! - A quasi-static series/parallel solver evaluated once per tick
//! - Component-local state machines (switch breaks, diode locking,
//!   RC capacitor charge/discharge, thermal and mechanical integrators)
//! - A JSON persistence schema for saved circuits
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`circuit`] - Wires, circuit segments, the trace walk, and assembly validation
//! - [`components`] - Component variants and their per-tick state machines
//! - [`engine`] - The [`Control`] arena, environment context, and tick evaluation
//! - [`persist`] - Save/load schema for assembled circuits
//!
//! ## Simulation model
//!
//! The engine is not a nodal-analysis solver. It assumes exactly one
//! closed loop through the power source, with at most two-way branching
//! at junction components. Each tick:
//!
//! 1. Every component refreshes its resistance from its variant state
//!    and the shared environment (temperature, light level)
//! 2. The loop resistance is aggregated (junctions substitute a
//!    series/parallel combinator over their two child circuits) and the
//!    loop current follows from Ohm's law, or is zero while any segment
//!    on the path is broken
//! 3. Component state machines run in traversal order, using the
//!    previous tick's values as steady-state inputs
//!
//! The pass is single-threaded and deterministic: the same input state
//! always produces the same output state.

pub mod circuit;
pub mod components;
pub mod engine;
pub mod error;
pub mod persist;

// Re-export main types for convenience
pub use circuit::{Circuit, Wire, WireMaterial};
pub use components::{Component, ComponentKind};
pub use engine::{Control, EnvironmentContext};
pub use error::{Result, VoltLabError};

/// Default tick rate in Hz (ticks are converted to seconds at this rate).
pub const DEFAULT_TICK_RATE: f64 = 60.0;

/// Sentinel resistance treated as an open circuit by the solver.
///
/// Values at or above this never reach Ohm's-law division; they
/// short-circuit to zero current instead.
pub const R_INFINITE: f64 = 1e12;

/// Floor substituted when dividing by a near-zero loop resistance.
pub const R_SHORT_FLOOR: f64 = 1e-3;

/// Ambient temperature in degrees Celsius with no heater contribution.
pub const AMBIENT_TEMPERATURE: f64 = 20.0;

/// A capacitor at or above this fraction of its target voltage is Full.
pub const CAPACITOR_FULL_FRACTION: f64 = 0.993;
