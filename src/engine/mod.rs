//! The simulation engine: arena ownership, environment state, and the
//! per-tick evaluation pass.

mod control;
mod env;
mod evaluate;

pub use control::Control;
pub use env::EnvironmentContext;
