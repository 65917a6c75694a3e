//! Error types for the VoltLab engine.
//!
//! This module provides a unified error type [`VoltLabError`] covering
//! the three failure classes the engine distinguishes: malformed
//! topology found at assembly time, invalid runtime component state
//! (logic defects), and malformed persisted data.
//!
//! Numeric edge cases are deliberately *not* errors: division by zero
//! resistance and NaN from malformed input are clamped to sentinel
//! values at the point of assignment and never propagate into the
//! solver.

use thiserror::Error;

use crate::circuit::{CircuitId, ComponentId};

/// Result type alias using [`VoltLabError`].
pub type Result<T> = std::result::Result<T, VoltLabError>;

/// Unified error type for all VoltLab operations.
#[derive(Error, Debug)]
pub enum VoltLabError {
    // ============ Configuration Errors (assembly time) ============
    /// A component has more wires on a port than its variant allows
    #[error("Component {component} exceeds port arity: {port} port allows {max}, found {found}")]
    PortArityExceeded {
        component: ComponentId,
        port: &'static str,
        max: usize,
        found: usize,
    },

    /// The walk from the head never closed back on the head
    #[error("Circuit does not close into a loop back to the power source (stopped at {last})")]
    OpenLoop { last: ComponentId },

    /// A junction branch never reconverged with its sibling
    #[error("Branch from junction {junction} never reconverges with its sibling branch")]
    UnterminatedBranch { junction: ComponentId },

    /// The same circuit was assigned to a junction branch twice
    #[error("Circuit {circuit} assigned to more than one junction branch")]
    DuplicateBranchAssignment { circuit: CircuitId },

    /// A component is registered but not reachable from the head
    #[error("Component {component} is not reachable from the power source")]
    UnreachableComponent { component: ComponentId },

    /// The designated head is not a power source
    #[error("Head component {component} is not a power source")]
    HeadNotPowerSource { component: ComponentId },

    /// A referenced component id is not in the registry
    #[error("Component {component} not found in the registry")]
    ComponentNotFound { component: ComponentId },

    // ============ Component Errors (runtime logic defects) ============
    /// Ticked before the circuit was assembled
    #[error("Circuit has not been assembled; call assemble() before ticking")]
    NotAssembled,

    /// An exclusive junction has no selected branch circuit
    #[error("Two-way switch {component} has no branch circuit for its selected side")]
    NoBranchSelected { component: ComponentId },

    /// A component's circuit back-reference is missing or stale
    #[error("Component {component} is not a member of any circuit")]
    OrphanComponent { component: ComponentId },

    /// An external trigger does not apply to the component's variant
    #[error("Component {component} does not support trigger '{trigger}'")]
    UnsupportedTrigger {
        component: ComponentId,
        trigger: &'static str,
    },

    // ============ Save Data Errors (structural; field-level problems
    // are recovered locally and never surface here) ============
    /// Unknown component type tag in saved data
    #[error("Saved component {index} has unknown type '{kind}'")]
    UnknownSavedType { index: usize, kind: String },

    /// A saved connection references a component index that does not exist
    #[error("Saved component {index} references missing component index {target}")]
    MissingSavedReference { index: usize, target: usize },

    /// The saved document is not structurally valid JSON for the schema
    #[error("Malformed save data: {message}")]
    MalformedSaveData { message: String },

    /// I/O failure reading or writing a saved circuit
    #[error("Failed to access saved circuit '{path}': {source}")]
    SaveIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl VoltLabError {
    /// Create a port-arity configuration error.
    pub fn port_arity(
        component: ComponentId,
        port: &'static str,
        max: usize,
        found: usize,
    ) -> Self {
        Self::PortArityExceeded {
            component,
            port,
            max,
            found,
        }
    }

    /// Create a malformed-save-data error.
    pub fn malformed_save(message: impl Into<String>) -> Self {
        Self::MalformedSaveData {
            message: message.into(),
        }
    }

    /// True for errors in the assembly-time configuration class.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::PortArityExceeded { .. }
                | Self::OpenLoop { .. }
                | Self::UnterminatedBranch { .. }
                | Self::DuplicateBranchAssignment { .. }
                | Self::UnreachableComponent { .. }
                | Self::HeadNotPowerSource { .. }
                | Self::ComponentNotFound { .. }
        )
    }

    /// True for errors in the persisted-data class.
    pub fn is_save_data(&self) -> bool {
        matches!(
            self,
            Self::UnknownSavedType { .. }
                | Self::MissingSavedReference { .. }
                | Self::MalformedSaveData { .. }
                | Self::SaveIo { .. }
        )
    }
}
