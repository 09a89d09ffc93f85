//! Error types for the atmospherics simulation.
//!
//! In-simulation conditions (missing nodes, empty chambers, nets that have
//! not formed yet) are never errors; they are handled by early returns.
//! These variants cover API misuse and data/IO boundaries.

use thiserror::Error;

use crate::components::EntityId;

/// Result type alias using [`AtmosError`].
pub type Result<T> = std::result::Result<T, AtmosError>;

/// Top-level error type for the atmospherics core.
#[derive(Debug, Error)]
pub enum AtmosError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Entity exists but lacks a component the operation needs.
    #[error("Entity {entity} has no {component} component")]
    MissingComponent {
        /// Entity that was queried.
        entity: EntityId,
        /// Name of the missing component.
        component: &'static str,
    },

    /// Unknown grid identifier.
    #[error("Grid not found: {0}")]
    GridNotFound(u32),

    /// Data file parsing error.
    #[error("Failed to parse data '{source_name}': {message}")]
    DataParseError {
        /// File name or label of the data that failed to parse.
        source_name: String,
        /// Error message.
        message: String,
    },

    /// Data parsed but failed validation.
    #[error("Invalid data '{id}': {reason}")]
    InvalidData {
        /// Identifier of the offending record.
        id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// World save encoding or decoding failed.
    #[error("Save error: {0}")]
    SaveError(String),

    /// World save was written by an incompatible version.
    #[error("Save version mismatch: expected {expected}, got {found}")]
    SaveVersionMismatch {
        /// Version this build reads.
        expected: u32,
        /// Version found in the save.
        found: u32,
    },
}
