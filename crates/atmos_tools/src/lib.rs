//! # Atmos Development Tools
//!
//! Command-line tools for development:
//! - Data validators for the RON files under `assets/data`
//! - Gas generator scenario runs
//! - World save inspection

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod inspect;
pub mod scenario;
pub mod validate;

use std::path::PathBuf;

use atmos_core::error::AtmosError;
use thiserror::Error;

/// Result type alias using [`ToolError`].
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors raised by the tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Data or save rejected by the core.
    #[error(transparent)]
    Core(#[from] AtmosError),

    /// A generator profile id was not found.
    #[error("Unknown generator profile: {0}")]
    UnknownProfile(String),

    /// JSON output failed.
    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub(crate) fn read_text(path: &std::path::Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })
}
