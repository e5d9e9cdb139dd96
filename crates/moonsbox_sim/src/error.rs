//! # Simulation Error Types
//!
//! Everything the driver can fail with: core failures, bad configuration
//! and file I/O around saves.

use std::io;
use std::path::PathBuf;

use moonsbox_core::CoreError;
use thiserror::Error;

/// Errors that can occur while driving a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    /// A grid, plugin or save operation failed in the core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The configuration could not be parsed or failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A save file could not be read or written.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

impl SimError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
