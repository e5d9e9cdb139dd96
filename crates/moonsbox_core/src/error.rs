//! # Core Error Types
//!
//! All failures the simulation core reports to its driver.
//!
//! Coordinates outside the grid are deliberately absent from this list:
//! every coordinate-taking operation answers them with `None` instead.

use thiserror::Error;

/// Errors that can occur in the simulation core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Grid dimensions were zero or negative.
    #[error("invalid grid size {width}x{height}: both dimensions must be positive")]
    InvalidSize {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },

    /// A plugin, save file or material declared a version the host cannot accept.
    #[error("{subject} version {found} is incompatible (supported: {supported})")]
    VersionMismatch {
        /// What carried the version ("plugin 'x' api", "save format", ...).
        subject: String,
        /// The version that was declared.
        found: String,
        /// What the host supports.
        supported: String,
    },

    /// The blob is not a save file, or its framing is malformed.
    #[error("invalid save format: {reason}")]
    Format {
        /// Human readable reason.
        reason: String,
    },

    /// The save file is framed correctly but its contents are inconsistent.
    #[error("corrupt save data: {reason}")]
    Corrupt {
        /// Human readable reason.
        reason: String,
    },

    /// A material id or name could not be resolved against the registry.
    #[error("unknown material: {material}")]
    UnknownMaterial {
        /// The unresolved id (`#n`) or name.
        material: String,
    },

    /// A material name was registered twice.
    #[error("material '{0}' is already registered")]
    DuplicateMaterial(String),

    /// A material rejected its own auxiliary payload while loading.
    #[error("material '{material}' rejected its aux payload: {source}")]
    Aux {
        /// Name of the owning material.
        material: String,
        /// The hook's error.
        source: AuxError,
    },
}

impl CoreError {
    /// Shorthand for an unknown material referenced by id.
    #[must_use]
    pub fn unknown_id(id: u32) -> Self {
        Self::UnknownMaterial {
            material: format!("#{id}"),
        }
    }

    /// Shorthand for an unknown material referenced by name.
    #[must_use]
    pub fn unknown_name(name: &str) -> Self {
        Self::UnknownMaterial {
            material: format!("'{name}'"),
        }
    }

    /// Shorthand for a corrupt-data failure.
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        Self::Corrupt {
            reason: reason.into(),
        }
    }
}

/// Error raised by a material's aux deserialization hook.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct AuxError(pub String);

impl AuxError {
    /// Payload length did not match what the material writes.
    #[must_use]
    pub fn bad_length(expected: usize, found: usize) -> Self {
        Self(format!("expected {expected} bytes, found {found}"))
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
