//! Unified error type for the solfuse CLI.
//!
//! Bridges the engine's [`FlattenError`], configuration problems and
//! explorer failures into one type carrying the stable code table from
//! `solfuse-core` for exit status and JSON output.

use thiserror::Error;

use solfuse_core::{ErrorCode, FlattenError};

use crate::explorer::ExplorerError;

/// All the ways a solfuse run can fail.
#[derive(Debug, Error)]
pub enum SolfuseError {
    /// The engine aborted the flatten.
    #[error("{0}")]
    Flatten(#[from] FlattenError),

    /// Bad remapping configuration or unusable input arguments.
    #[error("invalid input: {message}")]
    Config { message: String },

    /// Explorer lookup failed before the engine ever ran.
    #[error("{0}")]
    Explorer(#[from] ExplorerError),

    /// I/O failure outside the engine (writing the output file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SolfuseError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        SolfuseError::Config {
            message: message.into(),
        }
    }

    /// The stable error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            SolfuseError::Flatten(err) => err.error_code(),
            SolfuseError::Config { .. } => ErrorCode::InvalidInput,
            SolfuseError::Explorer(err) => err.error_code(),
            SolfuseError::Io(_) => ErrorCode::IoError,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
