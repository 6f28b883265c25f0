//! Error types and stable error codes for the flattening engine.
//!
//! Two families live here:
//! - [`FlattenError`]: fatal conditions that abort the whole flatten. The
//!   caller receives either a complete flattened text or one of these;
//!   no partial output is ever produced.
//! - [`FlattenWarning`]: non-fatal conditions recorded during traversal
//!   (syntax issues in a single file, skipped imports in lenient mode,
//!   duplicate remapping prefixes). Traversal continues past them.
//!
//! ## Error Code Mapping
//!
//! CLI exit codes and JSON error codes share one table:
//! - `2`: Invalid input (malformed remappings, bad payload)
//! - `3`: Resolution errors (missing import, out-of-scope import)
//! - `4`: I/O errors (unreadable source, unwritable output)
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

// ============================================================================
// Error Codes
// ============================================================================

/// Stable error codes for CLI exit status and JSON output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    /// Invalid input from caller (bad remapping config, malformed payload).
    InvalidInput = 2,
    /// Resolution errors (import unreachable or outside the permitted scope).
    ResolutionError = 3,
    /// I/O errors while reading sources or writing output.
    IoError = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl ErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Stable machine-readable name for structured output.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "invalid_input",
            ErrorCode::ResolutionError => "resolution_error",
            ErrorCode::IoError => "io_error",
            ErrorCode::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Fatal Errors
// ============================================================================

/// Fatal errors raised by the flattening engine.
///
/// Every variant carries enough context to tell the user which source
/// triggered the failure and, for resolution failures, the chain of
/// importers that reached it.
#[derive(Debug, Error)]
pub enum FlattenError {
    /// A required import resolved to an identifier with no content behind it.
    #[error("could not resolve import '{path}'{}", format_chain(.chain))]
    MissingImport {
        /// The canonical identifier that could not be fetched.
        path: String,
        /// Importer chain from the root down to the importing file.
        chain: Vec<String>,
    },

    /// An import resolved outside the permitted root / remapping boundary.
    #[error("import '{path}' in '{importer}' resolves outside the project scope")]
    OutOfScopeImport { path: String, importer: String },

    /// Ambiguous or looping remapping rules.
    #[error("malformed remappings: {message}")]
    MalformedRemapping { message: String },

    /// A verified-contract payload that could not be interpreted.
    #[error("malformed verified-contract payload: {message}")]
    Payload { message: String },

    /// Underlying I/O failure while fetching a source.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_chain(chain: &[String]) -> String {
    if chain.is_empty() {
        String::new()
    } else {
        format!(" (imported via {})", chain.join(" -> "))
    }
}

impl FlattenError {
    /// Create a missing-import error with its importer chain.
    pub fn missing_import(path: impl Into<String>, chain: Vec<String>) -> Self {
        FlattenError::MissingImport {
            path: path.into(),
            chain,
        }
    }

    /// Create an out-of-scope import error.
    pub fn out_of_scope(path: impl Into<String>, importer: impl Into<String>) -> Self {
        FlattenError::OutOfScopeImport {
            path: path.into(),
            importer: importer.into(),
        }
    }

    /// Create a malformed-remapping error.
    pub fn malformed_remapping(message: impl Into<String>) -> Self {
        FlattenError::MalformedRemapping {
            message: message.into(),
        }
    }

    /// Create a payload error.
    pub fn payload(message: impl Into<String>) -> Self {
        FlattenError::Payload {
            message: message.into(),
        }
    }

    /// Get the stable error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::from(self)
    }
}

impl From<&FlattenError> for ErrorCode {
    fn from(err: &FlattenError) -> Self {
        match err {
            FlattenError::MissingImport { .. } => ErrorCode::ResolutionError,
            FlattenError::OutOfScopeImport { .. } => ErrorCode::ResolutionError,
            FlattenError::MalformedRemapping { .. } => ErrorCode::InvalidInput,
            FlattenError::Payload { .. } => ErrorCode::InvalidInput,
            FlattenError::Io(_) => ErrorCode::IoError,
        }
    }
}

impl From<FlattenError> for ErrorCode {
    fn from(err: FlattenError) -> Self {
        ErrorCode::from(&err)
    }
}

// ============================================================================
// Non-fatal Warnings
// ============================================================================

/// Non-fatal conditions recorded during a flatten.
///
/// Warnings are collected on the dependency graph and surfaced alongside
/// the output; none of them stop the traversal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlattenWarning {
    /// A malformed import fragment was skipped during extraction.
    #[error("{file}: skipped malformed import at byte {offset}: {message}")]
    ImportSyntax {
        file: String,
        offset: usize,
        message: String,
    },

    /// Two remapping rules declared the same prefix; the first one wins.
    #[error("duplicate remapping prefix '{prefix}' (keeping the first-declared rule)")]
    DuplicateRemapPrefix { prefix: String },

    /// A missing import was skipped because lenient mode is enabled.
    #[error("skipped unresolvable import '{path}' from '{importer}'")]
    SkippedMissingImport { path: String, importer: String },
}

// ============================================================================
// Tests
// ============================================================================
