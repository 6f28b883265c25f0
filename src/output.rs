//! JSON output envelope for `--json` mode.
//!
//! In JSON mode every invocation prints exactly one envelope to stdout,
//! success or failure, so callers can parse unconditionally. Plain mode
//! writes the flattened source path to stdout and diagnostics to stderr.

use serde::{Deserialize, Serialize};

use solfuse_core::{FlattenOutput, FlattenWarning};

use crate::error::SolfuseError;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

/// Response envelope: `status` is `"ok"` or `"error"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    /// Schema version for forward compatibility.
    pub schema_version: String,
    /// Status: "ok" or "error".
    pub status: String,
    /// Flatten report, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<FlattenReport>,
    /// Error description, present on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
    /// Non-fatal issues encountered along the way.
    pub warnings: Vec<JsonWarning>,
}

impl JsonResponse {
    /// Create a successful response.
    pub fn ok(report: FlattenReport, warnings: Vec<JsonWarning>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            status: "ok".to_string(),
            data: Some(report),
            error: None,
            warnings,
        }
    }

    /// Create an error response.
    pub fn error(err: &SolfuseError) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            status: "error".to_string(),
            data: None,
            error: Some(JsonError {
                code: err.error_code().name().to_string(),
                message: err.to_string(),
            }),
            warnings: vec![],
        }
    }
}

/// Structured error for JSON mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonError {
    /// Stable error code name (e.g. "resolution_error").
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Non-fatal issue raised while flattening.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWarning {
    /// Human-readable message.
    pub message: String,
}

impl From<&FlattenWarning> for JsonWarning {
    fn from(warning: &FlattenWarning) -> Self {
        Self {
            message: warning.to_string(),
        }
    }
}

/// Data payload describing one flatten run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlattenReport {
    /// The source argument as given on the command line.
    pub source: String,
    /// Input mode: "file", "folder", or "scan".
    pub mode: String,
    /// Path the flattened output was written to.
    pub output: String,
    /// Number of source files merged into the output.
    pub files: usize,
    /// Import cycles that were cut, each as a chain of source ids.
    pub cycles: Vec<Vec<String>>,
}

impl FlattenReport {
    /// Build a report from a finished flatten run.
    pub fn new(source: &str, mode: &str, output_path: &str, output: &FlattenOutput) -> Self {
        Self {
            source: source.to_string(),
            mode: mode.to_string(),
            output: output_path.to_string(),
            files: output.file_count,
            cycles: output.cycles.clone(),
        }
    }
}
