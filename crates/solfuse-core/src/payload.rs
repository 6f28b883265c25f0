//! Verified-contract payload interpretation.
//!
//! Block explorers publish a contract's verified source in one
//! `SourceCode` string that comes in three shapes:
//!
//! 1. double-wrapped standard JSON, `{{"language": ..., "sources": ...}}`
//!    (an explorer quirk: the object is wrapped in one extra brace pair);
//! 2. plain standard JSON, either a full compiler input with `sources`
//!    and `settings`, or a bare filename -> `{"content": ...}` map;
//! 3. a raw Solidity blob: the contract was verified already flattened.
//!
//! Shapes 1 and 2 become a virtual filename map plus any compiler
//! remappings declared in `settings.remappings`; shape 3 is passed through
//! untouched as a terminal node.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::FlattenError;
use crate::remap::parse_solc_rule;

/// A parsed verified-contract payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifiedPayload {
    /// An already-flattened source blob; no further import extraction.
    Flattened(String),
    /// A multi-file map with the contract's own compiler remappings.
    MultiFile {
        /// Virtual filename -> source text, sorted for determinism.
        sources: BTreeMap<String, String>,
        /// Remappings declared in the payload's compiler settings.
        remappings: Vec<(String, String)>,
    },
}

impl VerifiedPayload {
    /// Interpret a raw `SourceCode` string.
    pub fn parse(raw: &str) -> Result<Self, FlattenError> {
        let trimmed = raw.trim();

        let value = match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => value,
            Err(_) => match unwrap_double_braces(trimmed)
                .and_then(|inner| serde_json::from_str::<Value>(inner).ok())
            {
                Some(value) => value,
                None => {
                    debug!("payload is not JSON, treating as an already-flattened source");
                    return Ok(VerifiedPayload::Flattened(trimmed.to_string()));
                }
            },
        };

        let object = value
            .as_object()
            .ok_or_else(|| FlattenError::payload("parsed source is not an object"))?;

        let sources_value = object.get("sources").unwrap_or(&value);
        let sources_map = sources_value
            .as_object()
            .ok_or_else(|| FlattenError::payload("'sources' is not an object"))?;

        let mut sources = BTreeMap::new();
        for (filename, entry) in sources_map {
            if let Some(content) = entry.get("content").and_then(Value::as_str) {
                sources.insert(filename.clone(), content.to_string());
            }
        }
        if sources.is_empty() {
            return Err(FlattenError::payload("payload contains no sources"));
        }

        let remappings = object
            .get("settings")
            .and_then(|settings| settings.get("remappings"))
            .and_then(Value::as_array)
            .map(|rules| {
                rules
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(parse_solc_rule)
                    .collect()
            })
            .unwrap_or_default();

        Ok(VerifiedPayload::MultiFile {
            sources,
            remappings,
        })
    }
}

/// Strip the outer brace pair of a double-wrapped payload, if it has one.
fn unwrap_double_braces(s: &str) -> Option<&str> {
    if s.len() >= 4 && s.starts_with("{{") && s.ends_with("}}") {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

// ============================================================================
// Tests
// ============================================================================
