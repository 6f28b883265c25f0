//! Remapping configuration parsing.
//!
//! Remappings arrive either inline (`@oz=lib/oz,@prb=lib/prb`) or as a
//! `.json` / `.toml` document of prefix -> target pairs. Both surfaces
//! have identical semantics. Unlike the engine's warn-and-keep-first rule,
//! the CLI rejects duplicate prefixes outright: a user who wrote the same
//! prefix twice almost certainly made a mistake worth stopping for.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::SolfuseError;

/// Parse a remapping specification into `(prefix, target)` pairs.
///
/// `spec` is either an inline list or a path ending in `.json` / `.toml`.
pub fn parse_remappings(spec: Option<&str>) -> Result<Vec<(String, String)>, SolfuseError> {
    let Some(spec) = spec else {
        return Ok(Vec::new());
    };
    if spec.ends_with(".json") || spec.ends_with(".toml") {
        parse_remapping_file(Path::new(spec))
    } else {
        parse_inline(spec)
    }
}

fn parse_inline(spec: &str) -> Result<Vec<(String, String)>, SolfuseError> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    for entry in spec.split(',') {
        let Some((prefix, target)) = entry.split_once('=') else {
            return Err(SolfuseError::config(format!(
                "invalid remapping entry '{entry}': expected 'prefix=target'"
            )));
        };
        push_checked(&mut pairs, prefix.trim(), target.trim())?;
    }
    Ok(pairs)
}

fn parse_remapping_file(path: &Path) -> Result<Vec<(String, String)>, SolfuseError> {
    let raw = fs::read_to_string(path).map_err(|err| {
        SolfuseError::config(format!(
            "could not read remapping file '{}': {err}",
            path.display()
        ))
    })?;

    // BTreeMap deserialization keeps the result deterministic regardless
    // of the document's key order
    let map: BTreeMap<String, String> = if path.extension().and_then(|e| e.to_str()) == Some("json")
    {
        serde_json::from_str(&raw).map_err(|err| {
            SolfuseError::config(format!("invalid JSON remapping file: {err}"))
        })?
    } else {
        toml::from_str(&raw).map_err(|err| {
            SolfuseError::config(format!("invalid TOML remapping file: {err}"))
        })?
    };

    let mut pairs = Vec::new();
    for (prefix, target) in map {
        push_checked(&mut pairs, prefix.trim(), target.trim())?;
    }
    Ok(pairs)
}

fn push_checked(
    pairs: &mut Vec<(String, String)>,
    prefix: &str,
    target: &str,
) -> Result<(), SolfuseError> {
    if prefix.is_empty() || target.is_empty() {
        return Err(SolfuseError::config(format!(
            "remapping entry '{prefix}={target}' has an empty side"
        )));
    }
    if pairs.iter().any(|(existing, _)| existing == prefix) {
        return Err(SolfuseError::config(format!(
            "duplicate remapping prefix '{prefix}'"
        )));
    }
    pairs.push((prefix.to_string(), target.to_string()));
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod inline {
        use super::*;

        #[test]
        fn single_pair() {
            let pairs = parse_remappings(Some("@oz=lib/oz")).unwrap();
            assert_eq!(pairs, vec![("@oz".to_string(), "lib/oz".to_string())]);
        }

        #[test]
        fn several_pairs_keep_order() {
            let pairs = parse_remappings(Some("@b=lib/b, @a=lib/a")).unwrap();
            assert_eq!(
                pairs,
                vec![
                    ("@b".to_string(), "lib/b".to_string()),
                    ("@a".to_string(), "lib/a".to_string()),
                ]
            );
        }

        #[test]
        fn missing_equals_is_rejected() {
            assert!(parse_remappings(Some("@oz,lib/oz")).is_err());
        }

        #[test]
        fn duplicate_prefix_is_rejected() {
            let err = parse_remappings(Some("@oz=a,@oz=b")).unwrap_err();
            assert!(err.to_string().contains("duplicate remapping prefix"));
        }

        #[test]
        fn none_yields_empty() {
            assert!(parse_remappings(None).unwrap().is_empty());
        }
    }

    mod files {
        use super::*;

        #[test]
        fn json_document() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("remap.json");
            fs::write(&path, r#"{"@oz": "lib/oz", "@prb": "lib/prb"}"#).unwrap();
            let pairs = parse_remappings(path.to_str()).unwrap();
            assert_eq!(pairs.len(), 2);
            assert!(pairs.contains(&("@oz".to_string(), "lib/oz".to_string())));
        }

        #[test]
        fn toml_document() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("remap.toml");
            fs::write(&path, "\"@oz\" = \"lib/oz\"\n").unwrap();
            let pairs = parse_remappings(path.to_str()).unwrap();
            assert_eq!(pairs, vec![("@oz".to_string(), "lib/oz".to_string())]);
        }

        #[test]
        fn missing_file_is_a_config_error() {
            let err = parse_remappings(Some("/definitely/not/here.json")).unwrap_err();
            assert!(err.to_string().contains("could not read"));
        }
    }
}
