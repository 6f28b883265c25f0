//! Canonical identifier resolution for import paths.
//!
//! A raw import string plus the importing file's context becomes a
//! canonical identifier: the deduplication key the graph builder and the
//! repositories agree on. Resolution is purely lexical; whether content
//! exists behind an identifier is the repository's call, so the builder
//! can tell "resolvable path, missing content" apart from "unresolvable
//! path".
//!
//! Relative imports resolve against the directory of the importer's
//! **canonical** identifier. Because that identifier is already
//! post-remapping, a `./Sibling.sol` import inside a remapped library
//! subtree lands in the remapped directory, not wherever the importer was
//! originally referenced from.

use std::path::Path;

use crate::error::FlattenError;
use crate::remap::RemappingTable;

// ============================================================================
// Context
// ============================================================================

/// Scope rule applied to resolved identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// No boundary: single-file and explorer modes.
    Unbounded,
    /// Identifiers must stay inside the root (folder mode). Remapping
    /// targets are sanctioned subtrees and exempt from the check.
    Bounded,
}

/// Everything one resolution call needs. Never mutated.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionContext<'a> {
    /// Remapping rules in effect.
    pub table: &'a RemappingTable,
    /// Directory of the importing file's canonical identifier.
    pub current_dir: &'a str,
    /// Scope rule for the active source repository.
    pub scope: Scope,
}

/// A successfully resolved import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Canonical identifier.
    pub id: String,
    /// Whether a remapping rule produced this identifier.
    pub via_remapping: bool,
}

// ============================================================================
// Lexical Path Helpers
// ============================================================================

/// Lexically normalize a forward-slash path.
///
/// Drops `.` and empty segments and folds `..` into its parent where one
/// exists. Leading `..` segments survive on relative paths (that is what
/// the scope check looks for) and are clamped away on absolute ones.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&"..") | None => {
                    if !absolute {
                        segments.push("..");
                    }
                }
                Some(_) => {
                    segments.pop();
                }
            },
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Join a relative path onto a directory, without normalizing.
fn join(dir: &str, path: &str) -> String {
    if dir.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), path)
    }
}

/// Directory portion of an identifier (empty for top-level names).
pub fn parent_dir(id: &str) -> &str {
    match id.rfind('/') {
        Some(0) => "/",
        Some(pos) => &id[..pos],
        None => "",
    }
}

/// Render a filesystem path as a forward-slash identifier.
pub fn to_virtual_path(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    normalize(&raw)
}

fn is_relative(path: &str) -> bool {
    path.starts_with("./") || path.starts_with("../") || path == "." || path == ".."
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve a raw import string into a canonical identifier.
///
/// `importer` is the canonical identifier of the file containing the
/// import, used only for diagnostics.
pub fn resolve(
    raw: &str,
    ctx: &ResolutionContext<'_>,
    importer: &str,
) -> Result<Resolved, FlattenError> {
    if is_relative(raw) {
        let id = normalize(&join(ctx.current_dir, raw));
        // an absolute importer directory means the importer itself was
        // reached through a remapping; its subtree is sanctioned
        if !ctx.current_dir.starts_with('/') {
            check_scope(&id, raw, importer, ctx.scope)?;
        }
        return Ok(Resolved {
            id,
            via_remapping: false,
        });
    }

    if let Some(substituted) = ctx.table.apply(raw)? {
        // a remapped target may itself be written relative to the importer
        let id = if is_relative(&substituted) {
            normalize(&join(ctx.current_dir, &substituted))
        } else {
            normalize(&substituted)
        };
        return Ok(Resolved {
            id,
            via_remapping: true,
        });
    }

    let id = normalize(raw);
    check_scope(&id, raw, importer, ctx.scope)?;
    Ok(Resolved {
        id,
        via_remapping: false,
    })
}

fn check_scope(id: &str, raw: &str, importer: &str, scope: Scope) -> Result<(), FlattenError> {
    if scope == Scope::Bounded && escapes_root(id) {
        return Err(FlattenError::out_of_scope(raw, importer));
    }
    Ok(())
}

fn escapes_root(id: &str) -> bool {
    // identifiers inside the root are always root-relative; anything
    // climbing above it or naming an absolute location is outside
    id == ".." || id.starts_with("../") || id.starts_with('/')
}

// ============================================================================
// Tests
// ============================================================================
