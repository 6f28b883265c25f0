//! Remapping table: ordered prefix -> target rules with longest-match wins.
//!
//! Rules redirect an import path prefix to an alternate location, e.g.
//! `@oz/contracts` -> `node_modules/@openzeppelin/contracts`. Matching
//! normalizes every prefix with a trailing `/` so `@oz` never captures
//! `@oz-custom/...`. A remapped target may itself start with another
//! remappable prefix; substitution is re-applied until the path settles,
//! bounded by [`MAX_SUBSTITUTIONS`].

use tracing::warn;

use crate::error::{FlattenError, FlattenWarning};

/// Substitution rounds allowed before a rule set is declared looping.
pub const MAX_SUBSTITUTIONS: usize = 8;

/// A single prefix -> target redirection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemappingRule {
    /// Import path prefix, matched on `/` boundaries.
    pub prefix: String,
    /// Replacement for the matched prefix.
    pub target: String,
}

/// Ordered set of remapping rules.
///
/// Read-only after construction. Longest prefix wins; among rules with the
/// same prefix the first-declared one wins and the duplicate is recorded as
/// a warning.
#[derive(Debug, Default, Clone)]
pub struct RemappingTable {
    rules: Vec<RemappingRule>,
    warnings: Vec<FlattenWarning>,
}

impl RemappingTable {
    /// An empty table: every lookup misses.
    pub fn new() -> Self {
        RemappingTable::default()
    }

    /// Build a table from `(prefix, target)` pairs in declaration order.
    pub fn from_pairs<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut table = RemappingTable::new();
        for (prefix, target) in pairs {
            table.insert(prefix.into(), target.into());
        }
        table
    }

    fn insert(&mut self, prefix: String, target: String) {
        if self.rules.iter().any(|r| r.prefix == prefix) {
            warn!(prefix = %prefix, "duplicate remapping prefix, keeping the first-declared rule");
            self.warnings
                .push(FlattenWarning::DuplicateRemapPrefix { prefix });
            return;
        }
        self.rules.push(RemappingRule { prefix, target });
    }

    /// Merge externally declared rules (e.g. from a verified-contract
    /// payload's compiler settings). On an exact prefix collision the
    /// incoming rule replaces the existing target; otherwise it is appended.
    pub fn merge_pairs<I, S, T>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        for (prefix, target) in pairs {
            let (prefix, target) = (prefix.into(), target.into());
            match self.rules.iter_mut().find(|r| r.prefix == prefix) {
                Some(rule) => rule.target = target,
                None => self.rules.push(RemappingRule { prefix, target }),
            }
        }
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Warnings accumulated during construction.
    pub fn warnings(&self) -> &[FlattenWarning] {
        &self.warnings
    }

    /// One substitution round: the longest matching prefix, if any.
    fn substitute(&self, path: &str) -> Option<String> {
        let mut best: Option<(&RemappingRule, usize)> = None;
        for rule in &self.rules {
            let boundary = if rule.prefix.ends_with('/') {
                rule.prefix.clone()
            } else {
                format!("{}/", rule.prefix)
            };
            if path.starts_with(&boundary) || path == rule.prefix {
                let matched = boundary.len().min(path.len());
                // strictly longer wins, so first-declared survives ties
                if best.map_or(true, |(_, len)| matched > len) {
                    best = Some((rule, matched));
                }
            }
        }
        best.map(|(rule, matched)| {
            let remainder = &path[matched.min(path.len())..];
            if remainder.is_empty() {
                rule.target.clone()
            } else {
                format!("{}/{}", rule.target.trim_end_matches('/'), remainder)
            }
        })
    }

    /// Resolve `path` through the table.
    ///
    /// Returns `Ok(None)` if no prefix matches, `Ok(Some(substituted))`
    /// after at most [`MAX_SUBSTITUTIONS`] rounds, and a fatal
    /// [`FlattenError::MalformedRemapping`] if the rules keep substituting
    /// past the cap.
    pub fn apply(&self, path: &str) -> Result<Option<String>, FlattenError> {
        let mut current = path.to_string();
        let mut substituted = false;
        for _ in 0..MAX_SUBSTITUTIONS {
            match self.substitute(&current) {
                Some(next) => {
                    current = next;
                    substituted = true;
                }
                None => return Ok(substituted.then_some(current)),
            }
        }
        // a chain of exactly MAX_SUBSTITUTIONS rounds may have settled;
        // only a path that still substitutes is looping
        if self.substitute(&current).is_none() {
            return Ok(Some(current));
        }
        Err(FlattenError::malformed_remapping(format!(
            "substitution for '{path}' did not settle after {MAX_SUBSTITUTIONS} rounds"
        )))
    }
}

/// Parse one solc-style rule string: `prefix=target` or
/// `context:prefix=target` (the context segment is dropped).
pub fn parse_solc_rule(rule: &str) -> Option<(String, String)> {
    let (lhs, target) = rule.split_once('=')?;
    let prefix = match lhs.split_once(':') {
        Some((_context, prefix)) => prefix,
        None => lhs,
    };
    let (prefix, target) = (prefix.trim(), target.trim());
    if prefix.is_empty() || target.is_empty() {
        return None;
    }
    Some((prefix.to_string(), target.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
