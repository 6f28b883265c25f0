//! Source repositories: the content-lookup capability behind the engine.
//!
//! The graph builder only ever sees the [`SourceRepository`] trait; it
//! never branches on backend type. Three implementations cover the three
//! input shapes:
//!
//! - [`SingleFileSource`]: one root file, everything else read from disk
//!   (the shape used when flattening one file with remapped libraries).
//! - [`FolderSource`]: every `.sol` file under a project root, preloaded
//!   into memory and keyed by root-relative path.
//! - [`ExplorerSource`]: the multi-file map of a verified-contract
//!   payload, keyed by the payload's virtual filenames.
//!
//! `fetch` returns the repository's canonical spelling of the identifier
//! alongside the content; for disk-backed repositories that is the
//! requested identifier itself, while the explorer map may land on a key
//! through unique-suffix matching.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::resolve::to_virtual_path;

// ============================================================================
// Trait
// ============================================================================

/// A source with its canonical identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContent {
    /// Canonical identifier: the deduplication key for this source.
    pub id: String,
    /// Raw source text.
    pub text: String,
}

/// Content lookup: canonical identifier in, source text out.
pub trait SourceRepository {
    /// Fetch the content behind an identifier.
    ///
    /// `Ok(None)` means the identifier is well-formed but nothing exists
    /// behind it; I/O failures other than "not found" surface as errors.
    fn fetch(&self, id: &str) -> io::Result<Option<SourceContent>>;
}

fn read_if_exists(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

// ============================================================================
// Single-file backend
// ============================================================================

/// Repository for flattening one file without a project tree.
///
/// The root's content is preloaded; any other identifier is treated as a
/// filesystem path, which is how remapped library imports resolve in this
/// mode.
#[derive(Debug)]
pub struct SingleFileSource {
    root_id: String,
    content: String,
}

impl SingleFileSource {
    /// Read the root file and derive its canonical identifier.
    pub fn open(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        Ok(SingleFileSource {
            root_id: to_virtual_path(&absolute),
            content,
        })
    }

    /// Build from an identifier and content already in hand (tests, APIs).
    pub fn from_content(root_id: impl Into<String>, content: impl Into<String>) -> Self {
        SingleFileSource {
            root_id: root_id.into(),
            content: content.into(),
        }
    }

    /// Canonical identifier of the root file.
    pub fn root_id(&self) -> &str {
        &self.root_id
    }
}

impl SourceRepository for SingleFileSource {
    fn fetch(&self, id: &str) -> io::Result<Option<SourceContent>> {
        if id == self.root_id {
            return Ok(Some(SourceContent {
                id: self.root_id.clone(),
                text: self.content.clone(),
            }));
        }
        Ok(read_if_exists(Path::new(id))?.map(|text| SourceContent {
            id: id.to_string(),
            text,
        }))
    }
}

// ============================================================================
// Folder backend
// ============================================================================

/// Repository over every `.sol` file under a project root.
#[derive(Debug)]
pub struct FolderSource {
    files: BTreeMap<String, String>,
}

impl FolderSource {
    /// Walk `root` and preload every Solidity source beneath it.
    ///
    /// Identifiers are root-relative forward-slash paths; the sorted map
    /// keeps iteration deterministic.
    pub fn scan(root: &Path) -> io::Result<Self> {
        let mut files = BTreeMap::new();
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some("sol") {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(io::Error::other)?;
            let id = to_virtual_path(relative);
            debug!(id = %id, "collected source");
            files.insert(id, fs::read_to_string(entry.path())?);
        }
        Ok(FolderSource { files })
    }

    /// All collected identifiers in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of collected sources.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the walk found no sources.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SourceRepository for FolderSource {
    fn fetch(&self, id: &str) -> io::Result<Option<SourceContent>> {
        if let Some(text) = self.files.get(id) {
            return Ok(Some(SourceContent {
                id: id.to_string(),
                text: text.clone(),
            }));
        }
        // absolute identifiers come from remapping targets outside the
        // tree; the resolver has already sanctioned them
        if id.starts_with('/') {
            return Ok(read_if_exists(Path::new(id))?.map(|text| SourceContent {
                id: id.to_string(),
                text,
            }));
        }
        Ok(None)
    }
}

// ============================================================================
// Explorer backend
// ============================================================================

/// Repository over the virtual filename map of a verified contract.
#[derive(Debug)]
pub struct ExplorerSource {
    files: BTreeMap<String, String>,
}

impl ExplorerSource {
    /// Build from a virtual filename -> source map.
    pub fn new(files: BTreeMap<String, String>) -> Self {
        ExplorerSource { files }
    }

    /// All virtual filenames in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of sources in the payload.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the payload map is empty.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SourceRepository for ExplorerSource {
    fn fetch(&self, id: &str) -> io::Result<Option<SourceContent>> {
        if let Some(text) = self.files.get(id) {
            return Ok(Some(SourceContent {
                id: id.to_string(),
                text: text.clone(),
            }));
        }
        // Verified payloads are frequently keyed by longer project paths
        // than the import paths written in the sources. A unique suffix
        // match recovers those; the sorted map makes a multi-candidate
        // pick deterministic.
        let suffix = format!("/{id}");
        let mut candidates = self.files.keys().filter(|key| key.ends_with(&suffix));
        let first = candidates.next();
        let rest = candidates.count();
        match first {
            Some(key) => {
                if rest > 0 {
                    warn!(
                        id = %id,
                        chosen = %key,
                        others = rest,
                        "ambiguous suffix match in verified payload"
                    );
                }
                Ok(Some(SourceContent {
                    id: key.clone(),
                    text: self.files[key].clone(),
                }))
            }
            None => Ok(None),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
