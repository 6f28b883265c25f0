//! Drivers for the three input modes: file, folder, and explorer scan.
//!
//! Each driver builds the right repository backend, runs the engine, and
//! writes the flattened output. Nothing is written to disk unless the
//! whole flatten succeeded.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use solfuse_core::{
    flatten, flatten_blob, FlattenOptions, FlattenOutput, FolderSource, RemappingTable, Scope,
    SingleFileSource, VerifiedPayload,
};

use crate::error::SolfuseError;
use crate::explorer::{fetch_verified_source, parse_target};

/// Options shared by all three drivers.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Remapping pairs from `--remappings`, already validated.
    pub remappings: Vec<(String, String)>,
    /// Skip unresolvable imports instead of failing.
    pub lenient: bool,
    /// Explicit output path from `--output`.
    pub output: Option<PathBuf>,
    /// Chain used when a scan target has no `chain:` prefix.
    pub chain: String,
    /// Explorer API key, if any.
    pub api_key: Option<String>,
}

/// The result of one successful run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Engine output, including cycles and warnings.
    pub flatten: FlattenOutput,
    /// Where the flattened source was written.
    pub path: PathBuf,
    /// Input mode: "file", "folder", or "scan".
    pub mode: &'static str,
}

// ============================================================================
// File mode
// ============================================================================

/// Flatten a single `.sol` file and everything it imports.
pub fn run_file(path: &Path, config: &RunConfig) -> Result<RunOutcome, SolfuseError> {
    let source = SingleFileSource::open(path)?;
    let table = remapping_table(config);
    let root = source.root_id().to_string();

    let output = flatten(
        [root],
        &source,
        &table,
        Scope::Unbounded,
        &FlattenOptions {
            lenient: config.lenient,
            license_override: None,
        },
    )?;

    let target = match &config.output {
        Some(path) => path.clone(),
        None => default_file_output(path),
    };
    write_output(&target, &output.text)?;
    Ok(RunOutcome {
        flatten: output,
        path: target,
        mode: "file",
    })
}

/// Output path beside the input: `Main.sol` -> `Main_flat.sol`.
fn default_file_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("source");
    input.with_file_name(format!("{stem}_flat.sol"))
}

// ============================================================================
// Folder mode
// ============================================================================

/// Flatten every `.sol` file found under a project root into one output.
pub fn run_folder(root: &Path, config: &RunConfig) -> Result<RunOutcome, SolfuseError> {
    let source = FolderSource::scan(root)?;
    if source.is_empty() {
        return Err(SolfuseError::config(format!(
            "no Solidity sources found under '{}'",
            root.display()
        )));
    }
    info!(files = source.len(), root = %root.display(), "scanned project tree");

    let table = remapping_table(config);
    let roots: Vec<String> = source.ids().map(String::from).collect();
    let output = flatten(
        &roots,
        &source,
        &table,
        Scope::Bounded,
        &FlattenOptions {
            lenient: config.lenient,
            license_override: None,
        },
    )?;

    let target = match &config.output {
        Some(path) => path.clone(),
        None => default_folder_output(root)?,
    };
    write_output(&target, &output.text)?;
    Ok(RunOutcome {
        flatten: output,
        path: target,
        mode: "folder",
    })
}

/// Output path beside the folder: `contracts/` -> `contracts_flat.sol`.
///
/// Canonicalizing first keeps inputs like `.` from producing a nameless
/// output file.
fn default_folder_output(root: &Path) -> Result<PathBuf, SolfuseError> {
    let canonical = root.canonicalize()?;
    let name = canonical
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("sources");
    Ok(canonical.with_file_name(format!("{name}_flat.sol")))
}

// ============================================================================
// Scan mode
// ============================================================================

/// Fetch a verified contract from a block explorer and flatten it.
pub fn run_scan(token: &str, config: &RunConfig) -> Result<RunOutcome, SolfuseError> {
    let target = parse_target(token, &config.chain)?;
    let contract = fetch_verified_source(&target, config.api_key.as_deref())?;

    let options = FlattenOptions {
        lenient: config.lenient,
        license_override: contract.license.clone(),
    };
    let output = match VerifiedPayload::parse(&contract.source)? {
        VerifiedPayload::Flattened(text) => {
            flatten_blob(&format!("{}.sol", contract.name), &text, &options)
        }
        VerifiedPayload::MultiFile {
            sources,
            remappings,
        } => {
            // the payload's own remappings win over CLI ones; the
            // verified build used them
            let mut table = remapping_table(config);
            table.merge_pairs(remappings);
            let repo = solfuse_core::ExplorerSource::new(sources);
            let roots: Vec<String> = repo.ids().map(String::from).collect();
            // no scope boundary here: the payload's virtual filenames are
            // the whole universe, so a path climbing above them simply
            // misses in the repository
            flatten(&roots, &repo, &table, Scope::Unbounded, &options)?
        }
    };

    let target_path = match &config.output {
        Some(path) => path.clone(),
        None => PathBuf::from(format!("{}_{}_flat.sol", target.address, target.chain)),
    };
    write_output(&target_path, &output.text)?;
    Ok(RunOutcome {
        flatten: output,
        path: target_path,
        mode: "scan",
    })
}

// ============================================================================
// Shared plumbing
// ============================================================================

fn remapping_table(config: &RunConfig) -> RemappingTable {
    RemappingTable::from_pairs(config.remappings.iter().cloned())
}

fn write_output(path: &Path, text: &str) -> Result<(), SolfuseError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, text)?;
    info!(path = %path.display(), bytes = text.len(), "wrote flattened output");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
