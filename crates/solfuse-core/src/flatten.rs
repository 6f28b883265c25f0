//! Pipeline entry points: traversal plus assembly in one call.
//!
//! All intermediate state lives in memory; a fatal error yields no partial
//! output.

use tracing::info;

use crate::assemble::{assemble, AssembleOptions};
use crate::error::{FlattenError, FlattenWarning};
use crate::graph::{DependencyGraph, GraphBuilder, NodeState, SourceNode};
use crate::remap::RemappingTable;
use crate::resolve::Scope;
use crate::source::SourceRepository;

/// Behavior knobs for one flatten run.
#[derive(Debug, Default, Clone)]
pub struct FlattenOptions {
    /// Skip unresolvable imports instead of aborting.
    pub lenient: bool,
    /// License expression replacing every collected SPDX identifier.
    pub license_override: Option<String>,
}

/// A completed flatten.
#[derive(Debug)]
pub struct FlattenOutput {
    /// The flattened artifact.
    pub text: String,
    /// Number of unique sources fused.
    pub file_count: usize,
    /// Cyclic import chains that were cut, diagnostic only.
    pub cycles: Vec<Vec<String>>,
    /// Non-fatal conditions met along the way.
    pub warnings: Vec<FlattenWarning>,
}

/// Flatten everything reachable from the given roots.
pub fn flatten<I, S>(
    roots: I,
    repo: &dyn SourceRepository,
    table: &RemappingTable,
    scope: Scope,
    options: &FlattenOptions,
) -> Result<FlattenOutput, FlattenError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let graph = GraphBuilder::new(repo, table, scope)
        .lenient(options.lenient)
        .build(roots)?;
    info!(files = graph.order.len(), cycles = graph.cycles.len(), "fusing sources");
    let text = assemble(
        &graph,
        &AssembleOptions {
            license_override: options.license_override.clone(),
        },
    );
    Ok(FlattenOutput {
        text,
        file_count: graph.order.len(),
        cycles: graph.cycles,
        warnings: graph.warnings,
    })
}

/// Assemble an already-flattened blob as a single terminal node.
///
/// No import extraction runs; the blob only passes through SPDX
/// consolidation and gets its boundary marker.
pub fn flatten_blob(id: &str, text: &str, options: &FlattenOptions) -> FlattenOutput {
    let mut graph = DependencyGraph::default();
    graph.nodes.insert(
        id.to_string(),
        SourceNode {
            id: id.to_string(),
            content: text.to_string(),
            edges: Vec::new(),
            state: NodeState::Finalized,
        },
    );
    graph.order.push(id.to_string());
    let text = assemble(
        &graph,
        &AssembleOptions {
            license_override: options.license_override.clone(),
        },
    );
    FlattenOutput {
        text,
        file_count: 1,
        cycles: Vec::new(),
        warnings: Vec::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================
