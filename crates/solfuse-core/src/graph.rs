//! Dependency graph construction: cycle-safe, deduplicated, dependency-first.
//!
//! The builder walks imports depth-first from one or more roots. Nodes
//! live in an arena keyed by canonical identifier and move through three
//! states:
//!
//! ```text
//! Unvisited -> InProgress -> Finalized
//! ```
//!
//! Meeting an `InProgress` node is a back-edge: the cycle chain is
//! recorded as a diagnostic and the edge is treated as satisfied, so
//! traversal always terminates. Meeting a `Finalized` node is the
//! deduplication path: content is fetched and scanned exactly once per
//! canonical identifier. A node is appended to `order` only after all of
//! its imports are finalized, which makes `order` dependency-first for
//! the graph obtained after cutting back-edges.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{FlattenError, FlattenWarning};
use crate::extract::{extract_imports, Span};
use crate::remap::RemappingTable;
use crate::resolve::{parent_dir, resolve, ResolutionContext, Scope};
use crate::source::SourceRepository;

// ============================================================================
// Graph Data
// ============================================================================

/// Traversal state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Created but not yet scanned.
    Unvisited,
    /// On the traversal stack; imports being processed.
    InProgress,
    /// All imports processed; position in `order` fixed.
    Finalized,
}

/// One resolved import edge, with the byte span to strip at assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEdge {
    /// The import path as written in the source.
    pub raw_path: String,
    /// Byte range of the whole import statement.
    pub span: Span,
    /// Canonical identifier the path resolved to.
    pub resolved_id: String,
}

/// One source in the arena. Immutable once finalized.
#[derive(Debug)]
pub struct SourceNode {
    /// Canonical identifier (arena key).
    pub id: String,
    /// Raw content, imports still in place.
    pub content: String,
    /// Resolved import edges in source order.
    pub edges: Vec<ImportEdge>,
    /// Traversal state.
    pub state: NodeState,
}

/// The result of a traversal.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Arena of nodes keyed by canonical identifier.
    pub nodes: HashMap<String, SourceNode>,
    /// Dependency-first order; every id exactly once.
    pub order: Vec<String>,
    /// Detected back-edge chains, diagnostic only.
    pub cycles: Vec<Vec<String>>,
    /// Non-fatal conditions met during the walk.
    pub warnings: Vec<FlattenWarning>,
}

// ============================================================================
// Builder
// ============================================================================

/// Depth-first dependency graph builder.
pub struct GraphBuilder<'a> {
    repo: &'a dyn SourceRepository,
    table: &'a RemappingTable,
    scope: Scope,
    lenient: bool,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder over a repository and remapping table.
    pub fn new(repo: &'a dyn SourceRepository, table: &'a RemappingTable, scope: Scope) -> Self {
        GraphBuilder {
            repo,
            table,
            scope,
            lenient: false,
        }
    }

    /// In lenient mode a missing import is recorded and skipped instead
    /// of aborting the flatten.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Traverse from each root in turn, accumulating one shared graph.
    ///
    /// Later roots reuse nodes already finalized by earlier ones, so the
    /// combined `order` still lists every reachable source exactly once.
    pub fn build<I, S>(&self, roots: I) -> Result<DependencyGraph, FlattenError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut graph = DependencyGraph {
            warnings: self.table.warnings().to_vec(),
            ..DependencyGraph::default()
        };
        // requested spelling -> canonical id, so suffix-matched lookups
        // do not refetch
        let mut aliases: HashMap<String, String> = HashMap::new();
        let mut chain: Vec<String> = Vec::new();

        for root in roots {
            self.visit(&mut graph, &mut aliases, root.as_ref(), &mut chain)?;
        }
        Ok(graph)
    }

    fn visit(
        &self,
        graph: &mut DependencyGraph,
        aliases: &mut HashMap<String, String>,
        requested: &str,
        chain: &mut Vec<String>,
    ) -> Result<(), FlattenError> {
        if let Some(canonical) = aliases.get(requested).cloned() {
            return self.revisit(graph, chain, &canonical);
        }

        let Some(fetched) = self.repo.fetch(requested)? else {
            if self.lenient {
                let importer = chain.last().cloned().unwrap_or_default();
                warn!(path = %requested, importer = %importer, "skipping unresolvable import");
                graph.warnings.push(FlattenWarning::SkippedMissingImport {
                    path: requested.to_string(),
                    importer,
                });
                return Ok(());
            }
            return Err(FlattenError::missing_import(requested, chain.clone()));
        };

        let canonical = fetched.id;
        aliases.insert(requested.to_string(), canonical.clone());
        if requested != canonical {
            aliases.insert(canonical.clone(), canonical.clone());
            // the suffix match may have landed on a node we already hold
            if graph.nodes.contains_key(&canonical) {
                return self.revisit(graph, chain, &canonical);
            }
        }

        let extraction = extract_imports(&fetched.text);
        for issue in extraction.issues {
            warn!(file = %canonical, offset = issue.offset, "{}", issue.message);
            graph.warnings.push(FlattenWarning::ImportSyntax {
                file: canonical.clone(),
                offset: issue.offset,
                message: issue.message,
            });
        }

        let context = ResolutionContext {
            table: self.table,
            current_dir: parent_dir(&canonical),
            scope: self.scope,
        };
        let mut edges = Vec::with_capacity(extraction.directives.len());
        for directive in extraction.directives {
            let resolved = resolve(&directive.raw_path, &context, &canonical)?;
            debug!(from = %canonical, raw = %directive.raw_path, to = %resolved.id, "resolved import");
            edges.push(ImportEdge {
                raw_path: directive.raw_path,
                span: directive.span,
                resolved_id: resolved.id,
            });
        }

        let targets: Vec<String> = edges.iter().map(|e| e.resolved_id.clone()).collect();
        graph.nodes.insert(
            canonical.clone(),
            SourceNode {
                id: canonical.clone(),
                content: fetched.text,
                edges,
                state: NodeState::InProgress,
            },
        );

        chain.push(canonical.clone());
        for target in targets {
            self.visit(graph, aliases, &target, chain)?;
        }
        chain.pop();

        if let Some(node) = graph.nodes.get_mut(&canonical) {
            node.state = NodeState::Finalized;
        }
        debug!(id = %canonical, position = graph.order.len(), "finalized");
        graph.order.push(canonical);
        Ok(())
    }

    /// Handle an identifier whose node already exists in the arena.
    fn revisit(
        &self,
        graph: &mut DependencyGraph,
        chain: &[String],
        canonical: &str,
    ) -> Result<(), FlattenError> {
        let state = graph
            .nodes
            .get(canonical)
            .map(|n| n.state)
            .unwrap_or(NodeState::Unvisited);
        if state == NodeState::InProgress {
            let start = chain
                .iter()
                .position(|id| id == canonical)
                .unwrap_or(chain.len().saturating_sub(1));
            let mut cycle: Vec<String> = chain[start..].to_vec();
            cycle.push(canonical.to_string());
            warn!(cycle = %cycle.join(" -> "), "cyclic import, cutting back-edge");
            graph.cycles.push(cycle);
        }
        // Finalized: already ordered, nothing to do
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
