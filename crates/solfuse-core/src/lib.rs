//! Import resolution and flattening engine for Solidity sources.
//!
//! This crate turns a root source and its transitive imports into one
//! deduplicated, dependency-ordered text artifact:
//! - comment/string-aware import extraction
//! - remapping-aware path resolution, including relative imports inside
//!   remapped trees
//! - cycle-safe depth-first dependency ordering
//! - import stripping and SPDX header consolidation
//!
//! The engine consumes raw text through the [`source::SourceRepository`]
//! capability and returns a flattened string; it never performs network
//! calls or writes files itself.

pub mod assemble;
pub mod error;
pub mod extract;
pub mod flatten;
pub mod graph;
pub mod payload;
pub mod remap;
pub mod resolve;
pub mod source;

pub use assemble::{assemble, AssembleOptions};
pub use error::{ErrorCode, FlattenError, FlattenWarning};
pub use extract::{extract_imports, ImportDirective, Span};
pub use flatten::{flatten, flatten_blob, FlattenOptions, FlattenOutput};
pub use graph::{DependencyGraph, GraphBuilder, NodeState, SourceNode};
pub use payload::VerifiedPayload;
pub use remap::{parse_solc_rule, RemappingRule, RemappingTable};
pub use resolve::{resolve, ResolutionContext, Resolved, Scope};
pub use source::{ExplorerSource, FolderSource, SingleFileSource, SourceContent, SourceRepository};
