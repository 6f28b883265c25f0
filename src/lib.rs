//! Solfuse: a Solidity source flattener.
//!
//! Merges a contract and its whole import graph into one deduplicated,
//! dependency-ordered `.sol` file, from a local file, a project folder,
//! or a block explorer's verified-source record.

// Flattening engine - re-exported from solfuse-core
pub use solfuse_core;
pub use solfuse_core::{
    flatten, flatten_blob, ErrorCode, FlattenError, FlattenOptions, FlattenOutput, FlattenWarning,
    RemappingTable, Scope,
};

// CLI surface
pub mod cli;
pub mod config;
pub mod error;
pub mod explorer;
pub mod output;
