//! Project discovery, module index, and incremental updates for tsns.
//!
//! # Overview
//!
//! - [`FileWalker`]: directory traversal that prunes `node_modules`, `dist`
//!   and the other skipped directories
//! - [`SourceTree`]: the host seam for listing and reading files, with
//!   [`DiskTree`] over the real file system
//! - [`ProjectIndex`]: per-project buckets of importable modules behind a
//!   `RwLock`, answering completion queries
//! - [`IndexEngine`]: a single background task that applies change events
//!   in order and debounces full rescans
//! - [`IndexStats`]: atomic activity counters
//!
//! # Example
//!
//! ```no_run
//! use tsns_core::ScanConfig;
//! use tsns_index::{DiskTree, ProjectIndex};
//! use camino::Utf8Path;
//!
//! let tree = DiskTree::new(&ScanConfig::default())?;
//! let index = ProjectIndex::new(tree.rules().clone());
//! index.rebuild_from(&tree)?;
//!
//! for module in index.query(Utf8Path::new("src/main.ts"), "str") {
//!     println!("import * as {} from '{}';", module.module_name, module.import_path);
//! }
//! # Ok::<(), tsns_index::IndexError>(())
//! ```
//!
//! # Crate Dependencies
//!
//! ```text
//! tsns-cli ──► tsns-index ──► tsns-core
//!          └─► tsns-watcher ─────►
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod discovery;
pub mod engine;
pub mod error;
pub mod index;
pub mod project;
pub mod stats;
pub mod tree;
pub mod walker;

#[cfg(test)]
mod test_support;

pub use discovery::discover_projects;
pub use engine::{EngineConfig, IndexEngine};
pub use error::IndexError;
pub use index::{DirectoryRemoval, IndexState, ProjectIndex, build_index_state};
pub use project::{ProjectSet, ProjectSummary, TsProject};
pub use stats::{IndexStats, StatsSnapshot};
pub use tree::{DiskTree, SourceTree};
pub use walker::{FileWalker, TreeListing};
