//! Domain types shared across the workspace.
//!
//! - [`module`] - indexed module entries and query results
//! - [`event`] - the file change taxonomy consumed by the update engine

pub mod event;
pub mod module;

pub use event::{FileEvent, PathKind};
pub use module::{BareModule, ModuleForCompletion, RelativeModule};
