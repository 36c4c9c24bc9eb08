//! Core types, tsconfig model, and module classification for tsns.
//!
//! This crate holds everything that is pure computation:
//!
//! - [`paths`] - lexical path helpers and module-name derivation
//! - [`tsconfig`] - the parsed `compilerOptions` subset and its JSON5 adapter
//! - [`classify`] - the per-project module classifier
//! - [`import`] - import statement rendering and detection
//! - [`rules`] - which paths are eligible for indexing
//! - Configuration structures and error types
//! - Domain types (`FileEvent`, `BareModule`, `ModuleForCompletion`)
//!
//! Nothing here touches the file system except [`Config::load`].

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod classify;
pub mod config;
pub mod error;
pub mod import;
pub mod paths;
pub mod rules;
pub mod tsconfig;
pub mod types;

pub use classify::{ModuleEvaluation, evaluate_module_for_ts_project};
pub use config::{CompletionConfig, Config, IndexConfig, ScanConfig, WatchConfig};
pub use error::{ConfigError, TsConfigError};
pub use import::QuoteStyle;
pub use rules::IgnoreRules;
pub use tsconfig::{TsConfigData, parse_tsconfig};
pub use types::{BareModule, FileEvent, ModuleForCompletion, PathKind, RelativeModule};

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;
