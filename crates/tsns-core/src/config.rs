//! Configuration structures for tsns.
//!
//! - [`ScanConfig`] - which directories are walked and which files count
//! - [`WatchConfig`] - change feed debouncing
//! - [`IndexConfig`] - the rescan quiet window of the update engine
//! - [`CompletionConfig`] - how completions are rendered
//! - [`Config`] - root configuration combining all settings
//!
//! Every struct is `#[serde(default)]`, so a JSON file only needs the fields
//! it changes.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::import::QuoteStyle;

/// Directories that are never indexed, whatever the configuration says.
pub const IGNORED_DIRECTORIES: &[&str] = &[
    "node_modules",
    ".git",
    "build",
    "dist",
    "out",
    ".idea",
    ".vscode",
];

/// Configuration for source discovery.
///
/// # Examples
///
/// ```
/// use tsns_core::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert!(config.skip_dirs.is_empty());
/// assert!(!config.include_declarations);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Root directory of the monitored tree.
    pub root_path: Utf8PathBuf,

    /// Directory names skipped in addition to [`IGNORED_DIRECTORIES`].
    pub skip_dirs: Vec<String>,

    /// Whether `*.d.ts` files are indexed.
    pub include_declarations: bool,

    /// Whether symbolic links are followed while walking.
    pub follow_links: bool,
}

impl ScanConfig {
    /// Every skipped directory name: the fixed list plus [`Self::skip_dirs`].
    pub fn all_skip_dirs(&self) -> impl Iterator<Item = &str> {
        IGNORED_DIRECTORIES
            .iter()
            .copied()
            .chain(self.skip_dirs.iter().map(String::as_str))
    }
}

/// Configuration for the file watcher.
///
/// # Examples
///
/// ```
/// use tsns_core::WatchConfig;
///
/// let config = WatchConfig::default();
/// assert_eq!(config.debounce_ms, 100);
/// assert!(config.recursive);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Debounce window in milliseconds.
    ///
    /// Multiple file changes within this window are batched together.
    pub debounce_ms: u64,

    /// Whether to watch subdirectories recursively.
    pub recursive: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            recursive: true,
        }
    }
}

/// Configuration for the incremental update engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Quiet window before a tsconfig change triggers a full rescan.
    pub rescan_debounce_ms: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            rescan_debounce_ms: 1000,
        }
    }
}

/// Configuration for completion rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Quote character around inserted import specifiers.
    pub quote_style: QuoteStyle,
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use tsns_core::Config;
///
/// let config = Config::default();
/// let json = serde_json::to_string_pretty(&config).unwrap();
/// assert!(json.contains("rescan_debounce_ms"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source discovery configuration.
    pub scan: ScanConfig,

    /// File watcher configuration.
    pub watch: WatchConfig,

    /// Update engine configuration.
    pub index: IndexConfig,

    /// Completion rendering configuration.
    pub completion: CompletionConfig,
}

impl Config {
    /// Loads a configuration from a JSON file.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Checks that the root exists and the numeric options are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let root = &self.scan.root_path;
        if root.as_str().is_empty() {
            return Err(ConfigError::InvalidPath {
                path: root.clone(),
                reason: "root path is empty".to_owned(),
            });
        }
        if !root.exists() {
            return Err(ConfigError::MissingDirectory(root.clone()));
        }
        if !root.is_dir() {
            return Err(ConfigError::InvalidPath {
                path: root.clone(),
                reason: "not a directory".to_owned(),
            });
        }
        if self.watch.debounce_ms == 0 {
            return Err(ConfigError::InvalidOption {
                option: "watch.debounce_ms".to_owned(),
                reason: "must be positive".to_owned(),
            });
        }
        Ok(())
    }
}
