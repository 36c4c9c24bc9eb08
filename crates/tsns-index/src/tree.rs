//! Access to the monitored source tree.
//!
//! The index never touches the file system directly; it goes through
//! [`SourceTree`], so hosts with their own virtual file system (or tests with
//! an in-memory one) can supply listings and config text.

use camino::{Utf8Path, Utf8PathBuf};
use tsns_core::{IgnoreRules, ScanConfig};

use crate::error::IndexError;
use crate::walker::{FileWalker, TreeListing};

/// Directory listing and file reading for one root.
///
/// Implementations must be usable from the blocking thread pool, hence the
/// `Send + Sync + 'static` bound.
pub trait SourceTree: Send + Sync + 'static {
    /// The monitored root directory.
    fn root(&self) -> &Utf8Path;

    /// Lists configs and sources below `dir`, skipped directories pruned.
    ///
    /// Entries that can't be read are counted in [`TreeListing::skipped`]
    /// rather than failing the walk.
    fn walk(&self, dir: &Utf8Path) -> Result<TreeListing, IndexError>;

    /// Reads a file as UTF-8 text.
    fn read_to_string(&self, path: &Utf8Path) -> Result<String, IndexError>;

    /// Returns `true` if `path` currently is a directory.
    fn is_dir(&self, path: &Utf8Path) -> bool;
}

/// [`SourceTree`] over the real file system.
#[derive(Debug, Clone)]
pub struct DiskTree {
    root: Utf8PathBuf,
    rules: IgnoreRules,
    follow_links: bool,
}

impl DiskTree {
    /// Creates a tree for `config.root_path`.
    ///
    /// The root is canonicalized so that paths reported by the walker and
    /// by the file watcher share one spelling.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidRoot`] if the root is missing or not a
    /// directory.
    pub fn new(config: &ScanConfig) -> Result<Self, IndexError> {
        let root = config
            .root_path
            .canonicalize_utf8()
            .map_err(|e| IndexError::invalid_root(&config.root_path, e.to_string()))?;
        if !root.is_dir() {
            return Err(IndexError::invalid_root(root, "not a directory"));
        }

        let rules = IgnoreRules::from_config(config).with_root(&root);
        Ok(Self {
            root,
            rules,
            follow_links: config.follow_links,
        })
    }

    /// The exclusion rules this tree walks with.
    #[must_use]
    pub fn rules(&self) -> &IgnoreRules {
        &self.rules
    }
}

impl SourceTree for DiskTree {
    fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn walk(&self, dir: &Utf8Path) -> Result<TreeListing, IndexError> {
        FileWalker::new(dir, self.rules.clone())?
            .with_follow_links(self.follow_links)
            .collect()
    }

    fn read_to_string(&self, path: &Utf8Path) -> Result<String, IndexError> {
        std::fs::read_to_string(path).map_err(|e| IndexError::read(path, e))
    }

    fn is_dir(&self, path: &Utf8Path) -> bool {
        path.is_dir()
    }
}
