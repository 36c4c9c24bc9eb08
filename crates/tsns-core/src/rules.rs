//! Which paths are eligible for indexing.
//!
//! [`IgnoreRules`] is shared by the walker, the index and the watcher filter
//! so that a file reached by a full scan and the same file reported by a
//! change event are judged identically.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};

use crate::FxHashSet;
use crate::config::ScanConfig;
use crate::paths::{is_declaration_file, is_typescript_source};

/// Directory and file-kind exclusions for one monitored root.
///
/// Directory names are matched against path components below the root, so a
/// root that itself lives under a `build/` directory still works.
///
/// # Examples
///
/// ```
/// use tsns_core::IgnoreRules;
/// use camino::Utf8Path;
///
/// let rules = IgnoreRules::new(Utf8Path::new("/repo"));
/// assert!(rules.accepts_source(Utf8Path::new("/repo/src/a.ts")));
/// assert!(!rules.accepts_source(Utf8Path::new("/repo/node_modules/x/a.ts")));
/// assert!(!rules.accepts_source(Utf8Path::new("/repo/src/types.d.ts")));
/// ```
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    root: Utf8PathBuf,
    skip_dirs: Arc<FxHashSet<String>>,
    include_declarations: bool,
}

impl IgnoreRules {
    /// Creates rules with the built-in skip list for `root`.
    #[must_use]
    pub fn new(root: &Utf8Path) -> Self {
        Self::from_config(&ScanConfig {
            root_path: root.to_owned(),
            ..ScanConfig::default()
        })
    }

    /// Creates rules from a scan configuration.
    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        Self {
            root: config.root_path.clone(),
            skip_dirs: Arc::new(config.all_skip_dirs().map(str::to_owned).collect()),
            include_declarations: config.include_declarations,
        }
    }

    /// Replaces the root, e.g. after canonicalization.
    #[must_use]
    pub fn with_root(mut self, root: &Utf8Path) -> Self {
        root.clone_into(&mut self.root);
        self
    }

    /// The monitored root.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns `true` if a directory with this name is never descended into.
    #[inline]
    #[must_use]
    pub fn is_skipped_dir_name(&self, name: &str) -> bool {
        self.skip_dirs.contains(name)
    }

    /// Returns `true` if `dir`, or any directory between the root and it,
    /// is skipped.
    #[must_use]
    pub fn is_skipped_dir(&self, dir: &Utf8Path) -> bool {
        let relative = dir.strip_prefix(&self.root).unwrap_or(dir);
        relative
            .components()
            .any(|component| self.is_skipped_dir_name(component.as_str()))
    }

    /// Returns `true` if the file at `path` lives below a skipped directory.
    #[must_use]
    pub fn is_in_skipped_dir(&self, path: &Utf8Path) -> bool {
        path.parent().is_some_and(|parent| self.is_skipped_dir(parent))
    }

    /// Returns `true` for `.ts`/`.tsx` files outside skipped directories,
    /// excluding declaration files unless configured.
    #[must_use]
    pub fn accepts_source(&self, path: &Utf8Path) -> bool {
        is_typescript_source(path)
            && (self.include_declarations || !is_declaration_file(path))
            && !self.is_in_skipped_dir(path)
    }
}
