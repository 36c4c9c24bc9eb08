//! Path filtering for watch events.
//!
//! Filtering happens on the watcher thread, before anything is sent to the
//! async side.
//!
//! # Examples
//!
//! ```
//! use tsns_watcher::{FileFilter, SourceFilter};
//! use tsns_core::IgnoreRules;
//! use camino::Utf8Path;
//!
//! let root = std::env::temp_dir();
//! let root = Utf8Path::from_path(&root).unwrap();
//! let filter = SourceFilter::new(IgnoreRules::new(root));
//!
//! assert!(filter.should_process(&root.join("src/app.ts")));
//! assert!(filter.should_process(&root.join("tsconfig.json")));
//! assert!(!filter.should_process(&root.join("node_modules/pkg/index.ts")));
//! ```

use camino::Utf8Path;
use tsns_core::IgnoreRules;
use tsns_core::paths::{is_tsconfig, is_typescript_source};

/// Decides which changed paths are forwarded.
///
/// Filters run on the blocking watcher thread and so must be
/// `Send + Sync + 'static`.
pub trait FileFilter: Send + Sync + 'static {
    /// Returns `true` if a change at `path` should be forwarded.
    fn should_process(&self, path: &Utf8Path) -> bool;
}

/// Forwards what the index may care about.
///
/// That is TypeScript sources, `tsconfig.json` files, directories (whatever
/// their name), and paths that no longer exist, since a vanished path may
/// have been a directory. Anything inside a skipped directory is dropped,
/// and so is a skipped directory itself.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    rules: IgnoreRules,
}

impl SourceFilter {
    /// Creates a filter that applies `rules`.
    #[must_use]
    pub const fn new(rules: IgnoreRules) -> Self {
        Self { rules }
    }
}

impl FileFilter for SourceFilter {
    fn should_process(&self, path: &Utf8Path) -> bool {
        if self.rules.is_skipped_dir(path) {
            return false;
        }
        if is_typescript_source(path) || is_tsconfig(path) {
            return true;
        }
        // `v1.2` and `feature.flags` are directories too.
        match std::fs::symlink_metadata(path) {
            Ok(meta) => meta.is_dir(),
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Utf8PathBuf, SourceFilter) {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap().to_owned();
        let filter = SourceFilter::new(IgnoreRules::new(&root));
        (dir, root, filter)
    }

    #[test]
    fn test_sources_and_configs_pass() {
        let (_dir, root, filter) = setup();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/a.ts"), "").unwrap();
        fs::write(root.join("src/A.tsx"), "").unwrap();

        assert!(filter.should_process(&root.join("src/a.ts")));
        assert!(filter.should_process(&root.join("src/A.tsx")));
        assert!(filter.should_process(&root.join("packages/lib/tsconfig.json")));
    }

    #[test]
    fn test_other_existing_files_are_dropped() {
        let (_dir, root, filter) = setup();
        fs::write(root.join("app.css"), "").unwrap();
        fs::write(root.join("package.json"), "{}").unwrap();
        fs::write(root.join("Makefile"), "").unwrap();

        assert!(!filter.should_process(&root.join("app.css")));
        assert!(!filter.should_process(&root.join("package.json")));
        assert!(!filter.should_process(&root.join("Makefile")));
    }

    #[test]
    fn test_dotted_directories_pass() {
        let (_dir, root, filter) = setup();
        fs::create_dir_all(root.join("src/v1.2")).unwrap();
        fs::create_dir_all(root.join("src/feature.flags")).unwrap();
        fs::create_dir_all(root.join("src/components")).unwrap();

        assert!(filter.should_process(&root.join("src/v1.2")));
        assert!(filter.should_process(&root.join("src/feature.flags")));
        assert!(filter.should_process(&root.join("src/components")));
    }

    #[test]
    fn test_vanished_paths_pass() {
        let (_dir, root, filter) = setup();
        // Gone before the event was looked at; may have been a directory.
        assert!(filter.should_process(&root.join("src/v2.0")));
        assert!(filter.should_process(&root.join("src/removed")));
    }

    #[test]
    fn test_skipped_dirs() {
        let (_dir, root, filter) = setup();
        fs::create_dir_all(root.join("node_modules/x")).unwrap();
        fs::create_dir_all(root.join("app/dist")).unwrap();

        assert!(!filter.should_process(&root.join("node_modules")));
        assert!(!filter.should_process(&root.join("node_modules/x/index.ts")));
        assert!(!filter.should_process(&root.join(".git/HEAD")));
        assert!(!filter.should_process(&root.join("app/dist/tsconfig.json")));
        assert!(filter.should_process(&root.join("src/dist.ts")));
    }
}
