//! Directory traversal for project configs and TypeScript sources.
//!
//! [`FileWalker`] uses the `ignore` crate's [`WalkBuilder`] and prunes
//! skipped directories (`node_modules`, `dist`, ...) before descending into
//! them. `.gitignore` files are not consulted: a change event for a file
//! has to be judged exactly as a full walk would judge it, and events know
//! nothing about ignore files.
//!
//! # Examples
//!
//! ```no_run
//! use tsns_index::FileWalker;
//! use tsns_core::IgnoreRules;
//! use camino::Utf8Path;
//!
//! let root = Utf8Path::new("/path/to/repo");
//! let walker = FileWalker::new(root, IgnoreRules::new(root))?;
//! let listing = walker.collect()?;
//!
//! for config in &listing.tsconfigs {
//!     println!("Project: {config}");
//! }
//! # Ok::<(), tsns_index::IndexError>(())
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;
use tracing::warn;
use tsns_core::IgnoreRules;
use tsns_core::paths::{is_tsconfig, is_typescript_source};

use crate::error::IndexError;

/// Files found under one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeListing {
    /// Every `tsconfig.json` found.
    pub tsconfigs: Vec<Utf8PathBuf>,
    /// Every `.ts`/`.tsx` file found.
    pub sources: Vec<Utf8PathBuf>,
    /// Entries that could not be read or named and were left out.
    pub skipped: usize,
}

impl TreeListing {
    /// Returns `true` if nothing was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tsconfigs.is_empty() && self.sources.is_empty()
    }
}

/// A walker that discovers `tsconfig.json` files and TypeScript sources.
#[derive(Debug)]
pub struct FileWalker {
    /// The directory to walk.
    start: Utf8PathBuf,
    /// Directory exclusions.
    rules: IgnoreRules,
    /// Whether to follow symbolic links.
    follow_links: bool,
}

impl FileWalker {
    /// Creates a new walker for `start`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidRoot`] if `start` doesn't exist or isn't
    /// a directory.
    pub fn new(start: &Utf8Path, rules: IgnoreRules) -> Result<Self, IndexError> {
        if !start.exists() {
            return Err(IndexError::invalid_root(start, "does not exist"));
        }
        if !start.is_dir() {
            return Err(IndexError::invalid_root(start, "not a directory"));
        }

        Ok(Self {
            start: start.to_owned(),
            rules,
            follow_links: false,
        })
    }

    /// Configures whether to follow symbolic links.
    ///
    /// By default, symbolic links are not followed.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Walks the tree and sorts what it finds into configs and sources.
    ///
    /// An entry below the start directory that can't be read (vanished,
    /// dangling link, permission denied) or whose name isn't UTF-8 is
    /// logged, counted in [`TreeListing::skipped`] and left out.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Walk`] if the start directory itself can't be
    /// read.
    pub fn collect(&self) -> Result<TreeListing, IndexError> {
        let mut listing = TreeListing::default();

        for result in self.build_walker() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) if e.depth() == Some(0) => return Err(e.into()),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    listing.skipped += 1;
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let Some(path) = Utf8Path::from_path(entry.path()) else {
                warn!(path = %entry.path().display(), "Skipping non-UTF-8 path");
                listing.skipped += 1;
                continue;
            };

            if is_tsconfig(path) {
                listing.tsconfigs.push(path.to_owned());
            } else if is_typescript_source(path) {
                listing.sources.push(path.to_owned());
            }
        }

        Ok(listing)
    }

    /// Builds the ignore walker with configured settings.
    fn build_walker(&self) -> ignore::Walk {
        let rules = self.rules.clone();

        WalkBuilder::new(&self.start)
            .standard_filters(false)
            .follow_links(self.follow_links)
            // Use a single thread for walking (classification is parallel)
            .threads(1)
            .require_git(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                entry.depth() == 0
                    || !is_dir
                    || !entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| rules.is_skipped_dir_name(name))
            })
            .build()
    }

    /// Returns the directory being walked.
    #[inline]
    #[must_use]
    pub fn start(&self) -> &Utf8Path {
        &self.start
    }
}
