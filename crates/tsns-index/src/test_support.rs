//! In-memory [`SourceTree`] for tests.

use std::collections::BTreeMap;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::RwLock;
use tsns_core::IgnoreRules;
use tsns_core::paths::{is_tsconfig, is_typescript_source};

use crate::error::IndexError;
use crate::tree::SourceTree;
use crate::walker::TreeListing;

/// A file map that can be edited while an engine reads it.
#[derive(Debug)]
pub struct MemoryTree {
    root: Utf8PathBuf,
    rules: IgnoreRules,
    files: RwLock<BTreeMap<Utf8PathBuf, String>>,
}

impl MemoryTree {
    pub fn new(root: &str) -> Self {
        let root = Utf8PathBuf::from(root);
        Self {
            rules: IgnoreRules::new(&root),
            root,
            files: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.write(path, content);
        self
    }

    pub fn write(&self, path: &str, content: &str) {
        self.files
            .write()
            .insert(Utf8PathBuf::from(path), content.to_owned());
    }

    pub fn delete(&self, path: &str) {
        self.files.write().remove(Utf8Path::new(path));
    }

    pub fn delete_dir(&self, dir: &str) {
        self.files
            .write()
            .retain(|path, _| !path.starts_with(dir));
    }

    pub fn rules(&self) -> &IgnoreRules {
        &self.rules
    }
}

impl SourceTree for MemoryTree {
    fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn walk(&self, dir: &Utf8Path) -> Result<TreeListing, IndexError> {
        let mut listing = TreeListing::default();
        for path in self.files.read().keys() {
            let Ok(below) = path.strip_prefix(dir) else {
                continue;
            };
            let pruned = below
                .parent()
                .is_some_and(|parent| {
                    parent
                        .components()
                        .any(|c| self.rules.is_skipped_dir_name(c.as_str()))
                });
            if pruned {
                continue;
            }
            if is_tsconfig(path) {
                listing.tsconfigs.push(path.clone());
            } else if is_typescript_source(path) {
                listing.sources.push(path.clone());
            }
        }
        Ok(listing)
    }

    fn read_to_string(&self, path: &Utf8Path) -> Result<String, IndexError> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| IndexError::read(path, io::Error::from(io::ErrorKind::NotFound)))
    }

    fn is_dir(&self, path: &Utf8Path) -> bool {
        self.files
            .read()
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }
}
