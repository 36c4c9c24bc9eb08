//! File change taxonomy.
//!
//! Hosts translate whatever their change feed reports into [`FileEvent`]s.
//! A move or rename is delivered as [`FileEvent::Moved`] and applied as a
//! delete of the old path followed by a create of the new one.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::paths::{is_tsconfig, is_typescript_source};

/// A change reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum FileEvent {
    /// A file appeared (created, copied, moved in).
    Created(Utf8PathBuf),
    /// A file disappeared. The path may also have been a directory.
    Deleted(Utf8PathBuf),
    /// A file or directory changed location or name.
    Moved {
        /// Previous location.
        from: Utf8PathBuf,
        /// New location.
        to: Utf8PathBuf,
    },
    /// A file's content changed.
    ContentChanged(Utf8PathBuf),
    /// A directory appeared, possibly with files in it.
    DirectoryCreated(Utf8PathBuf),
    /// A directory and everything below it disappeared.
    DirectoryDeleted(Utf8PathBuf),
}

impl FileEvent {
    /// Every path the event mentions.
    #[must_use]
    pub fn paths(&self) -> Vec<&Utf8Path> {
        match self {
            Self::Created(path)
            | Self::Deleted(path)
            | Self::ContentChanged(path)
            | Self::DirectoryCreated(path)
            | Self::DirectoryDeleted(path) => vec![path.as_path()],
            Self::Moved { from, to } => vec![from.as_path(), to.as_path()],
        }
    }
}

/// What a path names, judged from its name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// A `tsconfig.json`.
    TsConfig,
    /// A `.ts` or `.tsx` file.
    Source,
    /// Anything else, typically a directory.
    Other,
}

impl PathKind {
    /// Classifies a path by its file name.
    ///
    /// ```
    /// use tsns_core::PathKind;
    /// use camino::Utf8Path;
    ///
    /// assert_eq!(PathKind::of(Utf8Path::new("/p/tsconfig.json")), PathKind::TsConfig);
    /// assert_eq!(PathKind::of(Utf8Path::new("/p/src/a.ts")), PathKind::Source);
    /// assert_eq!(PathKind::of(Utf8Path::new("/p/src/legacy")), PathKind::Other);
    /// ```
    #[must_use]
    pub fn of(path: &Utf8Path) -> Self {
        if is_tsconfig(path) {
            Self::TsConfig
        } else if is_typescript_source(path) {
            Self::Source
        } else {
            Self::Other
        }
    }
}
