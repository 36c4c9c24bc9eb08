//! Error types for the tsns-index crate.
//!
//! This module provides the [`IndexError`] type for errors that can occur
//! while walking a source tree, reading configs, or talking to the engine.

use camino::Utf8PathBuf;

/// Errors that can occur during indexing operations.
///
/// # Error Recovery Strategy
///
/// - **Walker errors** ([`IndexError::Walk`]): the walk root itself could not
///   be read; the previous index stays in place. Unreadable entries below it
///   never get here, they are skipped and counted
/// - **File read errors** ([`IndexError::Read`]): log warning, skip the file or
///   project, continue
/// - **Engine stopped** ([`IndexError::EngineStopped`]): the background task is
///   gone; no further updates are applied
///
/// # Examples
///
/// ```
/// use tsns_index::IndexError;
///
/// fn handle_error(err: IndexError) {
///     match err {
///         IndexError::Walk(e) => eprintln!("Walk error: {e}"),
///         IndexError::Read { path, .. } => eprintln!("Read error: {path}"),
///         IndexError::InvalidRoot { path, reason } => eprintln!("Bad root {path}: {reason}"),
///         IndexError::EngineStopped => eprintln!("Engine stopped"),
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Failed to walk a directory.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// Failed to read a file.
    #[error("failed to read file {path}: {source}")]
    Read {
        /// The path of the file that couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The root of a walk is missing or not a directory.
    #[error("invalid root '{path}': {reason}")]
    InvalidRoot {
        /// The rejected root.
        path: Utf8PathBuf,
        /// Explanation of why the root is invalid.
        reason: String,
    },

    /// The update engine's background task has exited.
    #[error("index engine has stopped")]
    EngineStopped,
}

impl IndexError {
    /// Creates a new [`IndexError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`IndexError::InvalidRoot`] error.
    #[inline]
    pub fn invalid_root(path: impl Into<Utf8PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidRoot {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error is recoverable (indexing can continue).
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Read { .. })
    }

    /// Returns `true` if this error is fatal for the current operation.
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Read { path, .. } | Self::InvalidRoot { path, .. } => Some(path),
            Self::Walk(_) | Self::EngineStopped => None,
        }
    }
}
