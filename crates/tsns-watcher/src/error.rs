//! Failures of the change feed.
//!
//! Per-event problems (a non-UTF-8 path, a debouncer hiccup) never surface
//! here: the watcher thread logs them and keeps going. A [`WatchError`]
//! means the feed could not start or has died.

use camino::Utf8PathBuf;

/// Why the watcher could not start or had to stop.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The OS watch could not be set up.
    #[error("cannot watch: {0}")]
    Notify(#[from] notify::Error),

    /// The requested root is missing.
    #[error("watch root {0} does not exist")]
    RootNotFound(Utf8PathBuf),

    /// The root could not be canonicalized.
    #[error("cannot resolve watch root: {0}")]
    Io(#[from] std::io::Error),

    /// The watcher thread panicked.
    #[error("watcher thread died")]
    ThreadDied,
}

impl WatchError {
    /// The root this error is about, when known.
    #[must_use]
    pub fn root(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::RootNotFound(root) => Some(root),
            Self::Notify(_) | Self::Io(_) | Self::ThreadDied => None,
        }
    }
}
