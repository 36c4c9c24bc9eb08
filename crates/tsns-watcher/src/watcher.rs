//! File watcher with async event streaming.
//!
//! [`FileWatcher`] runs the `notify` debouncer on a blocking thread and
//! forwards each debounced path as a [`FileEvent`] over a tokio channel.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                    Blocking Thread (spawn_blocking)              │
//! │  ┌───────────────────┐   ┌──────────────┐   ┌─────────────────┐  │
//! │  │ RecommendedWatcher│ ->│ Debouncer    │ ->│ filter + probe  │  │
//! │  │ (notify)          │   │ (100ms)      │   │ path -> event   │  │
//! │  └───────────────────┘   └──────────────┘   └────────┬────────┘  │
//! └──────────────────────────────────────────────────────│───────────┘
//!                                          blocking_send │
//!                                                        ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                    Async Runtime (tokio)                         │
//! │   FileWatcher::recv() -> IndexEngine::on_file_event()            │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The debouncer only reports that something happened at a path, so the
//! kind of change is recovered by looking at the path once the window has
//! closed:
//!
//! | Path now is            | Event                          |
//! |------------------------|--------------------------------|
//! | a directory            | [`FileEvent::DirectoryCreated`]|
//! | a `tsconfig.json`      | [`FileEvent::ContentChanged`]  |
//! | any other file         | [`FileEvent::Created`]         |
//! | missing                | [`FileEvent::Deleted`]         |
//!
//! A modified source is reported as `Created`; the index treats a repeated
//! insert as a replace. A vanished directory is reported as `Deleted`; the
//! index decides from the name whether it was a file.

use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tsns_core::paths::is_tsconfig;
use tsns_core::{FileEvent, WatchConfig};

use crate::error::WatchError;
use crate::filter::FileFilter;

/// Events buffered between the watcher thread and the consumer.
const CHANNEL_CAPACITY: usize = 256;

/// Maps a debounced path to a change event by probing the file system.
///
/// ```
/// use tsns_core::FileEvent;
/// use tsns_watcher::event_for_path;
/// use camino::Utf8PathBuf;
///
/// let gone = Utf8PathBuf::from("/definitely/not/here.ts");
/// assert_eq!(event_for_path(gone.clone()), FileEvent::Deleted(gone));
/// ```
#[must_use]
pub fn event_for_path(path: Utf8PathBuf) -> FileEvent {
    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_dir() => FileEvent::DirectoryCreated(path),
        Ok(_) if is_tsconfig(&path) => FileEvent::ContentChanged(path),
        Ok(_) => FileEvent::Created(path),
        Err(_) => FileEvent::Deleted(path),
    }
}

/// A file watcher that streams [`FileEvent`]s to an async context.
///
/// Dropping the watcher signals the blocking thread to stop;
/// [`shutdown`](Self::shutdown) also waits for it.
///
/// # Examples
///
/// ```no_run
/// use tsns_watcher::{FileWatcher, SourceFilter};
/// use tsns_core::{IgnoreRules, WatchConfig};
/// use camino::Utf8Path;
///
/// # async fn example() -> Result<(), tsns_watcher::WatchError> {
/// let root = Utf8Path::new("./repo");
/// let mut watcher = FileWatcher::new(
///     root,
///     &WatchConfig::default(),
///     SourceFilter::new(IgnoreRules::new(root)),
/// ).await?;
///
/// while let Some(event) = watcher.recv().await {
///     println!("Changed: {event:?}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct FileWatcher {
    /// Set to `None` once shutdown has been signalled.
    shutdown_tx: Option<oneshot::Sender<()>>,
    task_handle: Option<JoinHandle<Result<(), WatchError>>>,
    event_rx: mpsc::Receiver<FileEvent>,
    watch_path: Utf8PathBuf,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher")
            .field("watch_path", &self.watch_path)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl FileWatcher {
    /// Starts watching `path`.
    ///
    /// The path is canonicalized, so reported paths match those of a walk
    /// over the canonical root.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::RootNotFound`] if the path doesn't exist.
    #[allow(clippy::unused_async)]
    pub async fn new<F: FileFilter>(
        path: &Utf8Path,
        config: &WatchConfig,
        filter: F,
    ) -> Result<Self, WatchError> {
        if !path.exists() {
            return Err(WatchError::RootNotFound(path.to_owned()));
        }
        let watch_path = path.canonicalize_utf8()?;

        let (event_tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task_path = watch_path.clone();
        let debounce = Duration::from_millis(config.debounce_ms);
        let recursive = config.recursive;

        let task_handle = tokio::task::spawn_blocking(move || {
            run_watcher_loop(task_path, debounce, recursive, event_tx, shutdown_rx, filter)
        });

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(task_handle),
            event_rx,
            watch_path,
        })
    }

    /// Receives the next event; `None` once the watcher has stopped.
    pub async fn recv(&mut self) -> Option<FileEvent> {
        self.event_rx.recv().await
    }

    /// Receives an event if one is already buffered.
    ///
    /// Lets a consumer drain pending changes before answering a query.
    pub fn try_recv(&mut self) -> Option<FileEvent> {
        self.event_rx.try_recv().ok()
    }

    /// The canonical watched path.
    #[must_use]
    pub fn watch_path(&self) -> &Utf8Path {
        &self.watch_path
    }

    /// Returns `true` while the watcher thread is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shutdown_tx.is_some() && self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the watcher thread and waits for it.
    ///
    /// # Errors
    ///
    /// Returns the error the watcher thread stopped with, or
    /// [`WatchError::ThreadDied`] if it panicked.
    pub async fn shutdown(mut self) -> Result<(), WatchError> {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(handle) = self.task_handle.take() {
            match handle.await {
                Ok(result) => result?,
                Err(_join_error) => return Err(WatchError::ThreadDied),
            }
        }

        Ok(())
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[allow(clippy::needless_pass_by_value)]
fn run_watcher_loop<F: FileFilter>(
    path: Utf8PathBuf,
    debounce: Duration,
    recursive: bool,
    event_tx: mpsc::Sender<FileEvent>,
    shutdown_rx: oneshot::Receiver<()>,
    filter: F,
) -> Result<(), WatchError> {
    let root = path.clone();
    let debouncer: Result<Debouncer<notify::RecommendedWatcher>, notify::Error> =
        new_debouncer(debounce, move |res: DebounceEventResult| match res {
            Ok(events) => {
                for event in events {
                    let utf8_path = match Utf8PathBuf::try_from(event.path) {
                        Ok(p) => p,
                        Err(e) => {
                            tracing::warn!(
                                path = %e.into_path_buf().display(),
                                "Skipping non-UTF-8 path in file event"
                            );
                            continue;
                        }
                    };

                    // The root changes whenever anything directly below it does.
                    if utf8_path == root {
                        continue;
                    }
                    if !filter.should_process(&utf8_path) {
                        tracing::trace!(path = %utf8_path, "Filtered out file event");
                        continue;
                    }

                    let file_event = event_for_path(utf8_path);
                    tracing::trace!(event = ?file_event, "Forwarding file event");
                    if event_tx.blocking_send(file_event).is_err() {
                        tracing::debug!("Event channel closed, stopping watcher");
                        break;
                    }
                }
            }
            Err(error) => tracing::warn!(error = %error, "Debouncer error"),
        });

    let mut debouncer = debouncer?;

    let mode = if recursive {
        RecursiveMode::Recursive
    } else {
        RecursiveMode::NonRecursive
    };
    debouncer.watcher().watch(path.as_std_path(), mode)?;

    tracing::info!(path = %path, recursive, "File watcher started");

    let _ = shutdown_rx.blocking_recv();

    tracing::info!(path = %path, "File watcher stopped");

    Ok(())
}
