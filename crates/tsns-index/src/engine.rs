//! Serial application of change events to a [`ProjectIndex`].
//!
//! # Architecture
//!
//! ```text
//!  host / watcher                         background task (tokio)
//! ┌──────────────┐   Command (unbounded)  ┌────────────────────────────┐
//! │ IndexEngine  │ ─────────────────────> │ Worker                     │
//! │ (cloneable)  │                        │  - one command at a time   │
//! └──────────────┘                        │  - walks on spawn_blocking │
//!        ▲                                │  - one pending rescan slot │
//!        │ query()                        └──────────┬─────────────────┘
//!        │                                           │ debounce timer
//!  ┌─────┴────────┐                                  ▼
//!  │ ProjectIndex │ <──── RescanElapsed(generation) ─┘
//!  └──────────────┘
//! ```
//!
//! Every mutation runs on the worker in arrival order, so an event is never
//! applied against a half-built index. Config and topology changes don't
//! rescan right away: they arm a timer, and each new request within the quiet
//! window cancels the previous one. A full rescan only runs once things
//! settle, queued behind whatever the worker is already doing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use tsns_core::{FileEvent, IndexConfig, ModuleForCompletion, PathKind};

use crate::error::IndexError;
use crate::index::{DirectoryRemoval, ProjectIndex};
use crate::tree::SourceTree;

/// Default quiet window before a requested rescan runs.
pub const DEFAULT_RESCAN_DEBOUNCE: Duration = Duration::from_millis(1000);

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Quiet window before a config or topology change triggers a rescan.
    pub rescan_debounce: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rescan_debounce: DEFAULT_RESCAN_DEBOUNCE,
        }
    }
}

impl From<&IndexConfig> for EngineConfig {
    fn from(config: &IndexConfig) -> Self {
        Self {
            rescan_debounce: Duration::from_millis(config.rescan_debounce_ms),
        }
    }
}

#[derive(Debug)]
enum Command {
    FullScan,
    Event(FileEvent),
    RescanElapsed(u64),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Handle to the background update task.
///
/// Cloning is cheap; every clone talks to the same worker. The worker stops
/// when [`shutdown`](Self::shutdown) is called or every handle is dropped.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use tsns_core::{FileEvent, ScanConfig};
/// use tsns_index::{DiskTree, EngineConfig, IndexEngine, ProjectIndex};
/// use camino::Utf8Path;
///
/// # async fn example() -> Result<(), tsns_index::IndexError> {
/// let tree = DiskTree::new(&ScanConfig::default())?;
/// let index = Arc::new(ProjectIndex::new(tree.rules().clone()));
/// let engine = IndexEngine::spawn(Arc::new(tree), index, EngineConfig::default());
///
/// engine.initialize()?;
/// engine.on_file_event(FileEvent::Created("src/new_thing.ts".into()))?;
/// engine.flush().await?;
///
/// let completions = engine.query(Utf8Path::new("src/main.ts"), "ne");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct IndexEngine {
    tx: mpsc::UnboundedSender<Command>,
    index: Arc<ProjectIndex>,
    initialized: Arc<AtomicBool>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl IndexEngine {
    /// Starts the worker on the current tokio runtime.
    ///
    /// Nothing is scanned until [`initialize`](Self::initialize) is called.
    pub fn spawn(tree: Arc<dyn SourceTree>, index: Arc<ProjectIndex>, config: EngineConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Worker {
            rx,
            tx: tx.downgrade(),
            tree,
            index: Arc::clone(&index),
            debounce: config.rescan_debounce,
            pending: None,
            generation: 0,
        };
        let handle = tokio::spawn(worker.run());

        Self {
            tx,
            index,
            initialized: Arc::new(AtomicBool::new(false)),
            worker: Arc::new(Mutex::new(Some(handle))),
        }
    }

    /// Queues the initial full scan. Later calls do nothing.
    pub fn initialize(&self) -> Result<(), IndexError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.send(Command::FullScan)
    }

    /// Queues an immediate full rescan.
    pub fn force_rescan(&self) -> Result<(), IndexError> {
        self.send(Command::FullScan)
    }

    /// Queues a change event.
    pub fn on_file_event(&self, event: FileEvent) -> Result<(), IndexError> {
        self.send(Command::Event(event))
    }

    /// Waits until every command queued before this call has been applied.
    pub async fn flush(&self) -> Result<(), IndexError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(Command::Flush(done_tx))?;
        done_rx.await.map_err(|_| IndexError::EngineStopped)
    }

    /// Stops the worker after the commands already queued, cancelling any
    /// pending rescan.
    pub async fn shutdown(&self) {
        // The worker may already be gone.
        let _ = self.tx.send(Command::Shutdown);

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Index engine task failed");
            }
        }
    }

    /// Returns `true` while the worker is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// The index this engine maintains.
    #[must_use]
    pub fn index(&self) -> &Arc<ProjectIndex> {
        &self.index
    }

    /// Shorthand for [`ProjectIndex::query`].
    #[must_use]
    pub fn query(&self, from_file: &Utf8Path, prefix: &str) -> Vec<ModuleForCompletion> {
        self.index.query(from_file, prefix)
    }

    fn send(&self, command: Command) -> Result<(), IndexError> {
        self.tx.send(command).map_err(|_| IndexError::EngineStopped)
    }
}

struct PendingRescan {
    generation: u64,
    token: CancellationToken,
}

struct Worker {
    rx: mpsc::UnboundedReceiver<Command>,
    /// Weak so that the worker alone doesn't keep its channel open.
    tx: mpsc::WeakUnboundedSender<Command>,
    tree: Arc<dyn SourceTree>,
    index: Arc<ProjectIndex>,
    debounce: Duration,
    pending: Option<PendingRescan>,
    generation: u64,
}

impl Worker {
    async fn run(mut self) {
        debug!("Index engine started");

        while let Some(command) = self.rx.recv().await {
            match command {
                Command::FullScan => {
                    if self.cancel_pending() {
                        self.index.stats().increment_rescans_coalesced();
                    }
                    self.full_scan().await;
                }
                Command::Event(event) => self.apply(event).await,
                Command::RescanElapsed(generation) => {
                    if self
                        .pending
                        .as_ref()
                        .is_some_and(|pending| pending.generation == generation)
                    {
                        self.pending = None;
                        info!("Rescanning after configuration change");
                        self.full_scan().await;
                    } else {
                        trace!(generation, "Ignoring superseded rescan");
                    }
                }
                Command::Flush(done) => {
                    let _ = done.send(());
                }
                Command::Shutdown => break,
            }
        }

        self.cancel_pending();
        debug!("Index engine stopped");
    }

    async fn full_scan(&mut self) {
        let tree = Arc::clone(&self.tree);
        let index = Arc::clone(&self.index);

        match tokio::task::spawn_blocking(move || index.rebuild_from(tree.as_ref())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.index.stats().increment_io_errors();
                error!(error = %e, "Full scan failed, keeping previous index");
            }
            Err(e) => error!(error = %e, "Full scan task panicked"),
        }
    }

    async fn apply(&mut self, event: FileEvent) {
        trace!(?event, "Applying change");
        match event {
            FileEvent::Created(path) => self.created(path, false).await,
            FileEvent::DirectoryCreated(path) => self.created(path, true).await,
            FileEvent::Deleted(path) => self.deleted(&path, false),
            FileEvent::DirectoryDeleted(path) => self.deleted(&path, true),
            FileEvent::Moved { from, to } => {
                self.deleted(&from, false);
                self.created(to, false).await;
            }
            FileEvent::ContentChanged(path) => {
                if PathKind::of(&path) == PathKind::TsConfig && self.is_watched_config(&path) {
                    self.schedule_rescan(&path);
                }
            }
        }
    }

    async fn created(&mut self, path: Utf8PathBuf, is_dir: bool) {
        match PathKind::of(&path) {
            _ if is_dir => self.created_directory(path).await,
            PathKind::TsConfig => {
                if self.is_watched_config(&path) {
                    self.schedule_rescan(&path);
                }
            }
            PathKind::Source => self.insert(&path),
            PathKind::Other => self.created_directory(path).await,
        }
    }

    async fn created_directory(&mut self, dir: Utf8PathBuf) {
        if self.index.rules().is_skipped_dir(&dir) {
            trace!(dir = %dir, "Ignoring skipped directory");
            return;
        }

        let tree = Arc::clone(&self.tree);
        let walked = tokio::task::spawn_blocking(move || {
            if tree.is_dir(&dir) {
                tree.walk(&dir).map(|listing| Some((dir, listing)))
            } else {
                Ok(None)
            }
        })
        .await;

        let (dir, listing) = match walked {
            Ok(Ok(Some(found))) => found,
            Ok(Ok(None)) => return,
            Ok(Err(e)) => {
                self.index.stats().increment_io_errors();
                warn!(error = %e, "Failed to walk new directory");
                return;
            }
            Err(e) => {
                error!(error = %e, "Directory walk task panicked");
                return;
            }
        };

        self.index.stats().add_io_errors(listing.skipped as u64);
        debug!(
            dir = %dir,
            tsconfigs = listing.tsconfigs.len(),
            sources = listing.sources.len(),
            "Directory appeared"
        );

        for source in &listing.sources {
            self.insert(source);
        }
        if !listing.tsconfigs.is_empty() {
            self.schedule_rescan(&dir);
        }
    }

    fn deleted(&mut self, path: &Utf8Path, is_dir: bool) {
        match PathKind::of(path) {
            _ if is_dir => self.deleted_directory(path),
            PathKind::TsConfig => {
                if self.is_watched_config(path) {
                    self.schedule_rescan(path);
                }
            }
            PathKind::Source => {
                if self.index.remove(path) {
                    self.index.stats().add_files_removed(1);
                }
            }
            PathKind::Other => self.deleted_directory(path),
        }
    }

    fn deleted_directory(&mut self, dir: &Utf8Path) {
        match self.index.remove_directory(dir) {
            DirectoryRemoval::Removed(count) => {
                self.index.stats().add_files_removed(count as u64);
            }
            DirectoryRemoval::RescanRequired => self.schedule_rescan(dir),
        }
    }

    fn insert(&self, path: &Utf8Path) {
        if !self.index.should_index(path) {
            trace!(path = %path, "Ignoring excluded source");
            return;
        }
        self.index.classify_and_insert(path);
        self.index.stats().increment_files_inserted();
    }

    fn is_watched_config(&self, path: &Utf8Path) -> bool {
        !self.index.rules().is_in_skipped_dir(path)
    }

    /// Arms the rescan timer, replacing any pending one.
    fn schedule_rescan(&mut self, cause: &Utf8Path) {
        let stats = Arc::clone(self.index.stats());
        stats.increment_rescans_scheduled();
        if self.cancel_pending() {
            stats.increment_rescans_coalesced();
        }

        self.generation += 1;
        let generation = self.generation;
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let tx = self.tx.clone();
        let delay = self.debounce;

        debug!(cause = %cause, delay_ms = delay.as_millis(), "Rescan scheduled");

        tokio::spawn(async move {
            tokio::select! {
                () = cancelled.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    if let Some(tx) = tx.upgrade() {
                        let _ = tx.send(Command::RescanElapsed(generation));
                    }
                }
            }
        });

        self.pending = Some(PendingRescan { generation, token });
    }

    /// Cancels the pending timer. Returns `true` if one was armed.
    fn cancel_pending(&mut self) -> bool {
        self.pending.take().is_some_and(|pending| {
            pending.token.cancel();
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryTree;

    const DEBOUNCE: Duration = Duration::from_millis(50);
    const SETTLE: Duration = Duration::from_millis(250);

    fn tree() -> Arc<MemoryTree> {
        Arc::new(
            MemoryTree::new("/repo")
                .with_file(
                    "/repo/tsconfig.json",
                    r#"{ "compilerOptions": { "baseUrl": "src" } }"#,
                )
                .with_file("/repo/src/main.ts", "")
                .with_file("/repo/src/util/string_helper.ts", ""),
        )
    }

    async fn started(tree: &Arc<MemoryTree>) -> IndexEngine {
        let index = Arc::new(ProjectIndex::new(tree.rules().clone()));
        let engine = IndexEngine::spawn(
            Arc::clone(tree) as Arc<dyn SourceTree>,
            index,
            EngineConfig {
                rescan_debounce: DEBOUNCE,
            },
        );
        engine.initialize().unwrap();
        engine.flush().await.unwrap();
        engine
    }

    fn main_file() -> &'static Utf8Path {
        Utf8Path::new("/repo/src/main.ts")
    }

    #[tokio::test]
    async fn test_initialize_runs_once() {
        let tree = tree();
        let engine = started(&tree).await;
        engine.initialize().unwrap();
        engine.flush().await.unwrap();

        assert_eq!(engine.index().stats().snapshot().full_scans, 1);
        assert_eq!(engine.query(main_file(), "s")[0].import_path, "util/string_helper");
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_created_and_deleted_sources() {
        let tree = tree();
        let engine = started(&tree).await;

        tree.write("/repo/src/date_range.ts", "");
        engine
            .on_file_event(FileEvent::Created("/repo/src/date_range.ts".into()))
            .unwrap();
        engine
            .on_file_event(FileEvent::Created("/repo/dist/ignored.ts".into()))
            .unwrap();
        engine.flush().await.unwrap();
        assert_eq!(engine.query(main_file(), "d")[0].module_name, "dateRange");

        engine
            .on_file_event(FileEvent::Deleted("/repo/src/date_range.ts".into()))
            .unwrap();
        engine.flush().await.unwrap();
        assert!(engine.query(main_file(), "d").is_empty());

        let snapshot = engine.index().stats().snapshot();
        assert_eq!(snapshot.files_inserted, 1);
        assert_eq!(snapshot.files_removed, 1);
        assert_eq!(snapshot.full_scans, 1);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_move_is_delete_then_create() {
        let tree = tree();
        let engine = started(&tree).await;

        tree.delete("/repo/src/util/string_helper.ts");
        tree.write("/repo/src/util/text_helper.ts", "");
        engine
            .on_file_event(FileEvent::Moved {
                from: "/repo/src/util/string_helper.ts".into(),
                to: "/repo/src/util/text_helper.ts".into(),
            })
            .unwrap();
        engine.flush().await.unwrap();

        assert!(engine.query(main_file(), "s").is_empty());
        assert_eq!(engine.query(main_file(), "t")[0].import_path, "util/text_helper");
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_directory_events() {
        let tree = tree();
        let engine = started(&tree).await;

        tree.write("/repo/src/feature/a_thing.ts", "");
        tree.write("/repo/src/feature/b_thing.ts", "");
        engine
            .on_file_event(FileEvent::DirectoryCreated("/repo/src/feature".into()))
            .unwrap();
        engine.flush().await.unwrap();
        assert_eq!(engine.index().indexed_file_count(), 4);

        tree.delete_dir("/repo/src/feature");
        // A deleted path without an extension is taken for a directory.
        engine
            .on_file_event(FileEvent::Deleted("/repo/src/feature".into()))
            .unwrap();
        engine.flush().await.unwrap();
        assert_eq!(engine.index().indexed_file_count(), 2);
        assert_eq!(engine.index().stats().snapshot().files_removed, 2);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_dotted_directory_events() {
        let tree = tree();
        let engine = started(&tree).await;
        let main = main_file();

        tree.write("/repo/src/v1.2/client.ts", "");
        engine
            .on_file_event(FileEvent::Created("/repo/src/v1.2".into()))
            .unwrap();
        engine.flush().await.unwrap();
        assert_eq!(engine.query(main, "c")[0].import_path, "v1.2/client");

        tree.delete_dir("/repo/src/v1.2");
        engine
            .on_file_event(FileEvent::Deleted("/repo/src/v1.2".into()))
            .unwrap();
        engine.flush().await.unwrap();
        assert!(engine.query(main, "c").is_empty());
        assert_eq!(engine.index().indexed_file_count(), 2);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_config_changes_are_coalesced() {
        let tree = tree();
        let engine = started(&tree).await;

        tree.write(
            "/repo/tsconfig.json",
            r#"{ "compilerOptions": { "baseUrl": "src", "paths": { "@u/*": ["util/*"] } } }"#,
        );
        for _ in 0..3 {
            engine
                .on_file_event(FileEvent::ContentChanged("/repo/tsconfig.json".into()))
                .unwrap();
        }
        engine.flush().await.unwrap();
        // Nothing has been rescanned yet.
        assert_eq!(engine.query(main_file(), "s")[0].import_path, "util/string_helper");

        tokio::time::sleep(SETTLE).await;
        engine.flush().await.unwrap();

        let snapshot = engine.index().stats().snapshot();
        assert_eq!(snapshot.full_scans, 2);
        assert_eq!(snapshot.rescans_scheduled, 3);
        assert_eq!(snapshot.rescans_coalesced, 2);
        assert_eq!(snapshot.debounced_rescans(), 1);
        assert_eq!(engine.query(main_file(), "s")[0].import_path, "@u/string_helper");
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_new_project_directory_triggers_rescan() {
        let tree = tree();
        let engine = started(&tree).await;

        tree.write("/repo/packages/lib/tsconfig.json", "{}");
        tree.write("/repo/packages/lib/format.ts", "");
        engine
            .on_file_event(FileEvent::DirectoryCreated("/repo/packages".into()))
            .unwrap();
        tokio::time::sleep(SETTLE).await;
        engine.flush().await.unwrap();

        assert_eq!(engine.index().project_paths().len(), 2);
        let lib_file = Utf8Path::new("/repo/packages/lib/format.ts");
        assert_eq!(
            engine.index().owner_of(lib_file).as_deref(),
            Some(Utf8Path::new("/repo/packages/lib"))
        );

        tree.delete_dir("/repo/packages");
        engine
            .on_file_event(FileEvent::DirectoryDeleted("/repo/packages".into()))
            .unwrap();
        tokio::time::sleep(SETTLE).await;
        engine.flush().await.unwrap();
        assert_eq!(engine.index().project_paths().len(), 1);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_force_rescan_supersedes_pending() {
        let tree = tree();
        let engine = started(&tree).await;

        engine
            .on_file_event(FileEvent::ContentChanged("/repo/tsconfig.json".into()))
            .unwrap();
        engine.force_rescan().unwrap();
        tokio::time::sleep(SETTLE).await;
        engine.flush().await.unwrap();

        let snapshot = engine.index().stats().snapshot();
        assert_eq!(snapshot.full_scans, 2);
        assert_eq!(snapshot.debounced_rescans(), 0);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_skipped_config_is_ignored() {
        let tree = tree();
        let engine = started(&tree).await;

        engine
            .on_file_event(FileEvent::Created(
                "/repo/node_modules/pkg/tsconfig.json".into(),
            ))
            .unwrap();
        engine.flush().await.unwrap();
        assert_eq!(engine.index().stats().snapshot().rescans_scheduled, 0);
        engine.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_engine() {
        let tree = tree();
        let engine = started(&tree).await;
        assert!(engine.is_running());

        engine.shutdown().await;
        assert!(!engine.is_running());
        assert!(matches!(
            engine.on_file_event(FileEvent::Created("/repo/src/x.ts".into())),
            Err(IndexError::EngineStopped)
        ));
        assert!(engine.flush().await.is_err());
    }
}
