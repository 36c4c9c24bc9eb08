//! File watcher feeding change events to the tsns index.
//!
//! Changes are detected through `notify`, debounced with
//! `notify-debouncer-mini`, mapped onto [`tsns_core::FileEvent`] and
//! streamed over a tokio channel.
//!
//! # Usage
//!
//! ```no_run
//! use tsns_watcher::{FileWatcher, SourceFilter};
//! use tsns_core::{IgnoreRules, WatchConfig};
//! use camino::Utf8Path;
//!
//! # async fn example() -> Result<(), tsns_watcher::WatchError> {
//! let root = Utf8Path::new("/path/to/repo");
//! let filter = SourceFilter::new(IgnoreRules::new(root));
//! let mut watcher = FileWatcher::new(root, &WatchConfig::default(), filter).await?;
//!
//! while let Some(event) = watcher.recv().await {
//!     // engine.on_file_event(event)?;
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod error;
pub mod filter;
pub mod watcher;

pub use error::WatchError;
pub use filter::{FileFilter, SourceFilter};
pub use watcher::{FileWatcher, event_for_path};
