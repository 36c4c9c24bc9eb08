//! Index statistics with atomic counters.
//!
//! All counters use [`AtomicU64`] with [`Relaxed`](Ordering::Relaxed)
//! ordering. They are informational and shared between the engine task, the
//! blocking scan threads and readers.
//!
//! # Examples
//!
//! ```
//! use tsns_index::IndexStats;
//!
//! let stats = IndexStats::new();
//! stats.increment_full_scans();
//! stats.increment_files_inserted();
//!
//! let snapshot = stats.snapshot();
//! assert_eq!(snapshot.full_scans, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters describing index activity.
#[derive(Debug, Default)]
pub struct IndexStats {
    full_scans: AtomicU64,
    rescans_scheduled: AtomicU64,
    rescans_coalesced: AtomicU64,
    files_inserted: AtomicU64,
    files_removed: AtomicU64,
    config_errors: AtomicU64,
    io_errors: AtomicU64,
}

impl IndexStats {
    /// Creates a new [`IndexStats`] with all counters at zero.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the completed full scan counter.
    #[inline]
    pub fn increment_full_scans(&self) {
        self.full_scans.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the debounced rescan request counter.
    #[inline]
    pub fn increment_rescans_scheduled(&self) {
        self.rescans_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the counter of rescan requests absorbed by a later one.
    #[inline]
    pub fn increment_rescans_coalesced(&self) {
        self.rescans_coalesced.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the incremental insert counter.
    #[inline]
    pub fn increment_files_inserted(&self) {
        self.files_inserted.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds to the incremental removal counter.
    #[inline]
    pub fn add_files_removed(&self, count: u64) {
        self.files_removed.fetch_add(count, Ordering::Relaxed);
    }

    /// Increments the skipped tsconfig counter.
    #[inline]
    pub fn increment_config_errors(&self) {
        self.config_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the I/O failure counter.
    #[inline]
    pub fn increment_io_errors(&self) {
        self.io_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Adds to the I/O failure counter.
    #[inline]
    pub fn add_io_errors(&self, count: u64) {
        self.io_errors.fetch_add(count, Ordering::Relaxed);
    }

    /// Returns a point-in-time snapshot of all counters.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            full_scans: self.full_scans.load(Ordering::Relaxed),
            rescans_scheduled: self.rescans_scheduled.load(Ordering::Relaxed),
            rescans_coalesced: self.rescans_coalesced.load(Ordering::Relaxed),
            files_inserted: self.files_inserted.load(Ordering::Relaxed),
            files_removed: self.files_removed.load(Ordering::Relaxed),
            config_errors: self.config_errors.load(Ordering::Relaxed),
            io_errors: self.io_errors.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of [`IndexStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Completed full scans, including the initial one.
    pub full_scans: u64,
    /// Debounced rescans requested by config or topology changes.
    pub rescans_scheduled: u64,
    /// Requests absorbed by a later request within the quiet window.
    pub rescans_coalesced: u64,
    /// Files inserted by change events.
    pub files_inserted: u64,
    /// Files removed by change events.
    pub files_removed: u64,
    /// `tsconfig.json` files skipped because they failed to parse.
    pub config_errors: u64,
    /// Reads or walks that failed.
    pub io_errors: u64,
}

impl StatsSnapshot {
    /// Rescans that actually ran after a debounce window.
    #[must_use]
    pub const fn debounced_rescans(&self) -> u64 {
        self.rescans_scheduled.saturating_sub(self.rescans_coalesced)
    }
}
