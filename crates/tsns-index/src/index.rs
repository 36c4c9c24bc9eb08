//! The project index: which modules each project can import.
//!
//! [`ProjectIndex`] is the read side hosts query on every keystroke and the
//! write side the update engine mutates. State lives behind a
//! [`parking_lot::RwLock`]. Incremental updates hold the write lock only
//! while touching in-memory buckets; a full rescan builds a complete
//! [`IndexState`] without any lock and swaps it in, so queries never wait on
//! file system work.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, info};
use tsns_core::paths::bucket_key;
use tsns_core::{FxHashMap, FxHashSet, IgnoreRules, ModuleEvaluation, ModuleForCompletion};

use crate::discovery::discover_projects;
use crate::error::IndexError;
use crate::project::{ProjectEvaluations, ProjectSet, ProjectSummary};
use crate::stats::IndexStats;
use crate::tree::SourceTree;

/// Everything the index knows at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexState {
    projects: ProjectSet,
    /// Source file to the deepest project containing it.
    ownership: FxHashMap<Utf8PathBuf, Utf8PathBuf>,
    /// Every source file currently indexed.
    indexed: FxHashSet<Utf8PathBuf>,
}

impl IndexState {
    /// An index with projects but no files.
    #[must_use]
    pub fn with_projects(projects: ProjectSet) -> Self {
        Self {
            projects,
            ..Self::default()
        }
    }

    /// The known projects.
    #[must_use]
    pub fn projects(&self) -> &ProjectSet {
        &self.projects
    }

    /// Number of indexed source files.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.indexed.len()
    }

    /// Returns `true` if `file` is indexed.
    #[must_use]
    pub fn is_indexed(&self, file: &Utf8Path) -> bool {
        self.indexed.contains(file)
    }

    fn upsert(&mut self, file: &Utf8Path) -> usize {
        if self.indexed.contains(file) {
            self.projects.remove_everywhere(file);
        }
        let evaluations = self.projects.evaluate_all(file);
        let owner = self.projects.owner_by_longest_prefix(file).map(Utf8Path::to_owned);
        self.apply(file.to_owned(), evaluations, owner)
    }

    fn apply(
        &mut self,
        file: Utf8PathBuf,
        evaluations: ProjectEvaluations,
        owner: Option<Utf8PathBuf>,
    ) -> usize {
        let inserted = self.projects.apply(&file, evaluations);
        match owner {
            Some(owner) => {
                self.ownership.insert(file.clone(), owner);
            }
            None => {
                self.ownership.remove(&file);
            }
        }
        self.indexed.insert(file);
        inserted
    }

    fn remove(&mut self, file: &Utf8Path) -> bool {
        if !self.indexed.remove(file) {
            return false;
        }
        self.projects.remove_everywhere(file);
        self.ownership.remove(file);
        true
    }
}

/// Outcome of [`ProjectIndex::remove_directory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryRemoval {
    /// Files under the directory were dropped from the index.
    Removed(usize),
    /// The directory held a project; only a full rescan is correct.
    RescanRequired,
}

/// Scans `tree` from its root and builds a complete index.
///
/// Sources rejected by `rules` or lying under any project's `outDir` are
/// left out. Classification runs on the rayon pool; the merge is serial.
///
/// # Errors
///
/// Returns an error if the root can't be read. Unreadable entries and
/// invalid configs are skipped and counted, not reported.
pub fn build_index_state(
    tree: &dyn SourceTree,
    rules: &IgnoreRules,
    stats: &IndexStats,
) -> Result<IndexState, IndexError> {
    let listing = tree.walk(tree.root())?;
    stats.add_io_errors(listing.skipped as u64);
    let projects = discover_projects(tree, &listing.tsconfigs, stats);

    let sources: Vec<&Utf8PathBuf> = listing
        .sources
        .iter()
        .filter(|file| rules.accepts_source(file) && !projects.is_in_out_dir(file))
        .collect();

    debug!(
        projects = projects.len(),
        sources = sources.len(),
        "Classifying sources"
    );

    let classified: Vec<_> = sources
        .par_iter()
        .map(|&file| {
            let evaluations = projects.evaluate_all(file);
            let owner = projects.owner_by_longest_prefix(file).map(Utf8Path::to_owned);
            (file.clone(), evaluations, owner)
        })
        .collect();

    let mut state = IndexState::with_projects(projects);
    for (file, evaluations, owner) in classified {
        state.apply(file, evaluations, owner);
    }
    Ok(state)
}

/// Shared, thread-safe project index for one monitored root.
#[derive(Debug)]
pub struct ProjectIndex {
    state: RwLock<IndexState>,
    rules: IgnoreRules,
    stats: Arc<IndexStats>,
}

impl ProjectIndex {
    /// Creates an empty index that admits files according to `rules`.
    #[must_use]
    pub fn new(rules: IgnoreRules) -> Self {
        Self {
            state: RwLock::new(IndexState::default()),
            rules,
            stats: Arc::new(IndexStats::new()),
        }
    }

    /// The admission rules.
    #[must_use]
    pub fn rules(&self) -> &IgnoreRules {
        &self.rules
    }

    /// Activity counters.
    #[must_use]
    pub fn stats(&self) -> &Arc<IndexStats> {
        &self.stats
    }

    /// Builds a fresh state from `tree` and installs it.
    ///
    /// On error the current state is kept.
    pub fn rebuild_from(&self, tree: &dyn SourceTree) -> Result<(), IndexError> {
        let state = build_index_state(tree, &self.rules, &self.stats)?;
        info!(
            projects = state.projects.len(),
            files = state.file_count(),
            "Index rebuilt"
        );
        self.replace(state);
        self.stats.increment_full_scans();
        Ok(())
    }

    /// Atomically installs `state`, discarding the current one.
    pub fn replace(&self, state: IndexState) {
        *self.state.write() = state;
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> IndexState {
        self.state.read().clone()
    }

    /// Returns `true` if a change to `file` should reach the index.
    #[must_use]
    pub fn should_index(&self, file: &Utf8Path) -> bool {
        self.rules.accepts_source(file) && !self.state.read().projects.is_in_out_dir(file)
    }

    /// Classifies `file` against every project and records it.
    ///
    /// Re-inserting an indexed file replaces its entries. Returns the number
    /// of projects that can import it.
    pub fn classify_and_insert(&self, file: &Utf8Path) -> usize {
        let inserted = self.state.write().upsert(file);
        debug!(path = %file, projects = inserted, "Indexed file");
        inserted
    }

    /// Drops `file` from the index. Returns `false` if it was not indexed.
    pub fn remove(&self, file: &Utf8Path) -> bool {
        let removed = self.state.write().remove(file);
        if removed {
            debug!(path = %file, "Removed file");
        }
        removed
    }

    /// Drops every indexed file below `dir`.
    ///
    /// A directory that is, or contains, a project directory is left alone:
    /// project topology changed and the caller must rescan.
    pub fn remove_directory(&self, dir: &Utf8Path) -> DirectoryRemoval {
        let mut state = self.state.write();
        if state.projects.contains_project_within(dir) {
            return DirectoryRemoval::RescanRequired;
        }

        let doomed: Vec<Utf8PathBuf> = state
            .indexed
            .iter()
            .filter(|file| file.starts_with(dir))
            .cloned()
            .collect();
        for file in &doomed {
            state.remove(file);
        }
        debug!(dir = %dir, count = doomed.len(), "Removed directory");
        DirectoryRemoval::Removed(doomed.len())
    }

    /// Completion candidates for `prefix` typed in `from_file`.
    ///
    /// Returns everything in the owning project's bucket for the prefix's
    /// first character: bare modules as indexed, relative modules with a
    /// specifier computed from `from_file`. The file itself is never offered.
    /// An empty prefix or a file the index doesn't hold yields nothing.
    #[must_use]
    pub fn query(&self, from_file: &Utf8Path, prefix: &str) -> Vec<ModuleForCompletion> {
        let Some(key) = bucket_key(prefix) else {
            return Vec::new();
        };

        let state = self.state.read();
        let Some(project) = state
            .ownership
            .get(from_file)
            .and_then(|owner| state.projects.get(owner))
        else {
            return Vec::new();
        };

        let bare = project
            .bare_modules(key)
            .iter()
            .filter(|module| module.source_file_path != from_file)
            .map(tsns_core::BareModule::to_completion);
        let relative = project
            .relative_modules(key)
            .iter()
            .filter(|module| module.source_file_path != from_file)
            .map(|module| module.to_completion(from_file));
        bare.chain(relative).collect()
    }

    /// Directories of every known project.
    #[must_use]
    pub fn project_paths(&self) -> Vec<Utf8PathBuf> {
        self.state
            .read()
            .projects
            .iter()
            .map(|project| project.path().to_owned())
            .collect()
    }

    /// The deepest project containing the indexed `file`.
    #[must_use]
    pub fn owner_of(&self, file: &Utf8Path) -> Option<Utf8PathBuf> {
        self.state.read().ownership.get(file).cloned()
    }

    /// A summary of every project.
    #[must_use]
    pub fn projects(&self) -> Vec<ProjectSummary> {
        self.state
            .read()
            .projects
            .iter()
            .map(crate::project::TsProject::summary)
            .collect()
    }

    /// Total bucket entries across all projects.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.state
            .read()
            .projects
            .iter()
            .map(|project| project.bare_count() + project.relative_count())
            .sum()
    }

    /// Number of indexed source files.
    #[must_use]
    pub fn indexed_file_count(&self) -> usize {
        self.state.read().file_count()
    }

    /// How every project classifies `file`, disallowed results included.
    #[must_use]
    pub fn evaluate(&self, file: &Utf8Path) -> Vec<(Utf8PathBuf, ModuleEvaluation)> {
        self.state
            .read()
            .projects
            .iter()
            .map(|project| (project.path().to_owned(), project.evaluate(file)))
            .collect()
    }
}
