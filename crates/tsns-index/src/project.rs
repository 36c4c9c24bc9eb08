//! Per-project module catalogs and the set of known projects.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use smallvec::SmallVec;
use tsns_core::paths::bucket_key;
use tsns_core::{
    BareModule, FxHashMap, ModuleEvaluation, RelativeModule, TsConfigData,
    evaluate_module_for_ts_project,
};

/// One project: its config and the modules it may import, bucketed by the
/// lowercase first character of the module name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsProject {
    path: Utf8PathBuf,
    config: Arc<TsConfigData>,
    out_dir: Option<Utf8PathBuf>,
    bare_by_first_char: FxHashMap<char, Vec<BareModule>>,
    relative_by_first_char: FxHashMap<char, Vec<RelativeModule>>,
}

impl TsProject {
    /// Creates an empty catalog for the project rooted at `path`.
    #[must_use]
    pub fn new(path: Utf8PathBuf, config: TsConfigData) -> Self {
        let out_dir = config.resolved_out_dir(&path);
        Self {
            path,
            config: Arc::new(config),
            out_dir,
            bare_by_first_char: FxHashMap::default(),
            relative_by_first_char: FxHashMap::default(),
        }
    }

    /// Directory holding the project's `tsconfig.json`.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The parsed config.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TsConfigData {
        &self.config
    }

    /// Resolved `outDir`, if any.
    #[inline]
    #[must_use]
    pub fn out_dir(&self) -> Option<&Utf8Path> {
        self.out_dir.as_deref()
    }

    /// Classifies `file` against this project.
    #[must_use]
    pub fn evaluate(&self, file: &Utf8Path) -> ModuleEvaluation {
        evaluate_module_for_ts_project(&self.path, &self.config, file)
    }

    /// Appends `file` to the bucket its evaluation selects.
    ///
    /// Returns `false` for [`ModuleEvaluation::ImportDisallowed`].
    pub fn insert(&mut self, file: &Utf8Path, evaluation: ModuleEvaluation) -> bool {
        match evaluation {
            ModuleEvaluation::BareImport {
                module_name,
                import_path,
            } => {
                let Some(key) = bucket_key(&module_name) else {
                    return false;
                };
                self.bare_by_first_char
                    .entry(key)
                    .or_default()
                    .push(BareModule {
                        module_name,
                        import_path,
                        source_file_path: file.to_owned(),
                    });
                true
            }
            ModuleEvaluation::RelativeImport { module_name } => {
                let Some(key) = bucket_key(&module_name) else {
                    return false;
                };
                self.relative_by_first_char
                    .entry(key)
                    .or_default()
                    .push(RelativeModule {
                        module_name,
                        source_file_path: file.to_owned(),
                    });
                true
            }
            ModuleEvaluation::ImportDisallowed => false,
        }
    }

    /// Removes `file` from the bucket its evaluation selects.
    ///
    /// Emptied buckets are dropped. Returns `true` if an entry was removed.
    pub fn remove(&mut self, file: &Utf8Path) -> bool {
        let evaluation = self.evaluate(file);
        let Some(key) = evaluation.module_name().and_then(bucket_key) else {
            return false;
        };

        match evaluation {
            ModuleEvaluation::BareImport { .. } => {
                remove_from_bucket(&mut self.bare_by_first_char, key, |m| {
                    m.source_file_path == file
                })
            }
            ModuleEvaluation::RelativeImport { .. } => {
                remove_from_bucket(&mut self.relative_by_first_char, key, |m| {
                    m.source_file_path == file
                })
            }
            ModuleEvaluation::ImportDisallowed => false,
        }
    }

    /// Bare modules whose name starts with `key`.
    #[must_use]
    pub fn bare_modules(&self, key: char) -> &[BareModule] {
        self.bare_by_first_char.get(&key).map_or(&[], Vec::as_slice)
    }

    /// Relative modules whose name starts with `key`.
    #[must_use]
    pub fn relative_modules(&self, key: char) -> &[RelativeModule] {
        self.relative_by_first_char
            .get(&key)
            .map_or(&[], Vec::as_slice)
    }

    /// Number of bare entries.
    #[must_use]
    pub fn bare_count(&self) -> usize {
        self.bare_by_first_char.values().map(Vec::len).sum()
    }

    /// Number of relative entries.
    #[must_use]
    pub fn relative_count(&self) -> usize {
        self.relative_by_first_char.values().map(Vec::len).sum()
    }

    /// A serializable description of this project.
    #[must_use]
    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            path: self.path.clone(),
            config: TsConfigData::clone(&self.config),
            bare_modules: self.bare_count(),
            relative_modules: self.relative_count(),
        }
    }
}

fn remove_from_bucket<T>(
    buckets: &mut FxHashMap<char, Vec<T>>,
    key: char,
    matches: impl Fn(&T) -> bool,
) -> bool {
    let Some(bucket) = buckets.get_mut(&key) else {
        return false;
    };
    let before = bucket.len();
    bucket.retain(|entry| !matches(entry));
    let removed = bucket.len() != before;
    if bucket.is_empty() {
        buckets.remove(&key);
    }
    removed
}

/// Reporting view of a [`TsProject`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    /// Project directory.
    pub path: Utf8PathBuf,
    /// Parsed config.
    pub config: TsConfigData,
    /// Number of bare entries.
    pub bare_modules: usize,
    /// Number of relative entries.
    pub relative_modules: usize,
}

/// Evaluations of one file against every project, by project position.
pub type ProjectEvaluations = SmallVec<[(usize, ModuleEvaluation); 4]>;

/// All known projects, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSet {
    projects: Vec<TsProject>,
}

impl ProjectSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a project, replacing any project with the same path.
    pub fn insert(&mut self, path: Utf8PathBuf, config: TsConfigData) {
        let project = TsProject::new(path, config);
        match self.position(project.path()) {
            Ok(index) => self.projects[index] = project,
            Err(index) => self.projects.insert(index, project),
        }
    }

    fn position(&self, path: &Utf8Path) -> Result<usize, usize> {
        self.projects
            .binary_search_by(|project| project.path().cmp(path))
    }

    /// Looks up a project by directory.
    #[must_use]
    pub fn get(&self, path: &Utf8Path) -> Option<&TsProject> {
        self.position(path).ok().map(|index| &self.projects[index])
    }

    /// Returns `true` if `path` is a known project directory.
    #[must_use]
    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.position(path).is_ok()
    }

    /// Number of projects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Returns `true` if no project is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Iterates over projects in path order.
    pub fn iter(&self) -> std::slice::Iter<'_, TsProject> {
        self.projects.iter()
    }

    /// Nearest project found by walking up from the file's directory.
    #[must_use]
    pub fn owning_project(&self, file: &Utf8Path) -> Option<&Utf8Path> {
        file.ancestors()
            .skip(1)
            .find_map(|dir| self.get(dir).map(TsProject::path))
    }

    /// The project with the longest directory that contains `file`.
    #[must_use]
    pub fn owner_by_longest_prefix(&self, file: &Utf8Path) -> Option<&Utf8Path> {
        self.projects
            .iter()
            .filter(|project| file.starts_with(project.path()) && file != project.path())
            .max_by_key(|project| project.path().components().count())
            .map(TsProject::path)
    }

    /// Returns `true` if `file` lies under any project's `outDir`.
    #[must_use]
    pub fn is_in_out_dir(&self, file: &Utf8Path) -> bool {
        self.projects
            .iter()
            .filter_map(TsProject::out_dir)
            .any(|out_dir| file.starts_with(out_dir))
    }

    /// Returns `true` if `dir` is, or contains, a project directory.
    #[must_use]
    pub fn contains_project_within(&self, dir: &Utf8Path) -> bool {
        self.projects
            .iter()
            .any(|project| project.path().starts_with(dir))
    }

    /// Classifies `file` against every project, dropping disallowed results.
    #[must_use]
    pub fn evaluate_all(&self, file: &Utf8Path) -> ProjectEvaluations {
        self.projects
            .iter()
            .enumerate()
            .map(|(index, project)| (index, project.evaluate(file)))
            .filter(|(_, evaluation)| !evaluation.is_disallowed())
            .collect()
    }

    /// Inserts precomputed evaluations. Returns how many projects took it.
    pub fn apply(&mut self, file: &Utf8Path, evaluations: ProjectEvaluations) -> usize {
        evaluations
            .into_iter()
            .filter(|(index, evaluation)| {
                self.projects
                    .get_mut(*index)
                    .is_some_and(|project| project.insert(file, evaluation.clone()))
            })
            .count()
    }

    /// Removes `file` from every project. Returns how many held it.
    pub fn remove_everywhere(&mut self, file: &Utf8Path) -> usize {
        self.projects
            .iter_mut()
            .filter_map(|project| project.remove(file).then_some(()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tsns_core::parse_tsconfig;

    fn set() -> ProjectSet {
        let mut set = ProjectSet::new();
        set.insert(
            Utf8PathBuf::from("/repo"),
            parse_tsconfig(r#"{ "compilerOptions": { "outDir": "lib" } }"#).unwrap(),
        );
        set.insert(
            Utf8PathBuf::from("/repo/packages/app"),
            parse_tsconfig(r#"{ "compilerOptions": { "baseUrl": "src" } }"#).unwrap(),
        );
        set
    }

    #[test]
    fn test_ownership_strategies_agree() {
        let set = set();
        for file in [
            "/repo/a.ts",
            "/repo/packages/b.ts",
            "/repo/packages/app/c.ts",
            "/repo/packages/app/src/deep/d.ts",
            "/repo/packages/application/e.ts",
        ] {
            let file = Utf8Path::new(file);
            assert_eq!(set.owning_project(file), set.owner_by_longest_prefix(file), "{file}");
        }
        assert_eq!(
            set.owner_by_longest_prefix(Utf8Path::new("/repo/packages/app/c.ts")),
            Some(Utf8Path::new("/repo/packages/app"))
        );
        assert_eq!(set.owning_project(Utf8Path::new("/elsewhere/x.ts")), None);
    }

    #[test]
    fn test_out_dir_and_topology_checks() {
        let set = set();
        assert!(set.is_in_out_dir(Utf8Path::new("/repo/lib/index.ts")));
        assert!(!set.is_in_out_dir(Utf8Path::new("/repo/library/index.ts")));
        assert!(set.contains_project_within(Utf8Path::new("/repo/packages")));
        assert!(set.contains_project_within(Utf8Path::new("/repo/packages/app")));
        assert!(!set.contains_project_within(Utf8Path::new("/repo/packages/app/src")));
    }

    #[test]
    fn test_insert_replaces_same_path() {
        let mut set = set();
        set.insert(Utf8PathBuf::from("/repo/packages/app"), TsConfigData::default());
        assert_eq!(set.len(), 2);
        let app = set.get(Utf8Path::new("/repo/packages/app")).unwrap();
        assert!(app.config().base_url.is_none());
    }

    #[test]
    fn test_project_insert_and_remove() {
        let mut set = set();
        let file = Utf8Path::new("/repo/packages/app/src/date_util.ts");
        let evaluations = set.evaluate_all(file);
        assert_eq!(evaluations.len(), 2);
        assert_eq!(set.apply(file, evaluations), 2);

        let app = set.get(Utf8Path::new("/repo/packages/app")).unwrap();
        assert_eq!(app.bare_modules('d')[0].import_path, "date_util");
        let root = set.get(Utf8Path::new("/repo")).unwrap();
        assert_eq!(root.relative_modules('d')[0].module_name, "dateUtil");

        assert_eq!(set.remove_everywhere(file), 2);
        assert_eq!(set.remove_everywhere(file), 0);
        let app = set.get(Utf8Path::new("/repo/packages/app")).unwrap();
        assert!(app.bare_modules('d').is_empty());
        assert_eq!(app.bare_count() + app.relative_count(), 0);
    }

    #[test]
    fn test_summary() {
        let set = set();
        let summary = set.get(Utf8Path::new("/repo")).unwrap().summary();
        assert_eq!(summary.path, "/repo");
        assert_eq!(summary.config.out_dir.as_deref(), Some("lib"));
        assert_eq!(summary.bare_modules, 0);
    }
}
