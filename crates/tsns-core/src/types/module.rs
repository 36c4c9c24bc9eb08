//! Indexed module entries and completion results.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::paths::relative_import_path;

/// A module importable through a fixed, path-mapped specifier.
///
/// # Examples
///
/// ```
/// use tsns_core::BareModule;
/// use camino::Utf8PathBuf;
///
/// let module = BareModule {
///     module_name: "stringHelper".to_owned(),
///     import_path: "@utils/string_helper".to_owned(),
///     source_file_path: Utf8PathBuf::from("/p/src/utils/string_helper.ts"),
/// };
/// assert_eq!(module.to_completion().import_path, "@utils/string_helper");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BareModule {
    /// Namespace name derived from the file name.
    pub module_name: String,
    /// Extension-less import specifier, ready to insert.
    pub import_path: String,
    /// The source file this entry stands for.
    pub source_file_path: Utf8PathBuf,
}

impl BareModule {
    /// The completion offered for this module.
    #[must_use]
    pub fn to_completion(&self) -> ModuleForCompletion {
        ModuleForCompletion {
            module_name: self.module_name.clone(),
            import_path: self.import_path.clone(),
        }
    }
}

/// A module importable only by a path relative to the importing file.
///
/// The specifier depends on where the import is written, so it is computed
/// per query by [`RelativeModule::to_completion`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelativeModule {
    /// Namespace name derived from the file name.
    pub module_name: String,
    /// The source file this entry stands for.
    pub source_file_path: Utf8PathBuf,
}

impl RelativeModule {
    /// The completion offered to `from_file`.
    ///
    /// ```
    /// use tsns_core::RelativeModule;
    /// use camino::{Utf8Path, Utf8PathBuf};
    ///
    /// let module = RelativeModule {
    ///     module_name: "thing".to_owned(),
    ///     source_file_path: Utf8PathBuf::from("/p/other/thing.ts"),
    /// };
    /// let completion = module.to_completion(Utf8Path::new("/p/src/index.ts"));
    /// assert_eq!(completion.import_path, "../other/thing");
    /// ```
    #[must_use]
    pub fn to_completion(&self, from_file: &Utf8Path) -> ModuleForCompletion {
        ModuleForCompletion {
            module_name: self.module_name.clone(),
            import_path: relative_import_path(from_file, &self.source_file_path),
        }
    }
}

/// One completion candidate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleForCompletion {
    /// Namespace name to bind.
    pub module_name: String,
    /// Import specifier, without quotes.
    pub import_path: String,
}
