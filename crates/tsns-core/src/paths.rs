//! Lexical path helpers and module-name derivation.
//!
//! None of these functions touch the file system. Paths are compared
//! component-wise, and import paths are always written with `/` separators.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use smallvec::SmallVec;

/// TypeScript source extensions that are indexed.
pub const TYPESCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx"];

/// File name that marks a project root.
pub const TSCONFIG_FILE_NAME: &str = "tsconfig.json";

/// Suffix of TypeScript declaration files.
const DECLARATION_SUFFIX: &str = ".d.ts";

/// Derives the namespace name for a source file.
///
/// The base name without its extension is split on `_`, `-` and `.`; empty
/// segments are dropped. The first segment is lowercased, each following
/// segment is lowercased with its first letter capitalized.
///
/// # Examples
///
/// ```
/// use tsns_core::paths::module_name;
/// use camino::Utf8Path;
///
/// assert_eq!(module_name(Utf8Path::new("/p/src/utils/string_helper.ts")), "stringHelper");
/// assert_eq!(module_name(Utf8Path::new("date-range.util.tsx")), "dateRangeUtil");
/// assert_eq!(module_name(Utf8Path::new("__init__.ts")), "init");
/// ```
#[must_use]
pub fn module_name(path: &Utf8Path) -> String {
    let stem = path.file_stem().unwrap_or_default();
    let mut name = String::with_capacity(stem.len());

    for (index, segment) in stem
        .split(['_', '-', '.'])
        .filter(|segment| !segment.is_empty())
        .enumerate()
    {
        let lower = segment.to_lowercase();
        if index == 0 {
            name.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }

    name
}

/// Returns the bucket key for a module name or query prefix: its first
/// character, lowercased.
#[must_use]
pub fn bucket_key(name: &str) -> Option<char> {
    name.chars().next().and_then(|c| c.to_lowercase().next())
}

/// Removes the extension of the last path component.
///
/// Dots in directory names and a leading dot in the file name are kept.
///
/// ```
/// use tsns_core::paths::strip_extension;
///
/// assert_eq!(strip_extension("utils/string_helper.ts"), "utils/string_helper");
/// assert_eq!(strip_extension("a.b/c"), "a.b/c");
/// assert_eq!(strip_extension(".hidden"), ".hidden");
/// ```
#[must_use]
pub fn strip_extension(path: &str) -> String {
    let name_start = path.rfind(['/', '\\']).map_or(0, |i| i + 1);
    match path[name_start..].rfind('.') {
        Some(dot) if dot > 0 => path[..name_start + dot].to_owned(),
        _ => path.to_owned(),
    }
}

/// Resolves `.` and `..` components lexically.
///
/// `..` directly under the root is dropped; leading `..` of a relative path
/// is kept. An empty result becomes `.`.
#[must_use]
pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut parts: SmallVec<[Utf8Component<'_>; 16]> = SmallVec::new();

    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => match parts.last() {
                Some(Utf8Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Utf8Component::RootDir | Utf8Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return Utf8PathBuf::from(".");
    }
    parts.iter().map(Utf8Component::as_str).collect()
}

/// Computes the path that leads from directory `from_dir` to `to`.
///
/// Both inputs are normalized first. Identical inputs give an empty path.
#[must_use]
pub fn relative_path(from_dir: &Utf8Path, to: &Utf8Path) -> Utf8PathBuf {
    let from_dir = normalize(from_dir);
    let to = normalize(to);
    let from: SmallVec<[Utf8Component<'_>; 16]> = from_dir.components().collect();
    let target: SmallVec<[Utf8Component<'_>; 16]> = to.components().collect();

    let common = from
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = Utf8PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &target[common..] {
        relative.push(component.as_str());
    }
    relative
}

/// Joins the components of `path` with `/`.
#[must_use]
pub fn to_slash(path: &Utf8Path) -> String {
    let mut out = String::with_capacity(path.as_str().len());
    for component in path.components() {
        match component {
            Utf8Component::RootDir => out.push('/'),
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(other.as_str());
            }
        }
    }
    out
}

/// Computes the import specifier that reaches `target` from `from_file`.
///
/// The path is taken relative to the directory of `from_file`, the
/// extension is stripped, and `./` is prepended unless it starts with `..`.
///
/// ```
/// use tsns_core::paths::relative_import_path;
/// use camino::Utf8Path;
///
/// let from = Utf8Path::new("/p/src/index.ts");
/// assert_eq!(relative_import_path(from, Utf8Path::new("/p/other/thing.ts")), "../other/thing");
/// assert_eq!(relative_import_path(from, Utf8Path::new("/p/src/lib/a.tsx")), "./lib/a");
/// ```
#[must_use]
pub fn relative_import_path(from_file: &Utf8Path, target: &Utf8Path) -> String {
    let from_dir = from_file.parent().unwrap_or_else(|| Utf8Path::new(""));
    let relative = to_slash(&relative_path(from_dir, target));
    let stripped = strip_extension(&relative);

    if stripped.starts_with("..") {
        stripped
    } else {
        format!("./{stripped}")
    }
}

/// Returns `true` for `.ts` and `.tsx` files.
#[must_use]
pub fn is_typescript_source(path: &Utf8Path) -> bool {
    path.extension()
        .is_some_and(|ext| TYPESCRIPT_EXTENSIONS.contains(&ext))
}

/// Returns `true` for `*.d.ts` declaration files.
#[must_use]
pub fn is_declaration_file(path: &Utf8Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.ends_with(DECLARATION_SUFFIX))
}

/// Returns `true` if the path names a `tsconfig.json`.
#[must_use]
pub fn is_tsconfig(path: &Utf8Path) -> bool {
    path.file_name() == Some(TSCONFIG_FILE_NAME)
}
