//! The `compilerOptions` subset that drives import classification.
//!
//! `tsconfig.json` is JSON5 in practice (comments, trailing commas), so the
//! text goes through `json5` into a [`serde_json::Value`] and is then checked
//! field by field. Checking by hand instead of deriving `Deserialize` keeps a
//! precise [`TsConfigError`] for every shape problem.
//!
//! # Examples
//!
//! ```
//! use tsns_core::parse_tsconfig;
//!
//! let config = parse_tsconfig(r#"{
//!     // comments are fine
//!     "compilerOptions": {
//!         "baseUrl": "./src",
//!         "paths": { "@utils/*": ["utils/*"] },
//!     },
//! }"#).unwrap();
//!
//! assert_eq!(config.base_url.as_deref(), Some("./src"));
//! assert_eq!(config.pattern_prefixes().collect::<Vec<_>>(), vec!["@utils/"]);
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TsConfigError;
use crate::paths::normalize;

/// Alias patterns mapped to directory templates, in declaration order.
pub type PathMappings = IndexMap<String, Vec<String>>;

/// Parsed `compilerOptions` of one project.
///
/// Every field is optional; an absent field is `None`, never an error.
/// Values are kept exactly as written and resolved against the project
/// directory on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TsConfigData {
    /// Base directory for non-relative imports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Alias patterns (`@utils/*`) and their directory templates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<PathMappings>,

    /// Compiler output directory; never indexed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,

    /// Source root directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,
}

impl TsConfigData {
    /// Builds a config from an already parsed JSON document.
    pub fn from_value(root: &Value) -> Result<Self, TsConfigError> {
        let Value::Object(root) = root else {
            return Err(TsConfigError::RootNotObject {
                found: value_kind(root),
            });
        };

        let options = match root.get("compilerOptions") {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Object(options)) => options,
            Some(other) => {
                return Err(TsConfigError::CompilerOptionsNotObject {
                    found: value_kind(other),
                });
            }
        };

        Ok(Self {
            base_url: optional_string(options, "baseUrl")?,
            paths: optional_paths(options)?,
            out_dir: optional_string(options, "outDir")?,
            root_dir: optional_string(options, "rootDir")?,
        })
    }

    /// Directory that `paths` templates are resolved against:
    /// `project/baseUrl`, or the project directory when `baseUrl` is unset.
    #[must_use]
    pub fn mapping_root(&self, project_path: &Utf8Path) -> Utf8PathBuf {
        normalize(&project_path.join(self.base_url.as_deref().unwrap_or(".")))
    }

    /// Resolved `baseUrl`, if set.
    #[must_use]
    pub fn resolved_base_url(&self, project_path: &Utf8Path) -> Option<Utf8PathBuf> {
        self.base_url
            .as_deref()
            .map(|base| normalize(&project_path.join(base)))
    }

    /// Resolved `outDir`, if set.
    #[must_use]
    pub fn resolved_out_dir(&self, project_path: &Utf8Path) -> Option<Utf8PathBuf> {
        self.out_dir
            .as_deref()
            .map(|out| normalize(&project_path.join(out)))
    }

    /// Resolved `rootDir`, if set.
    #[must_use]
    pub fn resolved_root_dir(&self, project_path: &Utf8Path) -> Option<Utf8PathBuf> {
        self.root_dir
            .as_deref()
            .map(|root| normalize(&project_path.join(root)))
    }

    /// The non-wildcard prefix of every `paths` pattern.
    pub fn pattern_prefixes(&self) -> impl Iterator<Item = &str> {
        self.paths
            .iter()
            .flat_map(IndexMap::keys)
            .map(|pattern| pattern.split('*').next().unwrap_or_default())
    }
}

/// Parses `tsconfig.json` text.
///
/// Only `compilerOptions.baseUrl`, `paths`, `outDir` and `rootDir` are read;
/// everything else in the file is ignored.
pub fn parse_tsconfig(text: &str) -> Result<TsConfigData, TsConfigError> {
    let root: Value = json5::from_str(text)?;
    TsConfigData::from_value(&root)
}

fn optional_string(
    options: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, TsConfigError> {
    match options.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(TsConfigError::FieldNotString {
            field,
            found: value_kind(other),
        }),
    }
}

fn optional_paths(options: &Map<String, Value>) -> Result<Option<PathMappings>, TsConfigError> {
    let paths = match options.get("paths") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(paths)) => paths,
        Some(other) => {
            return Err(TsConfigError::PathsNotObject {
                found: value_kind(other),
            });
        }
    };

    let mut mappings = PathMappings::with_capacity(paths.len());
    for (pattern, value) in paths {
        let Value::Array(entries) = value else {
            return Err(TsConfigError::MappingNotArray {
                pattern: pattern.clone(),
                found: value_kind(value),
            });
        };

        let mut templates = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let Value::String(template) = entry else {
                return Err(TsConfigError::MappingEntryNotString {
                    pattern: pattern.clone(),
                    index,
                    found: value_kind(entry),
                });
            };
            templates.push(template.clone());
        }
        mappings.insert(pattern.clone(), templates);
    }

    Ok(Some(mappings))
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
