//! Per-project module classification.
//!
//! [`evaluate_module_for_ts_project`] decides how one project may import one
//! source file. It is a pure function of its arguments, so the index calls it
//! from any thread and calls it again to find the bucket a file lives in.
//!
//! Rules, first match wins:
//!
//! 1. `paths` alias match, in declaration order; the first mapping of a
//!    pattern that matches is used.
//! 2. `baseUrl` match, unless the relative path collides with an alias
//!    pattern prefix.
//! 3. Relative import for anything under the project directory.
//! 4. Otherwise the project must not offer the file.

use camino::Utf8Path;
use serde::Serialize;

use crate::paths::{module_name, normalize, strip_extension, to_slash};
use crate::tsconfig::{PathMappings, TsConfigData};

/// How a project may import a source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleEvaluation {
    /// Importable through `paths` or `baseUrl` with a fixed specifier.
    BareImport {
        /// Namespace name derived from the file name.
        module_name: String,
        /// Extension-less import specifier.
        import_path: String,
    },
    /// Importable only by a path relative to the importing file.
    RelativeImport {
        /// Namespace name derived from the file name.
        module_name: String,
    },
    /// Outside the project boundary.
    ImportDisallowed,
}

impl ModuleEvaluation {
    /// The module name, unless the import is disallowed.
    #[must_use]
    pub fn module_name(&self) -> Option<&str> {
        match self {
            Self::BareImport { module_name, .. } | Self::RelativeImport { module_name } => {
                Some(module_name.as_str())
            }
            Self::ImportDisallowed => None,
        }
    }

    /// Returns `true` for [`ModuleEvaluation::ImportDisallowed`].
    #[must_use]
    pub const fn is_disallowed(&self) -> bool {
        matches!(self, Self::ImportDisallowed)
    }
}

/// Classifies `file_path` for the project rooted at `project_path`.
///
/// `project_path` is the directory holding the project's `tsconfig.json`.
/// Both paths are expected to be absolute; they are normalized lexically
/// before comparison. A file name that yields an empty module name is
/// never importable.
///
/// # Examples
///
/// ```
/// use tsns_core::{ModuleEvaluation, evaluate_module_for_ts_project, parse_tsconfig};
/// use camino::Utf8Path;
///
/// let config = parse_tsconfig(
///     r#"{ "compilerOptions": { "baseUrl": "./src", "paths": { "@utils/*": ["utils/*"] } } }"#,
/// ).unwrap();
///
/// let evaluation = evaluate_module_for_ts_project(
///     Utf8Path::new("/p"),
///     &config,
///     Utf8Path::new("/p/src/utils/string_helper.ts"),
/// );
/// assert_eq!(
///     evaluation,
///     ModuleEvaluation::BareImport {
///         module_name: "stringHelper".to_owned(),
///         import_path: "@utils/string_helper".to_owned(),
///     }
/// );
/// ```
#[must_use]
pub fn evaluate_module_for_ts_project(
    project_path: &Utf8Path,
    config: &TsConfigData,
    file_path: &Utf8Path,
) -> ModuleEvaluation {
    let module_name = module_name(file_path);
    if module_name.is_empty() {
        return ModuleEvaluation::ImportDisallowed;
    }

    let project_path = normalize(project_path);
    let file_path = normalize(file_path);

    if let Some(paths) = &config.paths {
        let mapping_root = config.mapping_root(&project_path);
        if let Some(import_path) = match_path_mappings(&mapping_root, paths, &file_path) {
            return ModuleEvaluation::BareImport {
                module_name,
                import_path,
            };
        }
    }

    if let Some(import_path) = match_base_url(&project_path, config, &file_path) {
        return ModuleEvaluation::BareImport {
            module_name,
            import_path,
        };
    }

    if file_path.starts_with(&project_path) {
        return ModuleEvaluation::RelativeImport { module_name };
    }

    ModuleEvaluation::ImportDisallowed
}

fn match_path_mappings(
    mapping_root: &Utf8Path,
    paths: &PathMappings,
    file_path: &Utf8Path,
) -> Option<String> {
    let file = to_slash(file_path);
    let extensionless = strip_extension(&file);

    paths.iter().find_map(|(pattern, templates)| {
        templates.iter().find_map(|template| {
            let resolved = to_slash(&normalize(&mapping_root.join(template)));
            match_template(pattern, &resolved, &file, &extensionless)
        })
    })
}

/// Matches one resolved template and returns the aliased specifier.
fn match_template(pattern: &str, template: &str, file: &str, extensionless: &str) -> Option<String> {
    match (pattern.split_once('*'), template.split_once('*')) {
        (Some((pattern_prefix, pattern_suffix)), Some((mapping_prefix, mapping_suffix))) => {
            let captured = extensionless
                .strip_prefix(mapping_prefix)?
                .strip_suffix(mapping_suffix)?;
            if captured.is_empty() {
                return None;
            }
            Some(format!("{pattern_prefix}{captured}{pattern_suffix}"))
        }
        (None, None) => {
            let exact = file == template || extensionless == strip_extension(template);
            exact.then(|| pattern.to_owned())
        }
        // A wildcard on only one side is rejected by tsc as well.
        _ => None,
    }
}

fn match_base_url(
    project_path: &Utf8Path,
    config: &TsConfigData,
    file_path: &Utf8Path,
) -> Option<String> {
    let base_dir = config.resolved_base_url(project_path)?;
    let relative = file_path.strip_prefix(&base_dir).ok()?;
    let import_path = strip_extension(&to_slash(relative));
    if import_path.is_empty() {
        return None;
    }

    let collides = config
        .pattern_prefixes()
        .any(|prefix| import_path.starts_with(prefix));
    if collides {
        return None;
    }

    Some(import_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_tsconfig;

    fn project_config() -> TsConfigData {
        parse_tsconfig(
            r#"{ "compilerOptions": { "baseUrl": "./src", "paths": { "@utils/*": ["utils/*"] } } }"#,
        )
        .unwrap()
    }

    fn evaluate(config: &TsConfigData, file: &str) -> ModuleEvaluation {
        evaluate_module_for_ts_project(Utf8Path::new("/p"), config, Utf8Path::new(file))
    }

    fn bare(module_name: &str, import_path: &str) -> ModuleEvaluation {
        ModuleEvaluation::BareImport {
            module_name: module_name.to_owned(),
            import_path: import_path.to_owned(),
        }
    }

    #[test]
    fn test_paths_alias_wins_over_base_url() {
        let config = project_config();
        assert_eq!(
            evaluate(&config, "/p/src/utils/string_helper.ts"),
            bare("stringHelper", "@utils/string_helper")
        );
        assert_eq!(
            evaluate(&config, "/p/src/utils/deep/nested_thing.tsx"),
            bare("nestedThing", "@utils/deep/nested_thing")
        );
    }

    #[test]
    fn test_base_url_match() {
        let config = project_config();
        assert_eq!(
            evaluate(&config, "/p/src/common/map_util.ts"),
            bare("mapUtil", "common/map_util")
        );
    }

    #[test]
    fn test_relative_fallback() {
        let config = project_config();
        assert_eq!(
            evaluate(&config, "/p/other/thing.ts"),
            ModuleEvaluation::RelativeImport {
                module_name: "thing".to_owned()
            }
        );
    }

    #[test]
    fn test_outside_project_is_disallowed() {
        let config = project_config();
        assert!(evaluate(&config, "/elsewhere/thing.ts").is_disallowed());
        // A sibling directory sharing the string prefix is still outside.
        assert!(evaluate(&config, "/p2/thing.ts").is_disallowed());
    }

    #[test]
    fn test_empty_module_name_is_disallowed() {
        let config = project_config();
        assert!(evaluate(&config, "/p/src/__.ts").is_disallowed());
    }

    #[test]
    fn test_paths_without_base_url_resolve_from_project() {
        let config = parse_tsconfig(
            r#"{ "compilerOptions": { "paths": { "~lib/*": ["./libs/*"] } } }"#,
        )
        .unwrap();
        assert_eq!(evaluate(&config, "/p/libs/http/client.ts"), bare("client", "~lib/http/client"));
        assert_eq!(
            evaluate(&config, "/p/src/app.ts"),
            ModuleEvaluation::RelativeImport {
                module_name: "app".to_owned()
            }
        );
    }

    #[test]
    fn test_mapping_outside_project_directory() {
        let config = parse_tsconfig(
            r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "@shared/*": ["../shared/*"] } } }"#,
        )
        .unwrap();
        assert_eq!(
            evaluate(&config, "/shared/format_date.ts"),
            bare("formatDate", "@shared/format_date")
        );
    }

    #[test]
    fn test_first_matching_mapping_wins() {
        let config = parse_tsconfig(
            r#"{ "compilerOptions": { "baseUrl": ".", "paths": {
                "@a/*": ["missing/*", "lib/*"],
                "@b/*": ["lib/*"]
            } } }"#,
        )
        .unwrap();
        assert_eq!(evaluate(&config, "/p/lib/x.ts"), bare("x", "@a/x"));
    }

    #[test]
    fn test_exact_pattern() {
        let config = parse_tsconfig(
            r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "app-config": ["src/config/index.ts"] } } }"#,
        )
        .unwrap();
        assert_eq!(evaluate(&config, "/p/src/config/index.ts"), bare("index", "app-config"));
        assert_eq!(evaluate(&config, "/p/src/config/other.ts"), bare("other", "src/config/other"));
    }

    #[test]
    fn test_template_with_suffix() {
        let config = parse_tsconfig(
            r#"{ "compilerOptions": { "baseUrl": ".", "paths": { "@feature/*": ["features/*/index"] } } }"#,
        )
        .unwrap();
        assert_eq!(
            evaluate(&config, "/p/features/billing/index.ts"),
            bare("index", "@feature/billing")
        );
    }

    #[test]
    fn test_base_url_collision_falls_through() {
        // `utils/...` under baseUrl collides with the `utils/` alias prefix,
        // but the alias maps elsewhere, so neither bare rule applies.
        let config = parse_tsconfig(
            r#"{ "compilerOptions": { "baseUrl": "./src", "paths": { "utils/*": ["../vendor/utils/*"] } } }"#,
        )
        .unwrap();
        assert_eq!(
            evaluate(&config, "/p/src/utils/strings.ts"),
            ModuleEvaluation::RelativeImport {
                module_name: "strings".to_owned()
            }
        );
        assert_eq!(evaluate(&config, "/p/vendor/utils/strings.ts"), bare("strings", "utils/strings"));
    }

    #[test]
    fn test_module_name_accessor() {
        assert_eq!(bare("a", "b").module_name(), Some("a"));
        assert_eq!(ModuleEvaluation::ImportDisallowed.module_name(), None);
    }
}
