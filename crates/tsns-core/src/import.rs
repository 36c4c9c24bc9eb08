//! Namespace import statements.
//!
//! Rendering the text a completion inserts, and recognising statements that
//! are already present in a document so they are not offered twice.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Quote character used around the import specifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum QuoteStyle {
    /// `'path'`
    #[default]
    Single,
    /// `"path"`
    Double,
}

impl QuoteStyle {
    /// The quote character.
    #[inline]
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Single => '\'',
            Self::Double => '"',
        }
    }
}

/// Renders `import * as {module_name} from '{import_path}';` plus a newline.
///
/// # Examples
///
/// ```
/// use tsns_core::import::render_import_statement;
/// use tsns_core::QuoteStyle;
///
/// assert_eq!(
///     render_import_statement("mapUtil", "common/map_util", QuoteStyle::Double),
///     "import * as mapUtil from \"common/map_util\";\n",
/// );
/// ```
#[must_use]
pub fn render_import_statement(module_name: &str, import_path: &str, quote: QuoteStyle) -> String {
    let q = quote.as_char();
    format!("import * as {module_name} from {q}{import_path}{q};\n")
}

/// Returns `true` if `document` already imports `import_path` as
/// `module_name`, with either quote style and any spacing.
#[must_use]
pub fn has_existing_import(document: &str, module_name: &str, import_path: &str) -> bool {
    let pattern = format!(
        r#"import\s*\*\s*as\s+{}\s+from\s*['"]{}['"]"#,
        regex::escape(module_name),
        regex::escape(import_path),
    );
    Regex::new(&pattern).is_ok_and(|re| re.is_match(document))
}
