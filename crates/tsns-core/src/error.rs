//! Error types for the tsns-core crate.
//!
//! This module provides [`TsConfigError`] for malformed `tsconfig.json` files
//! and [`ConfigError`] for application configuration failures.

use camino::Utf8PathBuf;

/// Errors produced while turning `tsconfig.json` text into a
/// [`TsConfigData`](crate::TsConfigData).
///
/// A project whose config fails to parse is skipped during discovery; these
/// errors are logged, never surfaced to a completion caller.
///
/// # Examples
///
/// ```
/// use tsns_core::{TsConfigError, parse_tsconfig};
///
/// let err = parse_tsconfig(r#"{ "compilerOptions": { "baseUrl": 42 } }"#).unwrap_err();
/// assert!(matches!(err, TsConfigError::FieldNotString { field: "baseUrl", .. }));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum TsConfigError {
    /// The text is not valid JSON5.
    #[error("invalid JSON5: {0}")]
    Syntax(#[from] json5::Error),

    /// The document root is not an object.
    #[error("tsconfig root must be an object, found {found}")]
    RootNotObject {
        /// JSON kind that was found instead.
        found: &'static str,
    },

    /// `compilerOptions` is present but not an object.
    #[error("compilerOptions must be an object, found {found}")]
    CompilerOptionsNotObject {
        /// JSON kind that was found instead.
        found: &'static str,
    },

    /// `baseUrl`, `outDir` or `rootDir` is present but not a string.
    #[error("compilerOptions.{field} must be a string, found {found}")]
    FieldNotString {
        /// Name of the offending field.
        field: &'static str,
        /// JSON kind that was found instead.
        found: &'static str,
    },

    /// `paths` is present but not an object.
    #[error("compilerOptions.paths must be an object, found {found}")]
    PathsNotObject {
        /// JSON kind that was found instead.
        found: &'static str,
    },

    /// A `paths` entry maps to something other than an array.
    #[error("compilerOptions.paths[\"{pattern}\"] must be an array, found {found}")]
    MappingNotArray {
        /// The pattern whose value is malformed.
        pattern: String,
        /// JSON kind that was found instead.
        found: &'static str,
    },

    /// A `paths` mapping array contains a non-string element.
    #[error("compilerOptions.paths[\"{pattern}\"][{index}] must be a string, found {found}")]
    MappingEntryNotString {
        /// The pattern whose mapping list is malformed.
        pattern: String,
        /// Position of the bad element.
        index: usize,
        /// JSON kind that was found instead.
        found: &'static str,
    },
}

impl TsConfigError {
    /// Returns `true` if the text could not be parsed at all, as opposed to
    /// parsing into the wrong shape.
    #[inline]
    #[must_use]
    pub const fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax(_))
    }
}

/// Errors that can occur during configuration loading and validation.
///
/// # Examples
///
/// ```
/// use tsns_core::ConfigError;
/// use camino::Utf8PathBuf;
///
/// let error = ConfigError::MissingDirectory(Utf8PathBuf::from("/some/path"));
/// assert!(error.to_string().contains("/some/path"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The provided path is invalid or malformed.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath {
        /// The invalid path.
        path: Utf8PathBuf,
        /// Explanation of why the path is invalid.
        reason: String,
    },

    /// A required directory does not exist.
    #[error("missing required directory: {0}")]
    MissingDirectory(Utf8PathBuf),

    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// An I/O error occurred while reading configuration.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
