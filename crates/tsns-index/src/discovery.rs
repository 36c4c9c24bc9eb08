//! Project discovery from `tsconfig.json` files.

use camino::Utf8Path;
use tracing::{debug, warn};
use tsns_core::parse_tsconfig;

use crate::project::ProjectSet;
use crate::stats::IndexStats;
use crate::tree::SourceTree;

/// Reads and parses every config in `tsconfigs`, one project per directory.
///
/// A config that cannot be read or parsed is logged and skipped; the other
/// projects are unaffected.
pub fn discover_projects<P: AsRef<Utf8Path>>(
    tree: &dyn SourceTree,
    tsconfigs: &[P],
    stats: &IndexStats,
) -> ProjectSet {
    let mut projects = ProjectSet::new();

    for config_path in tsconfigs {
        let config_path = config_path.as_ref();
        let Some(project_path) = config_path.parent() else {
            continue;
        };

        let text = match tree.read_to_string(config_path) {
            Ok(text) => text,
            Err(e) => {
                stats.increment_io_errors();
                warn!(path = %config_path, error = %e, "Failed to read tsconfig, skipping project");
                continue;
            }
        };

        match parse_tsconfig(&text) {
            Ok(config) => {
                debug!(project = %project_path, "Discovered project");
                projects.insert(project_path.to_owned(), config);
            }
            Err(e) => {
                stats.increment_config_errors();
                warn!(path = %config_path, error = %e, "Failed to parse tsconfig, skipping project");
            }
        }
    }

    projects
}
