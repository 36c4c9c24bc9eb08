//! End-to-end scenarios against a real directory tree.

#![allow(clippy::unwrap_used)]

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;
use tsns_core::{FileEvent, ModuleForCompletion, ScanConfig};
use tsns_index::{DiskTree, EngineConfig, IndexEngine, ProjectIndex, SourceTree};

const SETTLE: Duration = Duration::from_millis(250);

struct Fixture {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path())
            .unwrap()
            .canonicalize_utf8()
            .unwrap();
        let fixture = Self { _dir: dir, root };

        fixture.write(
            "tsconfig.json",
            r#"{
                // comments and trailing commas are allowed
                "compilerOptions": {
                    "baseUrl": "./src",
                    "paths": { "@utils/*": ["utils/*"], },
                },
            }"#,
        );
        fixture.write("src/index.ts", "");
        fixture.write("src/utils/string_helper.ts", "");
        fixture.write("src/common/map_util.ts", "");
        fixture.write("src/legacy/old_api.ts", "");
        fixture.write("src/legacy/deep/old_model.ts", "");
        fixture.write("other/thing.ts", "");
        fixture.write("node_modules/pkg/index.ts", "");
        fixture
    }

    fn path(&self, relative: &str) -> Utf8PathBuf {
        self.root.join(relative)
    }

    fn write(&self, relative: &str, contents: &str) {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn tree(&self) -> DiskTree {
        let config = ScanConfig {
            root_path: self.root.clone(),
            ..ScanConfig::default()
        };
        DiskTree::new(&config).unwrap()
    }

    async fn engine(&self) -> IndexEngine {
        let tree = self.tree();
        let index = Arc::new(ProjectIndex::new(tree.rules().clone()));
        let engine = IndexEngine::spawn(
            Arc::new(tree),
            index,
            EngineConfig {
                rescan_debounce: Duration::from_millis(50),
            },
        );
        engine.initialize().unwrap();
        engine.flush().await.unwrap();
        engine
    }
}

fn find<'a>(results: &'a [ModuleForCompletion], name: &str) -> Option<&'a ModuleForCompletion> {
    results.iter().find(|m| m.module_name == name)
}

#[test]
fn full_scan_classifies_every_kind() {
    let fixture = Fixture::new();
    let tree = fixture.tree();
    let index = ProjectIndex::new(tree.rules().clone());
    index.rebuild_from(&tree).unwrap();

    assert_eq!(index.project_paths(), vec![tree.root().to_owned()]);
    assert_eq!(index.indexed_file_count(), 6);

    let from = fixture.path("src/index.ts");
    let s = index.query(&from, "s");
    assert_eq!(
        find(&s, "stringHelper").unwrap().import_path,
        "@utils/string_helper"
    );

    let m = index.query(&from, "m");
    assert_eq!(find(&m, "mapUtil").unwrap().import_path, "common/map_util");

    let t = index.query(&from, "t");
    assert_eq!(find(&t, "thing").unwrap().import_path, "../other/thing");

    let i = index.query(&from, "i");
    assert!(find(&i, "index").is_none(), "a file is never offered to itself");
}

#[tokio::test]
async fn deleting_a_directory_drops_its_modules() {
    let fixture = Fixture::new();
    let engine = fixture.engine().await;
    let from = fixture.path("src/index.ts");
    assert!(find(&engine.query(&from, "o"), "oldApi").is_some());

    fs::remove_dir_all(fixture.path("src/legacy")).unwrap();
    engine
        .on_file_event(FileEvent::DirectoryDeleted(fixture.path("src/legacy")))
        .unwrap();
    engine.flush().await.unwrap();

    let o = engine.query(&from, "o");
    assert!(find(&o, "oldApi").is_none());
    assert!(find(&o, "oldModel").is_none());
    assert_eq!(engine.index().indexed_file_count(), 4);
    assert!(engine.index().owner_of(&fixture.path("src/legacy/old_api.ts")).is_none());
    engine.shutdown().await;
}

#[tokio::test]
async fn editing_paths_reclassifies_after_debounce() {
    let fixture = Fixture::new();
    let engine = fixture.engine().await;
    let from = fixture.path("src/index.ts");

    fixture.write("tsconfig.json", r#"{ "compilerOptions": { "baseUrl": "./src" } }"#);
    engine
        .on_file_event(FileEvent::ContentChanged(fixture.path("tsconfig.json")))
        .unwrap();
    engine.flush().await.unwrap();
    assert_eq!(
        find(&engine.query(&from, "s"), "stringHelper").unwrap().import_path,
        "@utils/string_helper"
    );

    tokio::time::sleep(SETTLE).await;
    engine.flush().await.unwrap();

    assert_eq!(
        find(&engine.query(&from, "s"), "stringHelper").unwrap().import_path,
        "utils/string_helper"
    );
    assert_eq!(engine.index().stats().snapshot().full_scans, 2);
    engine.shutdown().await;
}

#[tokio::test]
async fn invalid_config_leaves_project_out() {
    let fixture = Fixture::new();
    fixture.write("packages/broken/tsconfig.json", r#"{ "compilerOptions": [] }"#);
    fixture.write("packages/broken/src/widget.ts", "");

    let engine = fixture.engine().await;
    let snapshot = engine.index().stats().snapshot();
    assert_eq!(snapshot.config_errors, 1);
    assert_eq!(engine.index().project_paths().len(), 1);

    // The broken project's files fall back to the root project.
    let widget = fixture.path("packages/broken/src/widget.ts");
    assert_eq!(engine.index().owner_of(&widget), Some(fixture.root.clone()));
    engine.shutdown().await;
}
