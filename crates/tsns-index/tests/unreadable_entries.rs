//! A full scan survives entries it can't read or name.

#![cfg(unix)]
#![allow(clippy::unwrap_used)]

use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;
use tsns_core::ScanConfig;
use tsns_index::{DiskTree, FileWalker, ProjectIndex, SourceTree};

fn project() -> (TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8Path::from_path(dir.path())
        .unwrap()
        .canonicalize_utf8()
        .unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("tsconfig.json"), r#"{ "compilerOptions": { "baseUrl": "src" } }"#)
        .unwrap();
    fs::write(root.join("src/alpha.ts"), "").unwrap();
    fs::write(root.join("src/beta.ts"), "").unwrap();
    (dir, root)
}

fn scan(root: &Utf8Path, follow_links: bool) -> ProjectIndex {
    let tree = DiskTree::new(&ScanConfig {
        root_path: root.to_owned(),
        follow_links,
        ..ScanConfig::default()
    })
    .unwrap();
    let index = ProjectIndex::new(tree.rules().clone());
    index.rebuild_from(&tree).unwrap();
    index
}

#[test]
fn non_utf8_name_is_skipped() {
    let (_dir, root) = project();
    let name = OsStr::from_bytes(b"notes-\xff.txt");
    fs::write(root.join("src").as_std_path().join(name), "").unwrap();

    let index = scan(&root, false);
    assert_eq!(index.indexed_file_count(), 2);
    assert_eq!(index.stats().snapshot().io_errors, 1);

    let from = root.join("src/alpha.ts");
    assert_eq!(index.query(&from, "b")[0].import_path, "beta");
}

#[test]
fn dangling_link_is_skipped_when_following_links() {
    let (_dir, root) = project();
    std::os::unix::fs::symlink(root.join("src/missing"), root.join("src/broken")).unwrap();

    let index = scan(&root, true);
    assert_eq!(index.indexed_file_count(), 2);
    assert_eq!(index.stats().snapshot().io_errors, 1);
    assert_eq!(index.project_paths(), vec![root.clone()]);
}

#[test]
fn walker_reports_skipped_entries() {
    let (_dir, root) = project();
    let name = OsStr::from_bytes(b"\xfe-widget.ts");
    fs::write(root.join("src").as_std_path().join(name), "").unwrap();

    let tree = DiskTree::new(&ScanConfig {
        root_path: root.clone(),
        ..ScanConfig::default()
    })
    .unwrap();
    let listing = tree.walk(tree.root()).unwrap();
    assert_eq!(listing.skipped, 1);
    assert_eq!(listing.sources.len(), 2);

    let direct = FileWalker::new(&root, tree.rules().clone())
        .unwrap()
        .collect()
        .unwrap();
    assert_eq!(direct, listing);
}
