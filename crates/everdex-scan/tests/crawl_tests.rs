use std::collections::HashSet;
use std::fs;
use std::path::Path;

use everdex_catalog::Catalog;
use everdex_core::{CatalogConfig, CrawlConfig, SearchRequest, path_key};
use everdex_scan::{Crawler, IndexError, IndexEvent, start_index, start_rescan};
use tempfile::TempDir;

/// Catalog in its own directory so the crawled trees never contain it.
fn setup() -> (TempDir, Crawler) {
    let db_dir = TempDir::new().unwrap();
    let catalog = Catalog::open(CatalogConfig::new(db_dir.path().join("everdex.db"))).unwrap();
    (db_dir, Crawler::new(catalog))
}

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn catalogued(crawler: &Crawler, folder: &Path) -> HashSet<String> {
    let id = crawler
        .catalog()
        .get_or_create_folder(&path_key(folder))
        .unwrap();
    crawler.catalog().files_under_folder(id).unwrap()
}

fn key(path: &Path) -> String {
    path_key(path)
}

#[test]
fn test_index_writes_records() {
    let (_db, crawler) = setup();
    let tree = TempDir::new().unwrap();
    write(&tree.path().join("a.txt"), "hello");
    write(&tree.path().join("nested/deeper/Photo.JPG"), "jpeg");
    write(&tree.path().join(".hidden"), "dot");

    let outcome = crawler.index(tree.path(), false, None).unwrap();

    assert_eq!(outcome.indexed, 3);
    assert_eq!(outcome.removed, 0);
    assert_eq!(outcome.failed, 0);
    assert!(!outcome.folder_excluded);

    let photo = crawler
        .catalog()
        .file(&key(&tree.path().join("nested/deeper/Photo.JPG")))
        .unwrap()
        .unwrap();
    assert_eq!(photo.size, 4);
    assert_eq!(photo.file_type, ".jpg");
    assert_eq!(photo.name, "Photo.JPG");

    let hidden = crawler
        .catalog()
        .file(&key(&tree.path().join(".hidden")))
        .unwrap()
        .unwrap();
    assert_eq!(hidden.file_type, "");
}

#[test]
fn test_index_is_idempotent() {
    let (_db, crawler) = setup();
    let tree = TempDir::new().unwrap();
    write(&tree.path().join("a.txt"), "a");
    write(&tree.path().join("sub/b.txt"), "bb");

    crawler.index(tree.path(), false, None).unwrap();
    let first = catalogued(&crawler, tree.path());
    let a_before = crawler
        .catalog()
        .file(&key(&tree.path().join("a.txt")))
        .unwrap()
        .unwrap();

    crawler.index(tree.path(), false, None).unwrap();
    let second = catalogued(&crawler, tree.path());
    let a_after = crawler
        .catalog()
        .file(&key(&tree.path().join("a.txt")))
        .unwrap()
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(crawler.catalog().file_count().unwrap(), 2);
    assert_eq!(a_before.size, a_after.size);
    assert_eq!(a_before.modified, a_after.modified);
    assert!(a_after.indexed_at >= a_before.indexed_at);
}

#[test]
fn test_reconcile_removes_deleted_files() {
    let (_db, crawler) = setup();
    let tree = TempDir::new().unwrap();
    write(&tree.path().join("a.txt"), "a");
    write(&tree.path().join("b.txt"), "b");
    crawler.index(tree.path(), false, None).unwrap();

    fs::remove_file(tree.path().join("b.txt")).unwrap();
    let outcome = crawler.index(tree.path(), true, None).unwrap();

    assert_eq!(outcome.removed, 1);
    assert_eq!(outcome.indexed, 1);
    assert!(outcome.message.contains("removed 1 missing files"));
    assert_eq!(
        catalogued(&crawler, tree.path()),
        HashSet::from([key(&tree.path().join("a.txt"))])
    );
}

#[test]
fn test_without_reconcile_stale_records_persist() {
    let (_db, crawler) = setup();
    let tree = TempDir::new().unwrap();
    write(&tree.path().join("a.txt"), "a");
    write(&tree.path().join("b.txt"), "b");
    crawler.index(tree.path(), false, None).unwrap();

    fs::remove_file(tree.path().join("b.txt")).unwrap();
    let outcome = crawler.index(tree.path(), false, None).unwrap();

    assert_eq!(outcome.removed, 0);
    assert_eq!(outcome.message, format!(
        "Indexed 1 files from {}",
        tree.path().file_name().unwrap().to_string_lossy()
    ));
    assert!(catalogued(&crawler, tree.path()).contains(&key(&tree.path().join("b.txt"))));
}

#[test]
fn test_wholly_excluded_subtree_is_never_visited() {
    let (_db, crawler) = setup();
    let tree = TempDir::new().unwrap();
    let private = tree.path().join("private");
    write(&tree.path().join("keep.txt"), "k");
    write(&private.join("secret.txt"), "s");
    write(&private.join("deep/er/more.txt"), "m");

    let full = crawler.index(tree.path(), false, None).unwrap();
    assert_eq!(full.indexed, 3);
    assert_eq!(full.dirs_visited, 4);

    crawler.catalog().mark_wholly_excluded(&key(&private)).unwrap();
    let outcome = crawler.index(tree.path(), true, None).unwrap();

    assert_eq!(outcome.indexed, 1);
    assert_eq!(outcome.excluded, 1);
    assert_eq!(outcome.dirs_visited, 1);
    let results = crawler.catalog().search(&SearchRequest::new("")).unwrap();
    assert_eq!(results.len(), 1);
    assert!(results.iter().all(|row| !row.path.starts_with(&key(&private))));
}

#[test]
fn test_whole_folder_exclusion_respects_name_boundary() {
    let (_db, crawler) = setup();
    let tree = TempDir::new().unwrap();
    write(&tree.path().join("foo/a.txt"), "a");
    write(&tree.path().join("foobar/b.txt"), "b");

    crawler
        .catalog()
        .mark_wholly_excluded(&key(&tree.path().join("foo")))
        .unwrap();
    let outcome = crawler.index(tree.path(), false, None).unwrap();

    assert_eq!(outcome.indexed, 1);
    assert!(catalogued(&crawler, tree.path()).contains(&key(&tree.path().join("foobar/b.txt"))));
}

#[test]
fn test_excluded_root_is_skipped() {
    let (_db, crawler) = setup();
    let tree = TempDir::new().unwrap();
    write(&tree.path().join("a.txt"), "a");
    crawler.catalog().mark_wholly_excluded(&key(tree.path())).unwrap();

    let outcome = crawler.index(tree.path(), true, None).unwrap();

    assert!(outcome.folder_excluded);
    assert_eq!(outcome.indexed, 0);
    assert!(outcome.message.ends_with("is excluded (skipped)."));
    assert_eq!(crawler.catalog().file_count().unwrap(), 0);
}

#[test]
fn test_relative_pattern_exclusion() {
    let (_db, crawler) = setup();
    let tree = TempDir::new().unwrap();
    write(&tree.path().join("cache/x.bin"), "x");
    write(&tree.path().join("cache/inner/y.bin"), "y");
    write(&tree.path().join("cached/z.txt"), "z");
    write(&tree.path().join("tmp/logs/today.log"), "l");
    write(&tree.path().join("tmp/keep.txt"), "t");

    let root = key(tree.path());
    crawler.catalog().add_exclusion_pattern(&root, "cache").unwrap();
    crawler.catalog().add_exclusion_pattern(&root, "tmp/logs").unwrap();
    let outcome = crawler.index(tree.path(), false, None).unwrap();

    assert_eq!(outcome.excluded, 2);
    assert_eq!(
        catalogued(&crawler, tree.path()),
        HashSet::from([
            key(&tree.path().join("cached/z.txt")),
            key(&tree.path().join("tmp/keep.txt")),
        ])
    );
}

#[cfg(unix)]
#[test]
fn test_unreadable_entries_do_not_abort_crawl() {
    let (_db, crawler) = setup();
    let tree = TempDir::new().unwrap();
    write(&tree.path().join("good.txt"), "g");
    std::os::unix::fs::symlink(tree.path().join("missing"), tree.path().join("dangling")).unwrap();

    let outcome = crawler.index(tree.path(), false, None).unwrap();

    assert_eq!(outcome.indexed, 1);
    assert_eq!(outcome.failed, 1);
}

#[cfg(unix)]
#[test]
fn test_special_files_are_indexed_and_dir_links_are_not() {
    let (_db, crawler) = setup();
    let tree = TempDir::new().unwrap();
    write(&tree.path().join("sub/inner.txt"), "i");
    let socket = tree.path().join("agent.sock");
    let _listener = std::os::unix::net::UnixListener::bind(&socket).unwrap();
    std::os::unix::fs::symlink(tree.path().join("sub"), tree.path().join("sub-link")).unwrap();

    let outcome = crawler.index(tree.path(), false, None).unwrap();

    assert_eq!(outcome.indexed, 2);
    assert_eq!(outcome.failed, 0);
    assert_eq!(
        catalogued(&crawler, tree.path()),
        HashSet::from([key(&socket), key(&tree.path().join("sub/inner.txt"))])
    );
}

#[test]
fn test_progress_reports_running_total() {
    let db_dir = TempDir::new().unwrap();
    let catalog = Catalog::open(CatalogConfig::new(db_dir.path().join("everdex.db"))).unwrap();
    let config = CrawlConfig::builder()
        .progress_interval(2u64)
        .batch_size(3usize)
        .threads(1usize)
        .build()
        .unwrap();
    let crawler = Crawler::with_config(catalog, config);

    let tree = TempDir::new().unwrap();
    for i in 0..5 {
        write(&tree.path().join(format!("f{i}.txt")), "x");
    }

    let mut reports = Vec::new();
    let on_progress: &mut dyn FnMut(u64) = &mut |count| reports.push(count);
    let outcome = crawler.index(tree.path(), false, Some(on_progress)).unwrap();

    assert_eq!(outcome.indexed, 5);
    assert_eq!(reports, [2, 4]);
    assert_eq!(crawler.catalog().file_count().unwrap(), 5);
}

#[test]
fn test_index_rejects_non_directory() {
    let (_db, crawler) = setup();
    let tree = TempDir::new().unwrap();
    let file = tree.path().join("plain.txt");
    write(&file, "p");

    let err = crawler.index(&file, false, None).unwrap_err();
    assert!(matches!(err, IndexError::InvalidPath { .. }));

    let err = crawler
        .index(&tree.path().join("missing"), false, None)
        .unwrap_err();
    assert!(matches!(err, IndexError::InvalidPath { .. }));
}

#[test]
fn test_rescan_aggregates_folders() {
    let (_db, crawler) = setup();
    let drive = TempDir::new().unwrap();
    let docs = drive.path().join("docs");
    let music = drive.path().join("music");
    write(&docs.join("a.txt"), "a");
    write(&docs.join("b.txt"), "b");
    write(&music.join("song.mp3"), "s");
    crawler.index(&docs, false, None).unwrap();
    crawler.index(&music, false, None).unwrap();

    fs::remove_file(docs.join("b.txt")).unwrap();
    write(&music.join("new.mp3"), "n");
    let outcome = crawler.rescan_under_root(drive.path(), true, None).unwrap();

    assert_eq!(outcome.folders, 2);
    assert_eq!(outcome.failed, 0);
    assert_eq!(outcome.indexed, 3);
    assert_eq!(outcome.removed, 1);
    assert!(outcome.message.starts_with("Rescanned 2 folders on "));
    assert!(outcome.message.ends_with(": 3 files processed, 1 removed"));
}

#[test]
fn test_rescan_skips_excluded_and_survives_failures() {
    let (_db, crawler) = setup();
    let drive = TempDir::new().unwrap();
    let kept = drive.path().join("kept");
    let gone = drive.path().join("gone");
    let hidden = drive.path().join("hidden");
    write(&kept.join("a.txt"), "a");
    write(&gone.join("b.txt"), "b");
    write(&hidden.join("c.txt"), "c");
    for folder in [&kept, &gone, &hidden] {
        crawler.index(folder, false, None).unwrap();
    }
    crawler.catalog().mark_wholly_excluded(&key(&hidden)).unwrap();
    fs::remove_dir_all(&gone).unwrap();

    let outcome = crawler.rescan_under_root(drive.path(), false, None).unwrap();

    assert_eq!(outcome.folders, 2);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.indexed, 1);
}

#[test]
fn test_rescan_errors() {
    let (_db, crawler) = setup();
    let empty = TempDir::new().unwrap();

    let err = crawler.rescan_under_root(empty.path(), false, None).unwrap_err();
    assert!(matches!(err, IndexError::NotFound { .. }));

    let err = crawler
        .rescan_under_root(&empty.path().join("missing"), false, None)
        .unwrap_err();
    assert!(matches!(err, IndexError::InvalidPath { .. }));
}

#[tokio::test]
async fn test_background_index_reports_completion() {
    let (_db, crawler) = setup();
    let tree = TempDir::new().unwrap();
    write(&tree.path().join("a.txt"), "a");

    let mut events = start_index(crawler.clone(), tree.path().to_path_buf(), false);
    let mut finished = None;
    while let Some(event) = events.recv().await {
        if let IndexEvent::Indexed(outcome) = event {
            finished = Some(outcome);
        }
    }

    assert_eq!(finished.unwrap().indexed, 1);
}

#[tokio::test]
async fn test_background_rescan_reports_failure() {
    let (_db, crawler) = setup();
    let empty = TempDir::new().unwrap();

    let mut events = start_rescan(crawler, empty.path().to_path_buf(), false);
    let mut failure = None;
    while let Some(event) = events.recv().await {
        if let IndexEvent::Failed(err) = event {
            failure = Some(err);
        }
    }

    assert!(matches!(failure, Some(IndexError::NotFound { .. })));
}
