use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use reconcile_core::engine::Side;
use reconcile_core::hasher::Blake3Hasher;
use reconcile_core::{
    ContentHasher, DuplicatePolicy, Error, Fingerprint, HashAlgorithm, OutputLayout,
    ReconcileConfig, ReconcileReport, SilentReporter, TreeReconciler,
};

/// Relative path and bytes of every file under `dir`, sorted.
fn collect_files(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    fn visit(root: &Path, dir: &Path, out: &mut Vec<(PathBuf, Vec<u8>)>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    visit(root, &path, out);
                } else if path.is_file() {
                    let relative = path.strip_prefix(root).unwrap().to_path_buf();
                    out.push((relative, fs::read(&path).unwrap()));
                }
            }
        }
    }
    let mut out = Vec::new();
    visit(dir, dir, &mut out);
    out.sort();
    out
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

struct Fixture {
    _tmp: tempfile::TempDir,
    a: PathBuf,
    b: PathBuf,
    results: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("A");
        let b = tmp.path().join("B");
        let results = tmp.path().join("results");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        Self {
            _tmp: tmp,
            a,
            b,
            results,
        }
    }

    fn config(&self) -> ReconcileConfig {
        ReconcileConfig::new(OutputLayout::new(&self.results))
    }

    fn run_with(&self, config: ReconcileConfig, hasher: Box<dyn ContentHasher>) -> ReconcileReport {
        TreeReconciler::new(config, hasher)
            .compare(&self.a, &self.b, &SilentReporter)
            .unwrap()
    }

    fn run(&self) -> ReconcileReport {
        self.run_with(self.config(), HashAlgorithm::Blake3.hasher())
    }

    fn unique(&self, side: Side) -> PathBuf {
        OutputLayout::new(&self.results).unique_root(side)
    }

    fn duplicates(&self) -> PathBuf {
        OutputLayout::new(&self.results).duplicates_root()
    }
}

/// Fails on files with a given name, as a locked or vanished file would.
struct LockedFileHasher {
    locked_name: &'static str,
}

impl ContentHasher for LockedFileHasher {
    fn name(&self) -> &'static str {
        "locked-file"
    }

    fn fingerprint_reader(&self, reader: &mut dyn Read) -> io::Result<Fingerprint> {
        Blake3Hasher.fingerprint_reader(reader)
    }

    fn fingerprint_file(&self, path: &Path) -> Result<Fingerprint, Error> {
        if path.file_name().is_some_and(|n| n == self.locked_name) {
            return Err(Error::Fingerprint {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "file is locked"),
            });
        }
        Blake3Hasher.fingerprint_file(path)
    }
}

#[test]
fn test_identical_trees_are_all_matched() {
    let fx = Fixture::new();
    for root in [&fx.a, &fx.b] {
        write(root, "one.txt", "1");
        write(root, "nested/two.txt", "2");
        write(root, "nested/deeper/three.txt", "3");
    }

    let report = fx.run();
    assert!(report.is_identical());
    assert!(report.only_in_a.is_empty());
    assert!(report.only_in_b.is_empty());
    assert_eq!(report.matched.len(), 3);
    assert_eq!(report.directories_compared, 3);
    assert!(report.failures.is_empty());
    assert!(collect_files(&fx.unique(Side::A)).is_empty());
    assert!(collect_files(&fx.unique(Side::B)).is_empty());
}

#[test]
fn test_same_content_different_names_match() {
    let fx = Fixture::new();
    write(&fx.a, "x.txt", "hello");
    write(&fx.b, "y.txt", "hello");

    let report = fx.run();
    assert_eq!(report.matched.len(), 1);
    assert_eq!(report.matched[0].a, PathBuf::from("x.txt"));
    assert_eq!(report.matched[0].b, PathBuf::from("y.txt"));
    assert!(report.only_in_a.is_empty());
    assert!(report.only_in_b.is_empty());

    let duplicates = collect_files(&fx.duplicates());
    assert_eq!(duplicates, vec![(PathBuf::from("x.txt"), b"hello".to_vec())]);
}

#[test]
fn test_same_name_and_size_different_content_are_unique() {
    let fx = Fixture::new();
    write(&fx.a, "same.txt", "abcd");
    write(&fx.b, "same.txt", "abce");

    let report = fx.run();
    assert!(report.matched.is_empty());
    assert_eq!(report.only_in_a, paths(&["same.txt"]));
    assert_eq!(report.only_in_b, paths(&["same.txt"]));
    assert_eq!(
        fs::read_to_string(fx.unique(Side::A).join("same.txt")).unwrap(),
        "abcd"
    );
    assert_eq!(
        fs::read_to_string(fx.unique(Side::B).join("same.txt")).unwrap(),
        "abce"
    );
}

#[test]
fn test_file_in_folder_missing_on_other_side() {
    let fx = Fixture::new();
    let jpg = vec![0xFFu8, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    fs::create_dir_all(fx.a.join("a")).unwrap();
    fs::write(fx.a.join("a/1.jpg"), &jpg).unwrap();

    let report = fx.run();
    assert_eq!(report.only_in_a, paths(&["a/1.jpg"]));
    assert_eq!(report.subtrees_only_in_a, paths(&["a"]));
    assert_eq!(fs::read(fx.unique(Side::A).join("a/1.jpg")).unwrap(), jpg);
}

#[test]
fn test_subtree_only_in_a_is_copied_wholesale() {
    let fx = Fixture::new();
    write(&fx.a, "sub/1.txt", "one");
    write(&fx.a, "sub/2.txt", "two");
    write(&fx.a, "sub/inner/3.txt", "three");
    // Same content as a file in B: inside a one-sided folder it is still unique.
    write(&fx.b, "elsewhere.txt", "one");

    let report = fx.run();
    assert_eq!(report.subtrees_only_in_a, paths(&["sub"]));
    assert_eq!(
        report.only_in_a,
        paths(&["sub/1.txt", "sub/2.txt", "sub/inner/3.txt"])
    );
    assert!(report.matched.is_empty());
    assert_eq!(report.only_in_b, paths(&["elsewhere.txt"]));
    // Only the root pair was compared; nothing inside `sub` was.
    assert_eq!(report.directories_compared, 1);

    let copied = collect_files(&fx.unique(Side::A));
    assert_eq!(
        copied,
        vec![
            (PathBuf::from("sub/1.txt"), b"one".to_vec()),
            (PathBuf::from("sub/2.txt"), b"two".to_vec()),
            (PathBuf::from("sub/inner/3.txt"), b"three".to_vec()),
        ]
    );
}

#[test]
fn test_nested_subtree_only_in_b_keeps_root_relative_path() {
    let fx = Fixture::new();
    write(&fx.a, "common/shared.txt", "shared");
    write(&fx.b, "common/shared.txt", "shared");
    write(&fx.b, "common/extra/deep/f.txt", "deep");

    let report = fx.run();
    assert_eq!(report.subtrees_only_in_b, paths(&["common/extra"]));
    assert_eq!(report.only_in_b, paths(&["common/extra/deep/f.txt"]));
    assert_eq!(
        fs::read_to_string(fx.unique(Side::B).join("common/extra/deep/f.txt")).unwrap(),
        "deep"
    );
    assert_eq!(report.matched.len(), 1);
    assert_eq!(report.matched[0].a, PathBuf::from("common/shared.txt"));
}

#[test]
fn test_unique_files_in_nested_shared_folders() {
    let fx = Fixture::new();
    write(&fx.a, "2023/07/IMG_1.jpg", "img1");
    write(&fx.a, "2023/07/IMG_2.jpg", "img2");
    write(&fx.b, "2023/07/copy_of_1.jpg", "img1");
    write(&fx.b, "2023/07/IMG_3.jpg", "img3");

    let report = fx.run();
    assert_eq!(report.only_in_a, paths(&["2023/07/IMG_2.jpg"]));
    assert_eq!(report.only_in_b, paths(&["2023/07/IMG_3.jpg"]));
    assert!(fx.unique(Side::A).join("2023/07/IMG_2.jpg").is_file());
    assert!(fx.unique(Side::B).join("2023/07/IMG_3.jpg").is_file());
    assert!(fx.duplicates().join("2023/07/IMG_1.jpg").is_file());
}

#[test]
fn test_running_twice_is_idempotent() {
    let fx = Fixture::new();
    write(&fx.a, "keep.txt", "same");
    write(&fx.b, "keep-too.txt", "same");
    write(&fx.a, "only-a.txt", "a");
    write(&fx.b, "folder/only-b.txt", "b");

    let first = fx.run();
    let first_tree = collect_files(&fx.results);
    let second = fx.run();
    let second_tree = collect_files(&fx.results);

    assert_eq!(first.only_in_a, second.only_in_a);
    assert_eq!(first.only_in_b, second.only_in_b);
    assert_eq!(first.matched, second.matched);
    assert_eq!(first.subtrees_only_in_b, second.subtrees_only_in_b);
    assert_eq!(first_tree, second_tree);
}

#[test]
fn test_missing_root_fails_before_any_output() {
    let fx = Fixture::new();
    let missing = fx.b.join("does-not-exist");

    let err = TreeReconciler::new(fx.config(), HashAlgorithm::Blake3.hasher())
        .compare(&fx.a, &missing, &SilentReporter)
        .unwrap_err();
    assert!(matches!(err, Error::RootNotFound(ref p) if *p == missing));
    assert!(err.is_fatal());
    assert!(!fx.results.exists());
}

#[test]
fn test_unreadable_file_does_not_stop_the_rest() {
    let fx = Fixture::new();
    write(&fx.a, "locked.jpg", "secret");
    write(&fx.a, "ok.jpg", "ok");
    write(&fx.a, "sibling/inner.jpg", "inner");
    write(&fx.b, "ok.jpg", "ok");
    write(&fx.b, "sibling/inner.jpg", "inner");

    let report = fx.run_with(
        fx.config(),
        Box::new(LockedFileHasher {
            locked_name: "locked.jpg",
        }),
    );

    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0], Error::Fingerprint { .. }));
    assert_eq!(report.matched.len(), 2);
    assert!(report.only_in_a.is_empty());
    assert!(report.only_in_b.is_empty());
    assert_eq!(report.directories_compared, 2);
    assert!(!fx.unique(Side::A).join("locked.jpg").exists());
}

#[cfg(unix)]
#[test]
fn test_unlistable_folder_only_skips_that_branch() {
    use std::os::unix::fs::PermissionsExt;

    let fx = Fixture::new();
    write(&fx.a, "blocked/a.txt", "a");
    write(&fx.b, "blocked/b.txt", "b");
    write(&fx.a, "open/c.txt", "c");
    write(&fx.b, "open/c.txt", "c");

    let blocked = fx.a.join("blocked");
    fs::set_permissions(&blocked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&blocked).is_ok() {
        // Running with privileges that ignore permissions.
        fs::set_permissions(&blocked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let report = fx.run();
    fs::set_permissions(&blocked, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0], Error::Enumeration { .. }));
    assert_eq!(report.matched.len(), 1);
    assert_eq!(report.matched[0].a, PathBuf::from("open/c.txt"));
}

#[test]
fn test_dry_run_classifies_without_writing() {
    let fx = Fixture::new();
    write(&fx.a, "only-a.txt", "a");
    write(&fx.b, "sub/only-b.txt", "b");

    let report = fx.run_with(fx.config().dry_run(), HashAlgorithm::Blake3.hasher());
    assert_eq!(report.only_in_a, paths(&["only-a.txt"]));
    assert_eq!(report.only_in_b, paths(&["sub/only-b.txt"]));
    assert_eq!(report.files_copied, 0);
    assert!(!fx.results.exists());
}

#[test]
fn test_duplicate_policies() {
    let fx = Fixture::new();
    write(&fx.a, "from-a.txt", "dup");
    write(&fx.b, "from-b.txt", "dup");

    let report = fx.run_with(
        fx.config().with_duplicate_policy(DuplicatePolicy::None),
        HashAlgorithm::Blake3.hasher(),
    );
    assert_eq!(report.matched.len(), 1);
    assert!(collect_files(&fx.duplicates()).is_empty());

    fx.run_with(
        fx.config().with_duplicate_policy(DuplicatePolicy::Both),
        HashAlgorithm::XxHash64.hasher(),
    );
    assert_eq!(
        collect_files(&fx.duplicates()),
        vec![
            (PathBuf::from("A/from-a.txt"), b"dup".to_vec()),
            (PathBuf::from("B/from-b.txt"), b"dup".to_vec()),
        ]
    );
}

#[test]
fn test_both_sides_archived_without_collisions() {
    let fx = Fixture::new();
    write(&fx.a, "bar.txt", "X");
    write(&fx.a, "q.txt", "Y");
    write(&fx.b, "z.txt", "X");
    write(&fx.b, "bar.txt", "Y");

    let report = fx.run_with(
        fx.config().with_duplicate_policy(DuplicatePolicy::Both),
        HashAlgorithm::Blake3.hasher(),
    );
    assert_eq!(report.matched.len(), 2);
    assert!(report.failures.is_empty());
    assert_eq!(report.files_copied, 4);
    assert_eq!(
        collect_files(&fx.duplicates()),
        vec![
            (PathBuf::from("A/bar.txt"), b"X".to_vec()),
            (PathBuf::from("A/q.txt"), b"Y".to_vec()),
            (PathBuf::from("B/bar.txt"), b"Y".to_vec()),
            (PathBuf::from("B/z.txt"), b"X".to_vec()),
        ]
    );
}

#[test]
fn test_blocked_destinations_only_fail_their_own_files() {
    let fx = Fixture::new();
    write(&fx.a, "blocked.txt", "b");
    write(&fx.a, "ok.txt", "ok");
    write(&fx.a, "sub/x.txt", "x");
    write(&fx.a, "sub/y.txt", "y");
    write(&fx.b, "other.txt", "o");
    let unique_a = fx.unique(Side::A);
    fs::create_dir_all(unique_a.join("blocked.txt")).unwrap();
    fs::create_dir_all(unique_a.join("sub/x.txt")).unwrap();

    let report = fx.run();
    assert_eq!(report.failures.len(), 2);
    assert!(report
        .failures
        .iter()
        .all(|e| matches!(e, Error::Copy { .. }) && !e.is_fatal()));
    assert_eq!(
        report.only_in(Side::A),
        paths(&["blocked.txt", "ok.txt", "sub/x.txt", "sub/y.txt"]).as_slice()
    );
    assert_eq!(report.subtrees_only_in(Side::A), paths(&["sub"]).as_slice());
    assert_eq!(report.only_in(Side::B), paths(&["other.txt"]).as_slice());
    assert_eq!(fs::read_to_string(unique_a.join("ok.txt")).unwrap(), "ok");
    assert_eq!(fs::read_to_string(unique_a.join("sub/y.txt")).unwrap(), "y");
    assert!(unique_a.join("blocked.txt").is_dir());
}

#[test]
fn test_results_root_that_cannot_be_created_is_fatal() {
    let fx = Fixture::new();
    write(&fx.a, "photo.jpg", "p");
    fs::write(&fx.results, "not a folder").unwrap();

    let err = TreeReconciler::new(fx.config(), HashAlgorithm::Blake3.hasher())
        .compare(&fx.a, &fx.b, &SilentReporter)
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert!(err.is_fatal());
}

#[test]
fn test_same_side_duplicates_are_reported() {
    let fx = Fixture::new();
    write(&fx.a, "first.jpg", "twin");
    write(&fx.a, "second.jpg", "twin");
    write(&fx.b, "other.jpg", "twin");

    let report = fx.run();
    assert_eq!(report.matched.len(), 1);
    assert_eq!(report.matched[0].a, PathBuf::from("second.jpg"));
    assert_eq!(report.shadowed, vec![fx.a.join("first.jpg")]);
    assert!(report.only_in_a.is_empty());
}

#[test]
fn test_results_inside_a_tree_are_not_compared() {
    let fx = Fixture::new();
    write(&fx.a, "photo.jpg", "p");
    let config = ReconcileConfig::new(OutputLayout::new(fx.a.join("results")));

    let first = fx.run_with(config.clone(), HashAlgorithm::Blake3.hasher());
    let second = fx.run_with(config, HashAlgorithm::Blake3.hasher());

    assert_eq!(first.only_in_a, paths(&["photo.jpg"]));
    assert_eq!(second.only_in_a, paths(&["photo.jpg"]));
    assert!(second.subtrees_only_in_a.is_empty());
    assert!(fx.a.join("results/unique-to-A/photo.jpg").is_file());
}

#[test]
fn test_ignore_patterns_skip_files_and_folders() {
    let fx = Fixture::new();
    write(&fx.a, ".DS_Store", "junk");
    write(&fx.a, "Thumbs/thumb.db", "junk");
    write(&fx.a, "real.jpg", "real");

    let config = fx
        .config()
        .with_ignore_patterns(&["**/.DS_Store".to_string(), "**/Thumbs".to_string()]);
    let report = fx.run_with(config, HashAlgorithm::Blake3.hasher());

    assert_eq!(report.only_in_a, paths(&["real.jpg"]));
    assert!(report.subtrees_only_in_a.is_empty());
}
