use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use fdmerge_core::executor::FileCopier;
use fdmerge_core::report::FailureKind;
use fdmerge_core::scanner::FixedOrderSource;
use fdmerge_core::{
    DigestAlgorithm, MergeConfig, MergeEngine, ReportOptions, RunSummary, SilentReporter,
};

/// relative path → contents, for every regular file under `dir`.
fn read_tree(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn visit(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    visit(root, &path, out);
                } else if path.is_file() {
                    let rel = path.strip_prefix(root).unwrap().to_path_buf();
                    out.insert(rel, fs::read(&path).unwrap());
                }
            }
        }
    }
    let mut out = BTreeMap::new();
    visit(dir, dir, &mut out);
    out
}

fn write(root: &Path, relative: &str, content: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn show_everything() -> ReportOptions {
    ReportOptions {
        display_collisions: true,
        display_renames: true,
    }
}

/// Layout:
///   a/
///     photos/one.jpg      ("sunset")
///     photos/two.jpg      ("beach")
///     notes.txt           ("todo")
///     scratch.TMP         ("junk")
///   b/
///     photos/one.jpg      ("mountain")   ← name clash with a, different content
///     copy_of_beach.jpg   ("beach")      ← duplicate of a/photos/two.jpg
///     other/todo.txt      ("todo")       ← duplicate of a/notes.txt
///     fresh.png           ("new")
///     scratch.tmp         ("junk")
fn create_sources(root: &Path) -> (PathBuf, PathBuf) {
    let a = root.join("a");
    let b = root.join("b");
    write(&a, "photos/one.jpg", b"sunset");
    write(&a, "photos/two.jpg", b"beach");
    write(&a, "notes.txt", b"todo");
    write(&a, "scratch.TMP", b"junk");
    write(&b, "photos/one.jpg", b"mountain");
    write(&b, "copy_of_beach.jpg", b"beach");
    write(&b, "other/todo.txt", b"todo");
    write(&b, "fresh.png", b"new");
    write(&b, "scratch.tmp", b"junk");
    (a, b)
}

fn fixed_order() -> FixedOrderSource {
    FixedOrderSource::new(vec![
        vec![
            "photos/one.jpg".into(),
            "photos/two.jpg".into(),
            "notes.txt".into(),
            "scratch.TMP".into(),
        ],
        vec![
            "photos/one.jpg".into(),
            "copy_of_beach.jpg".into(),
            "other/todo.txt".into(),
            "fresh.png".into(),
            "scratch.tmp".into(),
        ],
    ])
}

#[test]
fn test_collision_keeps_first_root_copy() {
    let tmp = tempdir().unwrap();
    let a = tmp.path().join("a");
    let b = tmp.path().join("b");
    write(&a, "x.jpg", b"foo");
    write(&b, "y.jpg", b"foo");
    let target = tmp.path().join("merged");

    let mut config = MergeConfig::new(vec![a.clone(), b.clone()], &target);
    config.report = show_everything();
    let result = MergeEngine::new(config).run(&SilentReporter).unwrap();

    let tree = read_tree(&target);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.get(Path::new("x.jpg")).map(Vec::as_slice), Some(&b"foo"[..]));

    let summary = &result.summary;
    assert_eq!(summary.files_copied, 1);
    assert_eq!(summary.duplicates_skipped, 1);
    assert_eq!(summary.collisions.len(), 1);
    assert_eq!(summary.collisions[0].rejected.absolute_path, b.join("y.jpg"));
    assert_eq!(summary.collisions[0].chosen.absolute_path, a.join("x.jpg"));
    assert!(summary.is_clean());
}

#[test]
fn test_name_clash_with_different_content_is_renamed() {
    let tmp = tempdir().unwrap();
    let a = tmp.path().join("a");
    let b = tmp.path().join("b");
    write(&a, "dir/x.jpg", b"foo");
    write(&b, "dir/x.jpg", b"bar");
    let target = tmp.path().join("merged");

    let mut config = MergeConfig::new(vec![a, b.clone()], &target);
    config.report = show_everything();
    let result = MergeEngine::new(config).run(&SilentReporter).unwrap();

    let tree = read_tree(&target);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[Path::new("dir/x.jpg")], b"foo");
    assert_eq!(tree[Path::new("dir/x__COPY1.jpg")], b"bar");

    let renames = &result.summary.renames;
    assert_eq!(renames.len(), 1);
    assert_eq!(renames[0].candidate.absolute_path, b.join("dir/x.jpg"));
    assert_eq!(renames[0].original_destination, target.join("dir/x.jpg"));
    assert_eq!(renames[0].final_destination, target.join("dir/x__COPY1.jpg"));
}

#[test]
fn test_target_holds_each_distinct_digest_once() {
    let tmp = tempdir().unwrap();
    let (a, b) = create_sources(tmp.path());
    let target = tmp.path().join("merged");

    let mut config = MergeConfig::new(vec![a.clone(), b.clone()], &target);
    config.exclude_extensions = vec![".tmp".to_string()];
    let result = MergeEngine::new(config).run(&SilentReporter).unwrap();

    let algorithm = DigestAlgorithm::Sha256;
    let expected: HashSet<_> = read_tree(&a)
        .into_iter()
        .chain(read_tree(&b))
        .filter(|(rel, _)| {
            rel.extension()
                .map(|e| !e.eq_ignore_ascii_case("tmp"))
                .unwrap_or(true)
        })
        .map(|(_, data)| algorithm.digest_bytes(&data))
        .collect();

    let target_digests: Vec<_> = read_tree(&target)
        .values()
        .map(|data| algorithm.digest_bytes(data))
        .collect();
    let unique: HashSet<_> = target_digests.iter().copied().collect();

    assert_eq!(target_digests.len(), unique.len(), "a digest appears twice in the target");
    assert_eq!(unique, expected);

    let summary = &result.summary;
    assert_eq!(summary.candidates_seen, 9);
    assert_eq!(summary.extensions_excluded, 2);
    assert_eq!(summary.unique_digests, 5);
    assert_eq!(summary.files_copied, 5);
    assert_eq!(summary.duplicates_skipped, 2);
    assert_eq!(summary.rename_count(), 1);
}

#[test]
fn test_first_seen_wins_with_canned_order() {
    let tmp = tempdir().unwrap();
    let (a, b) = create_sources(tmp.path());
    let target = tmp.path().join("merged");

    let mut config = MergeConfig::new(vec![a, b], &target);
    config.report = show_everything();
    let result = MergeEngine::new(config)
        .with_source(fixed_order())
        .run(&SilentReporter)
        .unwrap();

    let tree = read_tree(&target);
    // Root a wins both duplicated contents; b's copies are absent.
    assert_eq!(tree[Path::new("photos/two.jpg")], b"beach");
    assert_eq!(tree[Path::new("notes.txt")], b"todo");
    assert!(!tree.contains_key(Path::new("copy_of_beach.jpg")));
    assert!(!tree.contains_key(Path::new("other/todo.txt")));

    let rejected: Vec<PathBuf> = result
        .summary
        .collisions
        .iter()
        .map(|c| c.rejected.relative_path.clone())
        .collect();
    assert_eq!(
        rejected,
        vec![
            PathBuf::from("copy_of_beach.jpg"),
            PathBuf::from("other/todo.txt"),
            PathBuf::from("scratch.tmp"),
        ]
    );

    for record in &result.records {
        let expected_dup = match record.chosen.relative_path.to_str().unwrap() {
            "photos/two.jpg" | "notes.txt" | "scratch.TMP" => 1,
            _ => 0,
        };
        assert_eq!(record.duplicate_count, expected_dup, "{:?}", record.chosen);
        assert_eq!(record.chosen.root_index == 0, record.chosen.absolute_path.starts_with(tmp.path().join("a")));
    }
}

#[test]
fn test_dry_run_matches_real_run() {
    let tmp = tempdir().unwrap();
    let (a, b) = create_sources(tmp.path());

    let run = |target: PathBuf, dry_run: bool| -> RunSummary {
        let mut config = MergeConfig::new(vec![a.clone(), b.clone()], target);
        config.dry_run = dry_run;
        config.exclude_extensions = vec!["TMP".to_string()];
        config.report = show_everything();
        MergeEngine::new(config)
            .with_source(fixed_order())
            .run(&SilentReporter)
            .unwrap()
            .summary
    };

    let dry_target = tmp.path().join("dry");
    let real_target = tmp.path().join("real");
    let dry = run(dry_target.clone(), true);
    let real = run(real_target.clone(), false);

    assert!(dry.dry_run);
    assert!(!real.dry_run);
    assert!(!dry_target.exists());
    assert_eq!(read_tree(&real_target).len(), real.files_copied);

    assert_eq!(dry.candidates_seen, real.candidates_seen);
    assert_eq!(dry.extensions_excluded, real.extensions_excluded);
    assert_eq!(dry.unique_digests, real.unique_digests);
    assert_eq!(dry.duplicates_skipped, real.duplicates_skipped);
    assert_eq!(dry.files_copied, real.files_copied);
    assert_eq!(dry.verification_failures, real.verification_failures);
    assert_eq!(dry.collisions, real.collisions);

    let rel = |summary: &RunSummary, root: &Path| -> Vec<(PathBuf, PathBuf)> {
        summary
            .renames
            .iter()
            .map(|r| {
                (
                    r.original_destination.strip_prefix(root).unwrap().to_path_buf(),
                    r.final_destination.strip_prefix(root).unwrap().to_path_buf(),
                )
            })
            .collect()
    };
    assert_eq!(rel(&dry, &dry_target), rel(&real, &real_target));
}

/// Flips the last byte of every copy.
struct CorruptingCopier;

impl FileCopier for CorruptingCopier {
    fn copy(&self, source: &Path, destination: &Path) -> io::Result<u64> {
        let mut data = fs::read(source)?;
        if let Some(last) = data.last_mut() {
            *last = last.wrapping_add(1);
        }
        fs::write(destination, &data)?;
        Ok(data.len() as u64)
    }
}

#[test]
fn test_corrupted_copy_is_reported_not_accepted() {
    let tmp = tempdir().unwrap();
    let a = tmp.path().join("a");
    write(&a, "doc.txt", b"important");
    let target = tmp.path().join("merged");

    let config = MergeConfig::new(vec![a], &target);
    let result = MergeEngine::new(config)
        .with_copier(CorruptingCopier)
        .run(&SilentReporter)
        .unwrap();

    let summary = &result.summary;
    assert_eq!(summary.verification_failures, 1);
    assert_eq!(summary.files_copied, 0);
    assert!(summary.has_verification_failures());
    assert_eq!(summary.failures[0].kind, FailureKind::Verify);
    assert_eq!(summary.failures[0].path, target.join("doc.txt"));
    // Left in place for inspection.
    assert_eq!(fs::read(target.join("doc.txt")).unwrap(), b"importanu");
}

#[test]
fn test_unreadable_candidate_does_not_stop_run() {
    let tmp = tempdir().unwrap();
    let a = tmp.path().join("a");
    write(&a, "present.txt", b"here");
    let target = tmp.path().join("merged");

    let source = FixedOrderSource::new(vec![vec!["vanished.txt".into(), "present.txt".into()]]);
    let config = MergeConfig::new(vec![a.clone()], &target);
    let result = MergeEngine::new(config)
        .with_source(source)
        .run(&SilentReporter)
        .unwrap();

    let summary = &result.summary;
    assert_eq!(summary.read_errors, 1);
    assert_eq!(summary.failures[0].path, a.join("vanished.txt"));
    assert_eq!(summary.files_copied, 1);
    assert!(summary.has_io_failures());
    assert!(!summary.has_verification_failures());
    assert_eq!(read_tree(&target).len(), 1);
}

#[test]
fn test_compare_only_roots_are_never_copied() {
    let tmp = tempdir().unwrap();
    let reference = tmp.path().join("archive");
    let a = tmp.path().join("a");
    write(&reference, "old/backup.jpg", b"already archived");
    write(&reference, "unrelated.bin", b"only in archive");
    write(&a, "pics/current.jpg", b"already archived");
    write(&a, "pics/brand_new.jpg", b"never seen");
    let target = tmp.path().join("merged");

    let mut config = MergeConfig::new(vec![a.clone()], &target);
    config.compare_only = vec![reference];
    config.report = show_everything();
    let result = MergeEngine::new(config).run(&SilentReporter).unwrap();

    let tree = read_tree(&target);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[Path::new("pics/brand_new.jpg")], b"never seen");

    let summary = &result.summary;
    assert_eq!(summary.compare_only_files, 2);
    assert_eq!(summary.duplicates_skipped, 1);
    assert_eq!(summary.collisions[0].rejected.absolute_path, a.join("pics/current.jpg"));
    assert_eq!(summary.unique_digests, 3);
}

#[test]
fn test_existing_target_files_are_not_overwritten() {
    let tmp = tempdir().unwrap();
    let a = tmp.path().join("a");
    write(&a, "report.pdf", b"new report");
    let target = tmp.path().join("merged");
    write(&target, "report.pdf", b"someone else's report");

    let mut config = MergeConfig::new(vec![a], &target);
    config.report = show_everything();
    let result = MergeEngine::new(config).run(&SilentReporter).unwrap();

    let tree = read_tree(&target);
    assert_eq!(tree[Path::new("report.pdf")], b"someone else's report");
    assert_eq!(tree[Path::new("report__COPY1.pdf")], b"new report");
    assert_eq!(result.summary.renames.len(), 1);
    assert!(result.summary.is_clean());
}

#[test]
fn test_blake3_run_produces_same_tree() {
    let tmp = tempdir().unwrap();
    let (a, b) = create_sources(tmp.path());

    let mut trees = Vec::new();
    for (name, algorithm) in [("sha", DigestAlgorithm::Sha256), ("blake", DigestAlgorithm::Blake3)] {
        let target = tmp.path().join(name);
        let mut config = MergeConfig::new(vec![a.clone(), b.clone()], &target);
        config.algorithm = algorithm;
        MergeEngine::new(config)
            .with_source(fixed_order())
            .run(&SilentReporter)
            .unwrap();
        trees.push(read_tree(&target));
    }

    assert_eq!(trees[0], trees[1]);
}

#[test]
fn test_file_and_directory_of_same_name_both_survive() {
    // (first root, second root): a plain file `photos` and a directory
    // `photos/`, in both delivery orders.
    let layouts: [(&str, &[u8], &str, &[u8]); 2] = [
        ("photos", b"plain file", "photos/x.jpg", b"jpeg"),
        ("photos/x.jpg", b"jpeg", "photos", b"plain file"),
    ];

    for (case, (first, first_body, second, second_body)) in layouts.iter().enumerate() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        write(&a, first, first_body);
        write(&b, second, second_body);

        let mut summaries: Vec<RunSummary> = Vec::new();
        for dry_run in [true, false] {
            let target = tmp.path().join(format!("merged_{}", dry_run));
            let mut config = MergeConfig::new(vec![a.clone(), b.clone()], &target);
            config.dry_run = dry_run;
            config.report = show_everything();
            let result = MergeEngine::new(config).run(&SilentReporter).unwrap();
            summaries.push(result.summary);

            if !dry_run {
                let tree = read_tree(&target);
                assert_eq!(tree.len(), 2, "case {}: {:?}", case, tree.keys());
                let mut bodies: Vec<&[u8]> = tree.values().map(Vec::as_slice).collect();
                bodies.sort();
                assert_eq!(bodies, vec![&b"jpeg"[..], &b"plain file"[..]]);
            }
        }

        for summary in &summaries {
            assert!(summary.is_clean(), "case {}: {:?}", case, summary.failures);
            assert_eq!(summary.unique_digests, 2);
            assert_eq!(summary.files_copied, 2);
            assert_eq!(summary.rename_count(), 1);
        }
        assert_eq!(
            summaries[0].renames[0].final_destination.file_name(),
            summaries[1].renames[0].final_destination.file_name(),
        );
    }
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_a_read_error() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = tempdir().unwrap();
    let a = tmp.path().join("a");
    write(&a, "keep.txt", b"keep");
    write(&a, "other/also.txt", b"also");
    write(&a, "locked/hidden.txt", b"hidden");
    let locked = a.join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read_dir(&locked).is_ok() {
        // permissions are not enforced for this user (e.g. root)
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let target = tmp.path().join("merged");
    let result = MergeEngine::new(MergeConfig::new(vec![a.clone()], &target)).run(&SilentReporter);
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    let summary = result.unwrap().summary;

    assert_eq!(summary.read_errors, 1);
    assert_eq!(summary.failures[0].kind, FailureKind::Read);
    assert_eq!(summary.failures[0].path, locked);
    assert_eq!(summary.files_copied, 2);

    let tree = read_tree(&target);
    assert_eq!(tree.len(), 2);
    assert!(tree.contains_key(Path::new("keep.txt")));
    assert!(tree.contains_key(Path::new("other/also.txt")));
}
