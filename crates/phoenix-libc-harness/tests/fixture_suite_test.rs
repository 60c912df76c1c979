//! Runs every checked-in fixture set through the harness runner.

use std::path::PathBuf;

use phoenix_libc_harness::run_log::{ArtifactManifest, RunLog, check_file};
use phoenix_libc_harness::{TestRunner, VerificationSummary, fixtures};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/conformance/fixtures")
}

#[test]
fn all_fixture_sets_pass() {
    let sets = fixtures::load_dir(&fixture_dir()).expect("fixtures load");
    let families: Vec<&str> = sets.iter().map(|s| s.family.as_str()).collect();
    for family in ["ctype", "locale", "stdio/printf", "stdio/scanf"] {
        assert!(families.contains(&family), "missing {family} fixtures");
    }

    let runner = TestRunner::new("fixture-suite", "C");
    let results = sets.iter().flat_map(|set| runner.run(set)).collect();
    let summary = VerificationSummary::from_results(results);
    let failures: Vec<String> = summary
        .failures()
        .map(|r| format!("{} ({}): {}", r.case_name, r.symbol, r.diff.as_deref().unwrap_or("")))
        .collect();
    assert!(failures.is_empty(), "failing cases:\n{}", failures.join("\n"));
    assert!(summary.total >= 50);
}

#[test]
fn case_names_are_unique_per_family() {
    for set in fixtures::load_dir(&fixture_dir()).expect("fixtures load") {
        let mut names: Vec<&str> = set.cases.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(names.len(), before, "duplicate case name in {}", set.family);
    }
}

#[test]
fn logged_run_produces_clean_jsonl_and_manifest() {
    let dir = std::env::temp_dir().join(format!("phoenix-harness-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let log_path = dir.join("run.log.jsonl");

    let sets = fixtures::load_dir(&fixture_dir()).unwrap();
    let mut run_log = RunLog::create(&log_path, "conformance", "itest").unwrap();
    let runner = TestRunner::new("fixture-suite", "C");
    let mut cases = 0;
    for set in &sets {
        cases += runner.run_logged(set, &mut run_log).unwrap().len();
    }
    run_log.finish().unwrap();

    let check = check_file(&log_path).unwrap();
    assert_eq!(check.records, cases);
    assert!(check.is_clean(), "{}", check.issues[0]);

    let mut manifest = ArtifactManifest::new("itest");
    let digest = manifest.record_file(&log_path, "log_jsonl").unwrap();
    assert_eq!(digest.sha256.len(), 64);
    assert!(manifest.changed().is_empty());

    std::fs::remove_dir_all(&dir).unwrap();
}
