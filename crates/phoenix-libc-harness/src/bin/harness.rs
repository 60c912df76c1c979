//! CLI entrypoint for the phoenix-libc conformance harness.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use phoenix_libc_harness::run_log::{
    ArtifactManifest, CaseRecord, RunLog, Severity, Verdict, check_file, utc_now,
};
use phoenix_libc_harness::{ConformanceReport, TestRunner, VerificationSummary, fixtures};

/// Conformance tooling for phoenix-libc.
#[derive(Debug, Parser)]
#[command(name = "phoenix-libc-harness")]
#[command(about = "Conformance testing harness for phoenix-libc")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Verify the implementation against fixture files.
    Verify {
        /// Directory containing fixture JSON files.
        #[arg(long)]
        fixture: PathBuf,
        /// Output report path (markdown; JSON is written beside it).
        #[arg(long)]
        report: Option<PathBuf>,
        /// Structured JSONL log output path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Artifact manifest output path.
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Locale for cases that do not name one.
        #[arg(long, default_value = "C")]
        locale: String,
        /// Optional fixed timestamp string for deterministic report generation.
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// Check every line of a JSONL run log.
    ValidateLog {
        /// JSONL log path.
        #[arg(long)]
        log: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Verify {
            fixture,
            report,
            log,
            manifest,
            locale,
            timestamp,
        } => {
            eprintln!("Verifying against fixtures in {}", fixture.display());
            let started = Instant::now();
            let fixture_sets = fixtures::load_dir(&fixture)?;
            let runner = TestRunner::new("fixture-verify", locale);
            let run_id = format!("run-{}", std::process::id());

            let mut results = Vec::new();
            let mut run_log = match &log {
                Some(path) => Some(RunLog::create(path, "conformance", &run_id)?),
                None => None,
            };
            for set in &fixture_sets {
                match run_log.as_mut() {
                    Some(run_log) => results.extend(runner.run_logged(set, run_log)?),
                    None => results.extend(runner.run(set)),
                }
            }

            // Stabilize report ordering for reproducible output.
            results.sort_by(|a, b| {
                a.family
                    .cmp(&b.family)
                    .then_with(|| a.symbol.cmp(&b.symbol))
                    .then_with(|| a.case_name.cmp(&b.case_name))
            });

            let summary = VerificationSummary::from_results(results);
            let report_doc = ConformanceReport {
                title: String::from("phoenix-libc Conformance Report"),
                timestamp: timestamp.unwrap_or_else(utc_now),
                summary,
            };
            eprintln!(
                "Verification complete: total={}, passed={}, failed={}",
                report_doc.summary.total, report_doc.summary.passed, report_doc.summary.failed
            );

            let mut artifacts = Vec::new();
            if let Some(report_path) = &report {
                eprintln!("Writing report to {}", report_path.display());
                std::fs::write(report_path, report_doc.to_markdown())?;
                let json_path = report_path.with_extension("json");
                std::fs::write(&json_path, report_doc.to_json()?)?;
                artifacts.push((report_path.clone(), "report_markdown"));
                artifacts.push((json_path, "report_json"));
            }

            if let Some(mut run_log) = run_log {
                let (severity, verdict) = if report_doc.summary.all_passed() {
                    (Severity::Info, Verdict::Pass)
                } else {
                    (Severity::Error, Verdict::Fail)
                };
                run_log.record(
                    CaseRecord::event(severity, "run_summary")
                        .verdict(verdict)
                        .wall_clock(started.elapsed())
                        .artifacts(artifacts.iter().map(|(p, _)| p.display().to_string()))
                        .detail(serde_json::json!({
                            "total": report_doc.summary.total,
                            "passed": report_doc.summary.passed,
                            "failed": report_doc.summary.failed,
                        })),
                )?;
                run_log.finish()?;
            }
            if let Some(log_path) = &log {
                artifacts.push((log_path.clone(), "log_jsonl"));
            }

            if let Some(manifest_path) = manifest {
                let mut files = ArtifactManifest::new(&run_id);
                for (path, role) in &artifacts {
                    files.record_file(path, role)?;
                }
                std::fs::write(&manifest_path, files.to_json()?)?;
                eprintln!("Wrote artifact manifest to {}", manifest_path.display());
            }

            if !report_doc.summary.all_passed() {
                for failure in report_doc.summary.failures() {
                    eprintln!("FAIL {}: {}", failure.case_name, failure.diff.as_deref().unwrap_or(""));
                }
                return Err("Conformance verification failed".into());
            }
        }
        Command::ValidateLog { log } => {
            let check = check_file(&log)?;
            for issue in &check.issues {
                eprintln!("{issue}");
            }
            eprintln!("Checked {} records, {} issues", check.records, check.issues.len());
            if !check.is_clean() {
                return Err(format!("{} log issues", check.issues.len()).into());
            }
        }
    }

    Ok(())
}
