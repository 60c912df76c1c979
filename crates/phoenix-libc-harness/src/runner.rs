//! Test execution engine.

use std::io::Write;
use std::time::Instant;

use crate::exec::{Execution, execute_fixture_case};
use crate::fixtures::{FixtureCase, FixtureSet};
use crate::run_log::{CaseRecord, RunLog, Severity, Verdict};
use crate::verify::{VerificationResult, render_diff};

const UNSUPPORTED: &str = "unsupported:";

/// Runs fixture sets and collects verification results.
pub struct TestRunner {
    /// Name of the test campaign.
    pub campaign: String,
    /// Locale for cases that do not name one.
    pub default_locale: String,
}

impl TestRunner {
    /// Create a new test runner.
    #[must_use]
    pub fn new(campaign: impl Into<String>, default_locale: impl Into<String>) -> Self {
        Self {
            campaign: campaign.into(),
            default_locale: default_locale.into(),
        }
    }

    /// Run all fixtures in a set and return results.
    pub fn run(&self, fixture_set: &FixtureSet) -> Vec<VerificationResult> {
        fixture_set
            .cases
            .iter()
            .map(|case| self.verify_case(&fixture_set.family, case))
            .collect()
    }

    /// [`run`](Self::run), recording one log line per case.
    pub fn run_logged<W: Write>(
        &self,
        fixture_set: &FixtureSet,
        log: &mut RunLog<W>,
    ) -> std::io::Result<Vec<VerificationResult>> {
        let mut results = Vec::with_capacity(fixture_set.cases.len());
        for case in &fixture_set.cases {
            let started = Instant::now();
            let result = self.verify_case(&fixture_set.family, case);
            let verdict = if result.passed {
                Verdict::Pass
            } else if result.actual.starts_with(UNSUPPORTED) {
                Verdict::Unsupported
            } else {
                Verdict::Fail
            };
            let severity = match verdict {
                Verdict::Pass => Severity::Info,
                Verdict::Unsupported => Severity::Warn,
                Verdict::Fail => Severity::Error,
            };
            let mut record = CaseRecord::event(severity, "case_result")
                .campaign(&self.campaign)
                .case(&fixture_set.family, &case.function, self.locale_for(case))
                .verdict(verdict)
                .elapsed(started.elapsed())
                .detail(serde_json::json!({
                    "case": result.case_name,
                    "expected": result.expected,
                    "actual": result.actual,
                }));
            if case.expected_errno != 0 {
                record = record.errno(case.expected_errno);
            }
            log.record(record)?;
            results.push(result);
        }
        Ok(results)
    }

    fn locale_for<'a>(&'a self, case: &'a FixtureCase) -> &'a str {
        case.locale.as_deref().unwrap_or(&self.default_locale)
    }

    fn verify_case(&self, family: &str, case: &FixtureCase) -> VerificationResult {
        let locale = self.locale_for(case);
        let execution = execute_fixture_case(&case.function, &case.inputs, Some(locale));
        let (actual, passed, diff) = match execution {
            Ok(run) => {
                let notes = mismatches(case, &run);
                let diff = (!notes.is_empty()).then(|| notes.join("\n"));
                (run.output, diff.is_none(), diff)
            }
            Err(err) => {
                let actual = format!("{UNSUPPORTED}{err}");
                let diff = render_diff(&case.expected_output, &actual);
                (actual, false, Some(diff))
            }
        };
        VerificationResult {
            family: family.to_string(),
            symbol: case.function.clone(),
            case_name: case.name.clone(),
            spec_section: case.spec_section.clone(),
            passed,
            expected: case.expected_output.clone(),
            actual,
            diff,
        }
    }
}

fn mismatches(case: &FixtureCase, run: &Execution) -> Vec<String> {
    let mut notes = Vec::new();
    if run.output != case.expected_output {
        notes.push(render_diff(&case.expected_output, &run.output));
    }
    if let Some(want) = case.expected_return
        && run.ret != Some(want)
    {
        notes.push(format!("return: expected {want}, got {:?}", run.ret));
    }
    if run.errno != case.expected_errno {
        notes.push(format!(
            "errno: expected {}, got {}",
            case.expected_errno, run.errno
        ));
    }
    notes
}
