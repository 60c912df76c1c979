//! Verification results and summaries.

use serde::{Deserialize, Serialize};

/// Outcome of one fixture case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub family: String,
    pub symbol: String,
    pub case_name: String,
    pub spec_section: String,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
    /// Human-readable mismatch description (absent on pass).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

/// Aggregated counts over a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<VerificationResult>,
}

impl VerificationSummary {
    #[must_use]
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            results,
        }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &VerificationResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

/// Line-oriented expected/actual rendering.
#[must_use]
pub fn render_diff(expected: &str, actual: &str) -> String {
    let mut out = String::new();
    let expected_lines: Vec<&str> = expected.lines().collect();
    let actual_lines: Vec<&str> = actual.lines().collect();
    let rows = expected_lines.len().max(actual_lines.len()).max(1);
    for i in 0..rows {
        let e = expected_lines.get(i).copied().unwrap_or("");
        let a = actual_lines.get(i).copied().unwrap_or("");
        if e == a {
            out.push_str(&format!("  {e}\n"));
        } else {
            out.push_str(&format!("- {e:?}\n+ {a:?}\n"));
        }
    }
    out
}
