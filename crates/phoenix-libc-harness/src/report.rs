//! Conformance report generation.

use serde::{Deserialize, Serialize};

use crate::verify::VerificationSummary;

/// A conformance run, renderable as markdown or JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConformanceReport {
    pub title: String,
    pub timestamp: String,
    pub summary: VerificationSummary,
}

impl ConformanceReport {
    /// Markdown rendering: totals, then one table row per case.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));
        out.push_str(&format!("- Timestamp: {}\n", self.timestamp));
        out.push_str(&format!(
            "- Total: {} | Passed: {} | Failed: {}\n\n",
            self.summary.total, self.summary.passed, self.summary.failed
        ));
        out.push_str("| Family | Symbol | Case | Section | Result |\n");
        out.push_str("|---|---|---|---|---|\n");
        for r in &self.summary.results {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                r.family,
                r.symbol,
                r.case_name,
                r.spec_section,
                if r.passed { "PASS" } else { "FAIL" }
            ));
        }
        let mut failures = self.summary.failures().peekable();
        if failures.peek().is_some() {
            out.push_str("\n## Failures\n");
            for r in failures {
                out.push_str(&format!("\n### {}\n\n```\n", r.case_name));
                out.push_str(r.diff.as_deref().unwrap_or(""));
                out.push_str("```\n");
            }
        }
        out
    }

    /// Pretty JSON rendering.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
