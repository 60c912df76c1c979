//! Conformance harness for phoenix-libc.
//!
//! This crate provides:
//! - Fixtures: JSON reference cases for the printf, scanf, ctype and locale
//!   families
//! - Execution: run one case against `phoenix-libc-core`
//! - Verification: compare results and summarize them
//! - Report generation: markdown + JSON conformance reports
//! - Run logs: JSONL case records and a hashed artifact manifest

#![forbid(unsafe_code)]

pub mod error;
pub mod exec;
pub mod fixtures;
pub mod report;
pub mod run_log;
pub mod runner;
pub mod verify;

pub use error::HarnessError;
pub use fixtures::{FixtureCase, FixtureSet};
pub use report::ConformanceReport;
pub use runner::TestRunner;
pub use verify::{VerificationResult, VerificationSummary};
