//! JSON fixture sets: reference cases for one function family per file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::HarnessError;

/// One call and the result it must produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureCase {
    /// Unique within its set.
    pub name: String,
    /// C function name, e.g. `snprintf` or `isalpha`.
    pub function: String,
    /// Standard clause the case exercises, e.g. `C11 7.21.6.1`.
    pub spec_section: String,
    /// Locale the case runs under (thread-local); "C" when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Input parameters, shaped per function.
    pub inputs: serde_json::Value,
    /// Expected rendered output.
    pub expected_output: String,
    /// Expected integer return, when the case checks it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_return: Option<i64>,
    /// errno after the call; errno is cleared first, so 0 means untouched.
    #[serde(default)]
    pub expected_errno: i32,
}

/// The cases of one fixture file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSet {
    pub version: String,
    /// Function family name (e.g. `stdio/printf`).
    pub family: String,
    /// When the expected values were captured from the reference libc.
    pub captured_at: String,
    pub cases: Vec<FixtureCase>,
}

impl FixtureSet {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse the file at `path`, naming it in any parse error.
    pub fn from_file(path: &Path) -> Result<Self, HarnessError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|source| HarnessError::Fixture {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Every `*.json` file directly under `dir`, sorted by path.
pub fn fixture_paths(dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Loads every fixture set under `dir`. Fails on the first unreadable file.
pub fn load_dir(dir: &Path) -> Result<Vec<FixtureSet>, HarnessError> {
    let sets = fixture_paths(dir)?
        .iter()
        .map(|path| FixtureSet::from_file(path))
        .collect::<Result<Vec<_>, _>>()?;
    if sets.is_empty() {
        return Err(HarnessError::NoFixtures(dir.to_path_buf()));
    }
    Ok(sets)
}
