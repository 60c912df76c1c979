//! Harness error type.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{path}: {source}")]
    Fixture {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("bad input for {function}: {message}")]
    BadInput { function: String, message: String },
    #[error("no fixture sets found in {0}")]
    NoFixtures(PathBuf),
}

impl HarnessError {
    pub(crate) fn bad_input(function: &str, message: impl Into<String>) -> Self {
        Self::BadInput {
            function: function.to_string(),
            message: message.into(),
        }
    }
}
