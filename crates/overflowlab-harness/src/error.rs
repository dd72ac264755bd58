use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("log write failed: {0}")]
    Log(#[from] std::io::Error),
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no testcases found in {0}")]
    EmptyCorpus(PathBuf),
    #[error("{errors} invalid line(s) in {path}")]
    InvalidLog { path: PathBuf, errors: usize },
}
