use connectors::error::{ConnectorError, DbError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CopyError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConnectorError),

    #[error("planning failed: {0}")]
    Planning(String),

    /// A transaction-control statement failed on one branch. `op` names the
    /// phase (begin, end, prepare, commit, rollback).
    #[error("branch {branch} failed during {op}: {source}")]
    Branch {
        branch: usize,
        op: &'static str,
        source: DbError,
    },
}
