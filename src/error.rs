//! Top-level error types.
//!
//! `KrustyError` unifies the ambient engineering failures (I/O, job-control
//! syscalls, history persistence) that want `?`-propagation. Command-level
//! failures are reported through `ExecResult`/exit codes per the builtin
//! contract, not through this enum.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KrustyError {
    #[error("krusty: syntax error: {message}")]
    Parse { message: String, index: usize },

    #[error("krusty: {0}")]
    Expansion(#[from] crate::expansion::ExpansionError),

    #[error("krusty: {0}: command not found")]
    NotFound(String),

    #[error("krusty: process timed out after {0}ms")]
    Timeout(u64),

    #[error("krusty: job error: {0}")]
    Job(String),

    #[error("krusty: exiting due to errexit (status {0})")]
    Errexit(i32),

    #[error("krusty: history error: {0}")]
    History(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Nix(#[from] nix::Error),
}

pub type Result<T> = std::result::Result<T, KrustyError>;
