//! Execution engine: external executor, pipeline executor, chain executor.

pub mod chain;
pub mod external;
pub mod pipeline;

/// Outcome of running one command, pipeline, or chain. Mirrors the teacher's
/// `commands::types::CommandResult` shape (stdout/stderr/exit_code) but adds
/// nothing command-specific — krusty's real children write directly to the
/// inherited or piped file descriptors, so `stdout`/`stderr` here are only
/// populated when output capture was requested (command substitution,
/// captured builtins).
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecResult {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self { stdout: stdout.into(), stderr: String::new(), exit_code: 0 }
    }

    pub fn failure(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self { stdout: String::new(), stderr: stderr.into(), exit_code }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}
