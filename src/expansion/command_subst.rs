//! Command substitution `$(...)` / `` `...` ``.
//!
//! Runs the nested script in-process through [`crate::exec::chain::run_chain`]
//! rather than spawning a subshell, the same way the expansion module's other
//! self-recursive forms (nested parameter expansion, arithmetic) stay within
//! the current interpreter. `capture_output` is forced on for the duration of
//! the nested run so its stdout is captured even when the outer command would
//! otherwise stream straight through, and `errexit` is suspended so a failing
//! command inside `$(...)` doesn't abort the surrounding line — matching a
//! subshell's usual isolation from the parent's `set -e`. Trailing newlines
//! are stripped, matching POSIX command substitution semantics.

use crate::builtins::BuiltinRegistry;
use crate::expansion::ExpansionError;
use crate::state::ShellState;

pub async fn run(script: &str, state: &mut ShellState) -> Result<String, ExpansionError> {
    if !state.substitution_mode.is_allowed(first_word(script), script) {
        return Err(ExpansionError::SandboxDenied(script.to_string()));
    }

    let prev_capture = state.capture_output;
    let prev_errexit = state.options.errexit;
    state.capture_output = true;
    state.options.errexit = false;

    let registry = BuiltinRegistry::new();
    let outcome = crate::exec::chain::run_chain(script, &registry, state).await;

    state.capture_output = prev_capture;
    state.options.errexit = prev_errexit;

    let result = outcome.map_err(|e| ExpansionError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
    Ok(result.stdout.trim_end_matches('\n').to_string())
}

fn first_word(script: &str) -> &str {
    script.split_whitespace().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn sandbox_mode_rejects_disallowed_command() {
        let mut state = ShellState::new(std::env::temp_dir(), HashMap::new());
        state.substitution_mode = crate::state::SubstitutionMode::default_sandbox();
        let err = run("rm -rf /", &mut state).await.unwrap_err();
        assert!(matches!(err, ExpansionError::SandboxDenied(_)));
    }

    #[tokio::test]
    async fn captures_nested_command_output() {
        let mut state = ShellState::new(std::env::temp_dir(), HashMap::new());
        let out = run("echo hi", &mut state).await.unwrap();
        assert_eq!(out, "hi");
    }

    #[tokio::test]
    async fn restores_capture_and_errexit_after_running() {
        let mut state = ShellState::new(std::env::temp_dir(), HashMap::new());
        state.capture_output = false;
        state.options.errexit = true;
        let _ = run("echo hi", &mut state).await.unwrap();
        assert!(!state.capture_output);
        assert!(state.options.errexit);
    }
}
