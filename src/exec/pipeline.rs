//! Pipeline executor.
//!
//! For `N=1` this delegates straight to `run_stage`. For `N>1`, krusty does
//! not shell out to `/bin/sh -c` (the teacher's sandboxed model did, because
//! it had no real process primitives) — stages are run directly, left to
//! right. Each stage's stdout is captured and relayed into the next stage's
//! stdin as a buffer rather than wiring the stages together with live OS
//! pipes; this keeps a builtin (e.g. `grep | while read; do …; done`) able to
//! sit anywhere in the pipeline without a separate code path, at the cost of
//! true concurrent streaming between stages. `pipefail` tracks the first
//! non-zero stage regardless of which stage is last.
//!
//! Every external stage joins one shared process group, led by the first
//! external stage spawned (`redox-os-ion::shell::job`), so a single `killpg`
//! from the job manager reaches the whole pipeline.

use std::process::Stdio;

use nix::unistd::Pid;

use crate::ast::Command as ShellCommand;
use crate::builtins::{BuiltinContext, BuiltinRegistry};
use crate::error::Result;
use crate::exec::external::{self, ExecOptions};
use crate::exec::ExecResult;
use crate::state::ShellState;

/// Result of running a pipeline: its final `ExecResult` and the process
/// group id of its leader stage, if any external process ran (used by the
/// chain executor to register a background job).
pub struct PipelineOutcome {
    pub result: ExecResult,
    pub pgid: Option<Pid>,
}

pub async fn run_pipeline(commands: &[ShellCommand], background: bool, registry: &BuiltinRegistry, state: &mut ShellState) -> Result<PipelineOutcome> {
    if commands.is_empty() {
        return Ok(PipelineOutcome { result: ExecResult::success(""), pgid: None });
    }

    let mut stdin: Option<String> = None;
    let mut first_failure: Option<i32> = None;
    let mut last = ExecResult::success("");
    let mut leader_pgid: Option<Pid> = None;
    let stage_count = commands.len();

    for (idx, cmd) in commands.iter().enumerate() {
        let is_last = idx + 1 == stage_count;
        let capture = !is_last || background || state.capture_output;
        let result = run_stage(cmd, registry, state, stdin.take(), capture, &mut leader_pgid).await?;

        if result.exit_code != 0 && first_failure.is_none() {
            first_failure = Some(result.exit_code);
        }
        if !is_last {
            stdin = Some(result.stdout.clone());
        }
        last = result;
    }

    if state.options.pipefail {
        if let Some(code) = first_failure {
            last.exit_code = code;
        }
    }
    Ok(PipelineOutcome { result: last, pgid: leader_pgid })
}

/// Run one pipeline stage: a shell function, a builtin, or an external
/// command, in that resolution order.
async fn run_stage(
    cmd: &ShellCommand,
    registry: &BuiltinRegistry,
    state: &mut ShellState,
    stdin: Option<String>,
    capture: bool,
    leader_pgid: &mut Option<Pid>,
) -> Result<ExecResult> {
    if !cmd.is_valid() {
        return Ok(ExecResult::success(""));
    }

    if let Some(function) = state.functions.get(&cmd.name).cloned() {
        return crate::script::functions::call(&function, &cmd.args, state).await;
    }

    if let Some(builtin) = registry.get(&cmd.name) {
        let mut ctx = BuiltinContext { args: &cmd.args, state, stdin };
        return Ok(builtin.execute(&mut ctx).await);
    }

    run_external(cmd, state, stdin, capture, leader_pgid).await
}

async fn run_external(cmd: &ShellCommand, state: &mut ShellState, stdin: Option<String>, capture: bool, leader_pgid: &mut Option<Pid>) -> Result<ExecResult> {
    let stdin_stdio = if stdin.is_some() { Stdio::piped() } else { Stdio::inherit() };
    let stdout_stdio = if capture { Stdio::piped() } else { Stdio::inherit() };
    let stderr_stdio = Stdio::inherit();

    let program = external::resolve_executable(&cmd.name, state).unwrap_or_else(|| std::path::PathBuf::from(&cmd.name));
    let mut spawned = external::spawn(cmd, &program, &state.cwd, &state.environment, stdin_stdio, stdout_stdio, stderr_stdio, *leader_pgid)?;
    if leader_pgid.is_none() {
        *leader_pgid = Some(spawned.pgid);
    }
    if let (Some(data), Some(writer)) = (stdin, spawned.child.stdin.take()) {
        external::forward_stdin_async(writer, data).await.ok();
    }

    let opts = ExecOptions { capture, ..ExecOptions::default() };
    let (code, stdout, stderr) = external::wait(spawned, &opts).await?;
    Ok(ExecResult { stdout, stderr, exit_code: code })
}
