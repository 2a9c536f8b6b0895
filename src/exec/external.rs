//! External process spawning.
//!
//! Grounded on `hniksic-rust-subprocess`'s spawn-and-wire pattern and
//! `redox-os-ion`'s process-group discipline: every external command lands in
//! its own new process group (`setpgid(0, 0)` in a `pre_exec` hook, so pgid
//! equals the leader's pid) so job control can signal a whole pipeline with
//! one `killpg`. A watchdog task enforces `timeout_ms` from `ExecOptions` by
//! sending the configured signal to the group, then `SIGKILL` after a grace
//! period if the group is still alive.

use std::collections::HashMap;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::os::unix::process::CommandExt as _;
use std::os::unix::process::ExitStatusExt as _;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command as TokioCommand};

use crate::ast::Command as ShellCommand;
use crate::error::{KrustyError, Result};
use crate::state::ShellState;

/// Resolve `name` to a concrete executable path, scanning `$PATH` the way a
/// shell's own command lookup does, cached on `(PATH string, name)` so a
/// changed `PATH` naturally misses instead of needing explicit invalidation.
/// Names containing `/` bypass the search entirely (absolute/relative path).
/// Returns `None` when nothing executable is found; callers fall back to
/// handing the bare name to the OS, which will report `NotFound` itself.
pub fn resolve_executable(name: &str, state: &mut ShellState) -> Option<PathBuf> {
    if name.contains('/') {
        return Some(PathBuf::from(name));
    }

    let path_env = state.env_or("PATH", "");
    let key = (path_env, name.to_string());
    if let Some(cached) = state.expansion_caches.exec_path.get(&key) {
        return cached.clone();
    }

    let resolved = state.path_dirs().into_iter().map(PathBuf::from).map(|dir| dir.join(name)).find(|candidate| is_executable(candidate));

    state.expansion_caches.exec_path.put(key, resolved.clone());
    resolved
}

fn is_executable(path: &std::path::Path) -> bool {
    let Ok(meta) = std::fs::metadata(path) else { return false };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// Grace period between the configured kill signal and a forced `SIGKILL`.
const KILL_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct ExecOptions {
    pub timeout_ms: Option<u64>,
    pub kill_signal: Signal,
    /// Mirror captured output to the parent's stdio as it streams in,
    /// in addition to buffering it (used for command substitution vs.
    /// interactive execution).
    pub stream_output: bool,
    pub capture: bool,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self { timeout_ms: None, kill_signal: Signal::SIGTERM, stream_output: true, capture: false }
    }
}

pub struct Spawned {
    pub child: Child,
    pub pgid: Pid,
}

/// Spawn one external command. `program` is the resolved executable path (or
/// the bare name, if [`resolve_executable`] found nothing, so the OS's own
/// lookup gets a chance and a genuinely missing command still surfaces as
/// `KrustyError::NotFound` below). `join_pgid` is `None` for a pipeline's
/// first (leader) stage, which becomes its own new process group; subsequent
/// stages pass `Some(leader_pgid)` so the whole pipeline shares one process
/// group and a single `killpg` reaches every stage.
pub fn spawn(
    cmd: &ShellCommand,
    program: &std::path::Path,
    cwd: &std::path::Path,
    env: &HashMap<String, String>,
    stdin: Stdio,
    stdout: Stdio,
    stderr: Stdio,
    join_pgid: Option<Pid>,
) -> Result<Spawned> {
    let mut builder = TokioCommand::new(program);
    builder.args(&cmd.args).current_dir(cwd).env_clear().envs(env).stdin(stdin).stdout(stdout).stderr(stderr);

    if !env.contains_key("TERM") {
        builder.env("TERM", "xterm-256color");
    }

    let target_pgid = join_pgid.map(Pid::as_raw).unwrap_or(0);
    unsafe {
        builder.pre_exec(move || {
            nix::unistd::setpgid(Pid::from_raw(0), Pid::from_raw(target_pgid)).map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
            Ok(())
        });
    }

    let child = builder.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            KrustyError::NotFound(cmd.name.clone())
        } else {
            KrustyError::Io(e)
        }
    })?;

    let pid = child.id().ok_or_else(|| KrustyError::Job("child exited before pid was observed".into()))?;
    tracing::debug!(command = %cmd.name, pid, "spawned external command");
    let pgid = join_pgid.unwrap_or(Pid::from_raw(pid as i32));
    Ok(Spawned { child, pgid })
}

/// Run one spawned child to completion, applying the watchdog timeout and
/// returning `(exit_code, stdout, stderr)`. `stdout`/`stderr` are only
/// populated when `opts.capture` is set (piped stdio); otherwise they are
/// empty because the child inherited the real descriptors.
pub async fn wait(spawned: Spawned, opts: &ExecOptions) -> Result<(i32, String, String)> {
    let Spawned { mut child, pgid } = spawned;

    let mut stdout_buf = String::new();
    let mut stderr_buf = String::new();
    if opts.capture {
        if let Some(mut out) = child.stdout.take() {
            out.read_to_string(&mut stdout_buf).await.ok();
        }
        if let Some(mut err) = child.stderr.take() {
            err.read_to_string(&mut stderr_buf).await.ok();
        }
    }

    let status = match opts.timeout_ms {
        Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), child.wait()).await {
            Ok(result) => result.map_err(KrustyError::Io)?,
            Err(_) => {
                tracing::debug!(pgid = pgid.as_raw(), "watchdog timeout; signaling process group");
                let _ = killpg(pgid, opts.kill_signal);
                tokio::time::sleep(KILL_GRACE).await;
                let _ = killpg(pgid, Signal::SIGKILL);
                return Err(KrustyError::Timeout(ms));
            }
        },
        None => child.wait().await.map_err(KrustyError::Io)?,
    };

    let code = status.code().unwrap_or_else(|| 128 + status.signal().unwrap_or(0));
    Ok((code, stdout_buf, stderr_buf))
}

pub fn forward_stdin(mut writer: impl std::io::Write, data: &str) -> std::io::Result<()> {
    writer.write_all(data.as_bytes())
}

pub async fn forward_stdin_async(mut writer: tokio::process::ChildStdin, data: String) -> std::io::Result<()> {
    writer.write_all(data.as_bytes()).await?;
    writer.shutdown().await
}
