//! Job-control builtins — `jobs`, `fg`, `bg`, `disown`, `wait`, `kill`.

use async_trait::async_trait;
use nix::sys::signal::Signal;

use crate::builtins::{Builtin, BuiltinContext};
use crate::exec::ExecResult;

pub struct Jobs;
#[async_trait]
impl Builtin for Jobs {
    fn name(&self) -> &'static str {
        "jobs"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        ctx.state.jobs.poll_all();
        let mut lines: Vec<String> =
            ctx.state.jobs.iter().map(|j| format!("[{}]  {}\t{}\n", j.id, j.state.marker(), j.command)).collect();
        lines.sort();
        ctx.state.jobs.sweep_finished();
        ExecResult::success(lines.concat())
    }
}

pub struct Fg;
#[async_trait]
impl Builtin for Fg {
    fn name(&self) -> &'static str {
        "fg"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let designator = ctx.args.first().map(String::as_str).unwrap_or("%+");
        let Some(job) = ctx.state.jobs.resolve(designator).cloned() else {
            return ExecResult::failure(format!("fg: {designator}: no such job"), 1);
        };
        if ctx.state.jobs.signal(job.id, Signal::SIGCONT).is_err() {
            return ExecResult::failure(format!("fg: {}: job has terminated", job.id), 1);
        }
        ExecResult::success(format!("{}\n", job.command))
    }
}

pub struct Bg;
#[async_trait]
impl Builtin for Bg {
    fn name(&self) -> &'static str {
        "bg"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let designator = ctx.args.first().map(String::as_str).unwrap_or("%+");
        let Some(job) = ctx.state.jobs.resolve(designator).cloned() else {
            return ExecResult::failure(format!("bg: {designator}: no such job"), 1);
        };
        if ctx.state.jobs.signal(job.id, Signal::SIGCONT).is_err() {
            return ExecResult::failure(format!("bg: {}: job has terminated", job.id), 1);
        }
        ExecResult::success(format!("[{}] {}\n", job.id, job.command))
    }
}

pub struct Disown;
#[async_trait]
impl Builtin for Disown {
    fn name(&self) -> &'static str {
        "disown"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        if ctx.args.is_empty() {
            let ids: Vec<i32> = ctx.state.jobs.iter().map(|j| j.id).collect();
            for id in ids {
                ctx.state.jobs.remove(id);
            }
            return ExecResult::success("");
        }
        for designator in ctx.args {
            if let Some(id) = ctx.state.jobs.resolve(designator).map(|j| j.id) {
                ctx.state.jobs.remove(id);
            }
        }
        ExecResult::success("")
    }
}

pub struct Wait;
#[async_trait]
impl Builtin for Wait {
    fn name(&self) -> &'static str {
        "wait"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let ids: Vec<i32> = if ctx.args.is_empty() {
            ctx.state.jobs.iter().map(|j| j.id).collect()
        } else {
            ctx.args.iter().filter_map(|d| ctx.state.jobs.resolve(d).map(|j| j.id)).collect()
        };

        let mut last_code = 0;
        for id in ids {
            loop {
                match ctx.state.jobs.get(id).map(|j| j.state) {
                    Some(state) if state.is_finished() => {
                        last_code = match state {
                            crate::jobs::JobState::Done(c) => c,
                            crate::jobs::JobState::Signaled(sig) => 128 + sig,
                            _ => 0,
                        };
                        break;
                    }
                    Some(_) => {
                        ctx.state.jobs.poll(id);
                        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    }
                    None => break,
                }
            }
        }
        ExecResult { stdout: String::new(), stderr: String::new(), exit_code: last_code }
    }
}

pub struct Kill;
#[async_trait]
impl Builtin for Kill {
    fn name(&self) -> &'static str {
        "kill"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let mut signal = Signal::SIGTERM;
        let mut targets = ctx.args.iter();
        let first = targets.next();
        let first = match first {
            Some(arg) if arg.starts_with("-s") => {
                let name = arg.strip_prefix("-s").filter(|s| !s.is_empty()).map(str::to_string).or_else(|| targets.next().cloned());
                if let Some(name) = name {
                    if let Some(s) = parse_signal(&name) {
                        signal = s;
                    }
                }
                targets.next()
            }
            Some(arg) if arg.starts_with('-') && arg.len() > 1 => {
                if let Some(s) = parse_signal(&arg[1..]) {
                    signal = s;
                }
                targets.next()
            }
            other => other,
        };

        let Some(designator) = first else {
            return ExecResult::failure("kill: usage: kill [-s sigspec] pid | %jobspec", 2);
        };

        if let Some(job_spec) = designator.strip_prefix('%') {
            let lookup = format!("%{job_spec}");
            return match ctx.state.jobs.resolve(&lookup).map(|j| j.id) {
                Some(id) => match ctx.state.jobs.signal(id, signal) {
                    Ok(()) => ExecResult::success(""),
                    Err(_) => ExecResult::failure(format!("kill: ({id}) - no such process"), 1),
                },
                None => ExecResult::failure(format!("kill: {designator}: no such job"), 1),
            };
        }

        match designator.parse::<i32>() {
            Ok(pid) => match nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), signal) {
                Ok(()) => ExecResult::success(""),
                Err(_) => ExecResult::failure(format!("kill: ({pid}) - no such process"), 1),
            },
            Err(_) => ExecResult::failure(format!("kill: {designator}: arguments must be process or job IDs"), 1),
        }
    }
}

fn parse_signal(name: &str) -> Option<Signal> {
    let normalized = name.trim_start_matches("SIG").to_uppercase();
    match normalized.as_str() {
        "TERM" | "15" => Some(Signal::SIGTERM),
        "KILL" | "9" => Some(Signal::SIGKILL),
        "INT" | "2" => Some(Signal::SIGINT),
        "HUP" | "1" => Some(Signal::SIGHUP),
        "STOP" | "19" => Some(Signal::SIGSTOP),
        "CONT" | "18" => Some(Signal::SIGCONT),
        "QUIT" | "3" => Some(Signal::SIGQUIT),
        _ => None,
    }
}
