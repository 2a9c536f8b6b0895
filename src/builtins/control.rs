//! Control-flow and script-loading builtins — `exit`, `return`, `break`,
//! `continue`, `source`, `eval`.
//!
//! `break`/`continue`/`return` only have real unwinding power when the
//! script interpreter (`crate::script::interpreter`) intercepts them before
//! generic dispatch — see its `intercept_control_flow`. The implementations
//! here exist so the registry is complete (`type break` works, and invoking
//! them outside a loop/function behaves like bash: a no-op success) but they
//! never run when a real loop or function body is live.

use async_trait::async_trait;

use crate::builtins::{Builtin, BuiltinContext};
use crate::exec::ExecResult;

pub struct Exit;
#[async_trait]
impl Builtin for Exit {
    fn name(&self) -> &'static str {
        "exit"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let code = ctx.args.first().and_then(|s| s.parse::<i32>().ok()).unwrap_or(ctx.state.last_exit_code);
        std::process::exit(code);
    }
}

pub struct Return;
#[async_trait]
impl Builtin for Return {
    fn name(&self) -> &'static str {
        "return"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let code = ctx.args.first().and_then(|s| s.parse::<i32>().ok()).unwrap_or(ctx.state.last_exit_code);
        ExecResult { stdout: String::new(), stderr: String::new(), exit_code: code }
    }
}

pub struct Break;
#[async_trait]
impl Builtin for Break {
    fn name(&self) -> &'static str {
        "break"
    }
    async fn execute(&self, _ctx: &mut BuiltinContext<'_>) -> ExecResult {
        ExecResult::success("")
    }
}

pub struct Continue;
#[async_trait]
impl Builtin for Continue {
    fn name(&self) -> &'static str {
        "continue"
    }
    async fn execute(&self, _ctx: &mut BuiltinContext<'_>) -> ExecResult {
        ExecResult::success("")
    }
}

pub struct Source;
#[async_trait]
impl Builtin for Source {
    fn name(&self) -> &'static str {
        "source"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let Some(path) = ctx.args.first() else {
            return ExecResult::failure("source: filename argument required", 2);
        };
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => return ExecResult::failure(format!("source: {path}: {e}"), 1),
        };
        let registry = crate::builtins::BuiltinRegistry::new();
        crate::script::interpreter::run_script(&contents, ctx.state, &registry).await
    }
}

pub struct Eval;
#[async_trait]
impl Builtin for Eval {
    fn name(&self) -> &'static str {
        "eval"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let joined = ctx.args.join(" ");
        let registry = crate::builtins::BuiltinRegistry::new();
        crate::script::interpreter::run_script(&joined, ctx.state, &registry).await
    }
}
