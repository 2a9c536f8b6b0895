//! `history` builtin.

use async_trait::async_trait;

use crate::builtins::{Builtin, BuiltinContext};
use crate::exec::ExecResult;

pub struct HistoryCmd;
#[async_trait]
impl Builtin for HistoryCmd {
    fn name(&self) -> &'static str {
        "history"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        match ctx.args.first().map(String::as_str) {
            Some("-c") => {
                ctx.state.history.clear();
                ExecResult::success("")
            }
            Some(n) if n.parse::<usize>().is_ok() => {
                let n: usize = n.parse().unwrap();
                let out = ctx
                    .state
                    .history
                    .iter()
                    .rev()
                    .take(n)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .map(|e| format!("{:5}  {}\n", e.index, e.command))
                    .collect::<String>();
                ExecResult::success(out)
            }
            _ => {
                let out = ctx.state.history.iter().map(|e| format!("{:5}  {}\n", e.index, e.command)).collect::<String>();
                ExecResult::success(out)
            }
        }
    }
}
