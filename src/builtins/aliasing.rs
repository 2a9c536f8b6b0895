//! `alias` / `unalias`.

use async_trait::async_trait;

use crate::builtins::{Builtin, BuiltinContext};
use crate::exec::ExecResult;

pub struct Alias;
#[async_trait]
impl Builtin for Alias {
    fn name(&self) -> &'static str {
        "alias"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        if ctx.args.is_empty() {
            let out = ctx.state.aliases.iter().map(|(k, v)| format!("alias {k}='{v}'\n")).collect::<String>();
            return ExecResult::success(out);
        }
        let mut out = String::new();
        let mut failed = false;
        for arg in ctx.args {
            match arg.split_once('=') {
                Some((name, value)) => {
                    ctx.state.aliases.set(name, value);
                }
                None => match ctx.state.aliases.get(arg) {
                    Some(value) => out.push_str(&format!("alias {arg}='{value}'\n")),
                    None => {
                        failed = true;
                        out.push_str(&format!("krusty: alias: {arg}: not found\n"));
                    }
                },
            }
        }
        if failed {
            ExecResult::failure(out, 1)
        } else {
            ExecResult::success(out)
        }
    }
}

pub struct Unalias;
#[async_trait]
impl Builtin for Unalias {
    fn name(&self) -> &'static str {
        "unalias"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        if ctx.args.first().map(String::as_str) == Some("-a") {
            let names: Vec<String> = ctx.state.aliases.iter().map(|(k, _)| k.to_string()).collect();
            for name in names {
                ctx.state.aliases.remove(&name);
            }
            return ExecResult::success("");
        }
        for name in ctx.args {
            ctx.state.aliases.remove(name);
        }
        ExecResult::success("")
    }
}
