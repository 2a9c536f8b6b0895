//! Directory-navigation builtins — `cd`, `pushd`, `popd`, `dirs`, `bookmark`.
//!
//! `cd -` / `OLDPWD` swap follows the teacher's `interpreter::builtins::cd_cmd`
//! shape; `pushd`/`popd`/`dirs` and `bookmark` are new (§4.G), grounded on the
//! same directory-stack idea applied to `ShellState::dir_stack`/`bookmarks`.

use async_trait::async_trait;

use crate::builtins::{Builtin, BuiltinContext};
use crate::exec::ExecResult;

fn resolve_target(ctx: &BuiltinContext<'_>, raw: &str) -> String {
    if raw == "~" {
        ctx.state.env_or("HOME", "/")
    } else if let Some(rest) = raw.strip_prefix("~/") {
        format!("{}/{rest}", ctx.state.env_or("HOME", "/"))
    } else {
        raw.to_string()
    }
}

pub struct Cd;
#[async_trait]
impl Builtin for Cd {
    fn name(&self) -> &'static str {
        "cd"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let mut print_path = false;
        let target = match ctx.args.first() {
            None => ctx.state.env_or("HOME", "/"),
            Some(a) if a == "-" => {
                print_path = true;
                ctx.state.env_or("OLDPWD", &ctx.state.cwd.to_string_lossy())
            }
            Some(a) => resolve_target(ctx, a),
        };

        let new_path = std::path::PathBuf::from(&target);
        let resolved = if new_path.is_absolute() { new_path } else { ctx.state.cwd.join(&new_path) };

        match std::fs::metadata(&resolved) {
            Ok(meta) if meta.is_dir() => {
                let old = ctx.state.cwd.clone();
                ctx.state.environment.insert("OLDPWD".to_string(), old.to_string_lossy().into_owned());
                ctx.state.cwd = resolved.canonicalize().unwrap_or(resolved);
                ctx.state.environment.insert("PWD".to_string(), ctx.state.cwd.to_string_lossy().into_owned());
                if print_path {
                    ExecResult::success(format!("{}\n", ctx.state.cwd.display()))
                } else {
                    ExecResult::success("")
                }
            }
            Ok(_) => ExecResult::failure(format!("cd: {target}: not a directory"), 1),
            Err(_) => ExecResult::failure(format!("cd: {target}: no such file or directory"), 1),
        }
    }
}

pub struct Pushd;
#[async_trait]
impl Builtin for Pushd {
    fn name(&self) -> &'static str {
        "pushd"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let Some(raw) = ctx.args.first() else {
            return ExecResult::failure("pushd: no other directory", 1);
        };
        let target = resolve_target(ctx, raw);
        let new_path = std::path::PathBuf::from(&target);
        let resolved = if new_path.is_absolute() { new_path } else { ctx.state.cwd.join(&new_path) };
        if !resolved.is_dir() {
            return ExecResult::failure(format!("pushd: {target}: no such file or directory"), 1);
        }
        ctx.state.dir_stack.push(ctx.state.cwd.clone());
        ctx.state.cwd = resolved.canonicalize().unwrap_or(resolved);
        ExecResult::success(render_stack(ctx))
    }
}

pub struct Popd;
#[async_trait]
impl Builtin for Popd {
    fn name(&self) -> &'static str {
        "popd"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        match ctx.state.dir_stack.pop() {
            Some(dir) => {
                ctx.state.cwd = dir;
                ExecResult::success(render_stack(ctx))
            }
            None => ExecResult::failure("popd: directory stack empty", 1),
        }
    }
}

fn render_stack(ctx: &BuiltinContext<'_>) -> String {
    let mut parts = vec![ctx.state.cwd.display().to_string()];
    parts.extend(ctx.state.dir_stack.iter().rev().map(|p| p.display().to_string()));
    format!("{}\n", parts.join(" "))
}

pub struct Dirs;
#[async_trait]
impl Builtin for Dirs {
    fn name(&self) -> &'static str {
        "dirs"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        ExecResult::success(render_stack(ctx))
    }
}

pub struct Bookmark;
#[async_trait]
impl Builtin for Bookmark {
    fn name(&self) -> &'static str {
        "bookmark"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        match ctx.args.first().map(String::as_str) {
            None | Some("list") => {
                let mut names: Vec<_> = ctx.state.bookmarks.keys().cloned().collect();
                names.sort();
                let out = names
                    .into_iter()
                    .map(|n| format!("{n}\t{}\n", ctx.state.bookmarks[&n].display()))
                    .collect::<String>();
                ExecResult::success(out)
            }
            Some("add") => {
                let Some(name) = ctx.args.get(1) else {
                    return ExecResult::failure("bookmark: add requires a name", 2);
                };
                ctx.state.bookmarks.insert(name.clone(), ctx.state.cwd.clone());
                ExecResult::success("")
            }
            Some("rm") => {
                let Some(name) = ctx.args.get(1) else {
                    return ExecResult::failure("bookmark: rm requires a name", 2);
                };
                ctx.state.bookmarks.remove(name);
                ExecResult::success("")
            }
            Some(name) => match ctx.state.bookmarks.get(name).cloned() {
                Some(path) => {
                    ctx.state.cwd = path;
                    ExecResult::success("")
                }
                None => ExecResult::failure(format!("bookmark: {name}: not found"), 1),
            },
        }
    }
}
