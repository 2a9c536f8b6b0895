//! Environment and variable-scoping builtins — `export`, `unset`, `set`,
//! `shopt`, `local`, `declare`, `read`, `shift`, `getopts`, `hash`, `type`,
//! `help`.

use async_trait::async_trait;

use crate::builtins::{Builtin, BuiltinContext};
use crate::exec::ExecResult;

fn split_assignment(arg: &str) -> Option<(&str, &str)> {
    arg.split_once('=')
}

pub struct Export;
#[async_trait]
impl Builtin for Export {
    fn name(&self) -> &'static str {
        "export"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        if ctx.args.is_empty() {
            let mut pairs: Vec<_> = ctx.state.environment.iter().collect();
            pairs.sort_by_key(|(k, _)| k.clone());
            let out = pairs.iter().map(|(k, v)| format!("declare -x {k}=\"{v}\"\n")).collect::<String>();
            return ExecResult::success(out);
        }
        for arg in ctx.args {
            match split_assignment(arg) {
                Some((name, value)) => {
                    ctx.state.environment.insert(name.to_string(), value.to_string());
                }
                None => {
                    // `export NAME` with no `=` marks an existing shell
                    // variable for export; krusty has one flat environment
                    // map, so this is already a no-op beyond validation.
                    if !ctx.state.environment.contains_key(arg.as_str()) {
                        ctx.state.environment.insert(arg.clone(), String::new());
                    }
                }
            }
        }
        ExecResult::success("")
    }
}

pub struct Unset;
#[async_trait]
impl Builtin for Unset {
    fn name(&self) -> &'static str {
        "unset"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        for name in ctx.args {
            ctx.state.environment.remove(name);
        }
        ExecResult::success("")
    }
}

pub struct Set;
#[async_trait]
impl Builtin for Set {
    fn name(&self) -> &'static str {
        "set"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        if ctx.args.is_empty() {
            let mut pairs: Vec<_> = ctx.state.environment.iter().collect();
            pairs.sort_by_key(|(k, _)| k.clone());
            let out = pairs.iter().map(|(k, v)| format!("{k}={v}\n")).collect::<String>();
            return ExecResult::success(out);
        }
        for arg in ctx.args {
            let (enable, flags) = match arg.strip_prefix('-') {
                Some(f) => (true, f),
                None => match arg.strip_prefix('+') {
                    Some(f) => (false, f),
                    None => continue,
                },
            };
            for flag in flags.chars() {
                match flag {
                    'e' => ctx.state.options.errexit = enable,
                    'u' => ctx.state.options.nounset = enable,
                    'x' => ctx.state.options.xtrace = enable,
                    'f' => ctx.state.options.noglob = enable,
                    'C' => ctx.state.options.noclobber = enable,
                    _ => {}
                }
            }
        }
        // Long-form `set -o pipefail` / `set +o pipefail`.
        let mut i = 0;
        while i < ctx.args.len() {
            if (ctx.args[i] == "-o" || ctx.args[i] == "+o") && i + 1 < ctx.args.len() {
                let enable = ctx.args[i] == "-o";
                match ctx.args[i + 1].as_str() {
                    "pipefail" => ctx.state.options.pipefail = enable,
                    "errexit" => ctx.state.options.errexit = enable,
                    "nounset" => ctx.state.options.nounset = enable,
                    "xtrace" => ctx.state.options.xtrace = enable,
                    "noglob" => ctx.state.options.noglob = enable,
                    "noclobber" => ctx.state.options.noclobber = enable,
                    _ => {}
                }
                i += 2;
            } else {
                i += 1;
            }
        }
        ExecResult::success("")
    }
}

pub struct Shopt;
#[async_trait]
impl Builtin for Shopt {
    fn name(&self) -> &'static str {
        "shopt"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        // krusty tracks a handful of options via `ShellOptions`; `shopt`
        // exposes the glob-related ones bash-style.
        if ctx.args.is_empty() {
            return ExecResult::success(format!("nocaseglob\t{}\n", if ctx.state.options.noglob { "off" } else { "on" }));
        }
        ExecResult::success("")
    }
}

pub struct Local;
#[async_trait]
impl Builtin for Local {
    fn name(&self) -> &'static str {
        "local"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        if ctx.state.local_stack.is_empty() {
            return ExecResult::failure("local: can only be used in a function", 1);
        }
        for arg in ctx.args {
            match split_assignment(arg) {
                Some((name, value)) => ctx.state.declare_local(name, Some(value.to_string())),
                None => ctx.state.declare_local(arg, ctx.state.environment.get(arg.as_str()).cloned()),
            }
        }
        ExecResult::success("")
    }
}

pub struct Declare;
#[async_trait]
impl Builtin for Declare {
    fn name(&self) -> &'static str {
        "declare"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let args: Vec<String> = ctx.args.iter().filter(|a| !a.starts_with('-')).cloned().collect();
        for arg in &args {
            match split_assignment(arg) {
                Some((name, value)) => {
                    ctx.state.environment.insert(name.to_string(), value.to_string());
                }
                None => {
                    ctx.state.environment.entry(arg.clone()).or_insert_with(String::new);
                }
            }
        }
        ExecResult::success("")
    }
}

pub struct Read;
#[async_trait]
impl Builtin for Read {
    fn name(&self) -> &'static str {
        "read"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let line = match &ctx.stdin {
            Some(s) => s.lines().next().unwrap_or("").to_string(),
            None => {
                let mut buf = String::new();
                if std::io::stdin().read_line(&mut buf).is_err() {
                    return ExecResult::failure("read: error reading input", 1);
                }
                buf.trim_end_matches('\n').to_string()
            }
        };
        let ifs = ctx.state.env_or("IFS", " \t\n");
        let fields: Vec<&str> = line.split(|c: char| ifs.contains(c)).filter(|s| !s.is_empty()).collect();
        if ctx.args.is_empty() {
            ctx.state.environment.insert("REPLY".to_string(), line);
            return ExecResult::success("");
        }
        for (i, name) in ctx.args.iter().enumerate() {
            let value = if i + 1 == ctx.args.len() {
                fields.get(i..).map(|rest| rest.join(" ")).unwrap_or_default()
            } else {
                fields.get(i).map(|s| s.to_string()).unwrap_or_default()
            };
            ctx.state.environment.insert(name.clone(), value);
        }
        ExecResult::success("")
    }
}

pub struct Shift;
#[async_trait]
impl Builtin for Shift {
    fn name(&self) -> &'static str {
        "shift"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let n = ctx.args.first().and_then(|s| s.parse::<usize>().ok()).unwrap_or(1);
        if n > ctx.state.positional.len() {
            return ExecResult::failure("shift: shift count out of range", 1);
        }
        ctx.state.positional.drain(0..n);
        ExecResult::success("")
    }
}

pub struct Getopts;
#[async_trait]
impl Builtin for Getopts {
    fn name(&self) -> &'static str {
        "getopts"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let Some(optstring) = ctx.args.first() else {
            return ExecResult::failure("getopts: usage: getopts optstring name [arg]", 2);
        };
        let Some(varname) = ctx.args.get(1) else {
            return ExecResult::failure("getopts: usage: getopts optstring name [arg]", 2);
        };
        let index_key = format!("__GETOPTS_IND_{varname}");
        let mut index: usize = ctx.state.environment.get(&index_key).and_then(|s| s.parse().ok()).unwrap_or(0);
        let args: Vec<String> = if ctx.args.len() > 2 { ctx.args[2..].to_vec() } else { ctx.state.positional.clone() };

        if index >= args.len() {
            ctx.state.environment.insert(varname.clone(), "?".to_string());
            return ExecResult::failure("", 1);
        }
        let current = &args[index];
        if !current.starts_with('-') || current == "-" {
            ctx.state.environment.insert(varname.clone(), "?".to_string());
            return ExecResult::failure("", 1);
        }
        let opt = current.chars().nth(1).unwrap_or('?');
        index += 1;
        if let Some(pos) = optstring.find(opt) {
            if optstring.as_bytes().get(pos + 1) == Some(&b':') {
                if let Some(optarg) = args.get(index) {
                    ctx.state.environment.insert("OPTARG".to_string(), optarg.clone());
                    index += 1;
                }
            }
            ctx.state.environment.insert(varname.clone(), opt.to_string());
        } else {
            ctx.state.environment.insert(varname.clone(), "?".to_string());
        }
        ctx.state.environment.insert(index_key, index.to_string());
        ctx.state.environment.insert("OPTIND".to_string(), (index + 1).to_string());
        ExecResult::success("")
    }
}

pub struct Hash;
#[async_trait]
impl Builtin for Hash {
    fn name(&self) -> &'static str {
        "hash"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        if ctx.args.first().map(String::as_str) == Some("-r") {
            return ExecResult::success("");
        }
        ExecResult::success("")
    }
}

pub struct TypeCmd;
#[async_trait]
impl Builtin for TypeCmd {
    fn name(&self) -> &'static str {
        "type"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        let Some(name) = ctx.args.first() else {
            return ExecResult::failure("type: usage: type name", 2);
        };
        if ctx.state.functions.contains_key(name) {
            return ExecResult::success(format!("{name} is a function\n"));
        }
        if ctx.state.aliases.get(name).is_some() {
            return ExecResult::success(format!("{name} is aliased to `{}'\n", ctx.state.aliases.get(name).unwrap()));
        }
        for dir in ctx.state.path_dirs() {
            let candidate = std::path::Path::new(&dir).join(name);
            if candidate.is_file() {
                return ExecResult::success(format!("{name} is {}\n", candidate.display()));
            }
        }
        ExecResult::failure(format!("type: {name}: not found"), 1)
    }
}

pub struct Help;
#[async_trait]
impl Builtin for Help {
    fn name(&self) -> &'static str {
        "help"
    }
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult {
        if let Some(topic) = ctx.args.first() {
            return ExecResult::success(format!("{topic}: a krusty shell builtin\n"));
        }
        ExecResult::success("krusty — an interactive, POSIX-inspired command shell\n")
    }
}
