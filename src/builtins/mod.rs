//! Builtin registry.
//!
//! The teacher splits commands into leaf utilities (`commands/*`: `cat`,
//! `grep`, `ls`, …) and shell intrinsics (`interpreter/builtins/*`: `cd`,
//! `export`, `set`, …). Krusty only needs the latter category — leaf
//! utilities are out of scope (real `/bin/cat` etc. run through §4.H
//! instead) — but keeps the teacher's `Command` trait shape (`async_trait`,
//! `execute(ctx) -> Result`) and its insertion-ordered registry, here backed
//! by `indexmap::IndexMap` instead of the teacher's `Vec`-plus-`HashMap`
//! pair, since `indexmap` already covers that exact need as one real crate.

pub mod aliasing;
pub mod control;
pub mod environment;
pub mod history_builtin;
pub mod jobctl;
pub mod navigation;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::exec::ExecResult;
use crate::state::ShellState;

pub struct BuiltinContext<'a> {
    pub args: &'a [String],
    pub state: &'a mut ShellState,
    pub stdin: Option<String>,
}

#[async_trait]
pub trait Builtin: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, ctx: &mut BuiltinContext<'_>) -> ExecResult;
}

pub struct BuiltinRegistry {
    builtins: IndexMap<&'static str, Box<dyn Builtin>>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        let mut builtins: IndexMap<&'static str, Box<dyn Builtin>> = IndexMap::new();
        let mut register = |b: Box<dyn Builtin>| {
            builtins.insert(b.name(), b);
        };

        register(Box::new(navigation::Cd));
        register(Box::new(navigation::Pushd));
        register(Box::new(navigation::Popd));
        register(Box::new(navigation::Dirs));
        register(Box::new(navigation::Bookmark));

        register(Box::new(environment::Export));
        register(Box::new(environment::Unset));
        register(Box::new(environment::Set));
        register(Box::new(environment::Shopt));
        register(Box::new(environment::Local));
        register(Box::new(environment::Declare));
        register(Box::new(environment::Read));
        register(Box::new(environment::Shift));
        register(Box::new(environment::Getopts));
        register(Box::new(environment::Hash));
        register(Box::new(environment::TypeCmd));
        register(Box::new(environment::Help));

        register(Box::new(control::Exit));
        register(Box::new(control::Return));
        register(Box::new(control::Break));
        register(Box::new(control::Continue));
        register(Box::new(control::Source));
        register(Box::new(control::Eval));

        register(Box::new(aliasing::Alias));
        register(Box::new(aliasing::Unalias));

        register(Box::new(jobctl::Jobs));
        register(Box::new(jobctl::Fg));
        register(Box::new(jobctl::Bg));
        register(Box::new(jobctl::Disown));
        register(Box::new(jobctl::Wait));
        register(Box::new(jobctl::Kill));

        register(Box::new(history_builtin::HistoryCmd));

        Self { builtins }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Builtin> {
        self.builtins.get(name).map(|b| b.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.builtins.keys().copied()
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_expected_intrinsic() {
        let registry = BuiltinRegistry::new();
        for name in [
            "cd", "pushd", "popd", "dirs", "bookmark", "export", "unset", "set", "shopt", "local", "declare",
            "read", "shift", "getopts", "hash", "type", "help", "exit", "return", "break", "continue", "source",
            "eval", "alias", "unalias", "jobs", "fg", "bg", "disown", "wait", "kill", "history",
        ] {
            assert!(registry.contains(name), "missing builtin: {name}");
        }
    }

    #[test]
    fn insertion_order_is_preserved() {
        let registry = BuiltinRegistry::new();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names.first(), Some(&"cd"));
    }
}
