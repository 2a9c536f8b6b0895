//! `ShellState` — the process-wide singleton.
//!
//! Krusty confines all mutable shared state to one owned `ShellState`,
//! passed by reference to every component, instead of module-level
//! singletons or cyclic owning pointers between the shell and its managers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::alias::AliasTable;
use crate::expansion::cache::ExpansionCaches;
use crate::history::History;
use crate::jobs::JobManager;

/// `set -o` style shell options. Mirrors the teacher's
/// `interpreter::types::ShellOptions`, trimmed to the options krusty's
/// control-flow and execution engine actually consult.
#[derive(Debug, Clone)]
pub struct ShellOptions {
    pub errexit: bool,
    pub pipefail: bool,
    pub nounset: bool,
    pub xtrace: bool,
    pub noclobber: bool,
    pub noglob: bool,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            errexit: false,
            pipefail: false,
            nounset: false,
            xtrace: false,
            noclobber: false,
            noglob: false,
        }
    }
}

/// One shell-option name in SHELLOPTS order, used by the `set`/`export`
/// builtins to render `$SHELLOPTS`.
pub const SHELLOPTS_ORDER: &[(&str, fn(&ShellOptions) -> bool)] = &[
    ("errexit", |o| o.errexit),
    ("noclobber", |o| o.noclobber),
    ("noglob", |o| o.noglob),
    ("nounset", |o| o.nounset),
    ("pipefail", |o| o.pipefail),
    ("xtrace", |o| o.xtrace),
];

pub fn build_shellopts(options: &ShellOptions) -> String {
    SHELLOPTS_ORDER
        .iter()
        .filter(|(_, get)| get(options))
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(":")
}

/// Sandbox vs. full-shell command substitution mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubstitutionMode {
    Shell,
    Sandbox { allow: Vec<String> },
}

impl Default for SubstitutionMode {
    fn default() -> Self {
        SubstitutionMode::Shell
    }
}

impl SubstitutionMode {
    pub fn default_sandbox() -> Self {
        SubstitutionMode::Sandbox { allow: vec!["echo".to_string(), "printf".to_string()] }
    }

    pub fn is_allowed(&self, command_name: &str, argv: &str) -> bool {
        match self {
            SubstitutionMode::Shell => true,
            SubstitutionMode::Sandbox { allow } => {
                if !allow.iter().any(|a| a == command_name) {
                    return false;
                }
                // Forbid shell metacharacters in the substituted command text.
                !argv.contains(['|', '&', ';', '$', '`', '<', '>', '(', ')'])
            }
        }
    }
}

/// The process-wide shell state. Owned exclusively by the REPL/`exec` driver;
/// every component borrows it (mutably or not) for the duration of one call.
pub struct ShellState {
    pub cwd: std::path::PathBuf,
    pub environment: HashMap<String, String>,
    pub aliases: AliasTable,
    pub history: History,
    pub jobs: JobManager,
    pub last_exit_code: i32,
    pub last_duration_ms: u64,
    pub options: ShellOptions,
    pub dir_stack: Vec<std::path::PathBuf>,
    pub bookmarks: HashMap<String, std::path::PathBuf>,
    pub substitution_mode: SubstitutionMode,
    /// Function table for the script interpreter (§4.E).
    pub functions: HashMap<String, crate::script::ast::Function>,
    /// Positional parameters for the current scope (`$1..$N`, `$0`).
    pub positional: Vec<String>,
    pub shell_name: String,
    /// `local` scoping stack: one frame per active function call, mapping
    /// each shadowed variable name to its pre-`local` value (`None` if it
    /// was unset). Popped and restored when the function returns.
    pub local_stack: Vec<HashMap<String, Option<String>>>,
    /// One-shot (`krusty exec`) mode forces every pipeline stage's output to
    /// be captured rather than streamed to the terminal, so it can be
    /// printed once the whole chain finishes.
    pub capture_output: bool,
    /// Bounded caches for argument-split results, executable-path
    /// resolution, and tokenized arithmetic expressions. Overwritten with
    /// config-derived limits once `Config::load` has run.
    pub expansion_caches: ExpansionCaches,
    next_job_id: AtomicI32,
}

impl ShellState {
    pub fn new(cwd: std::path::PathBuf, environment: HashMap<String, String>) -> Self {
        Self {
            cwd,
            environment,
            aliases: AliasTable::new(),
            history: History::new(Default::default()),
            jobs: JobManager::new(),
            last_exit_code: 0,
            last_duration_ms: 0,
            options: ShellOptions::default(),
            dir_stack: Vec::new(),
            bookmarks: HashMap::new(),
            substitution_mode: SubstitutionMode::Shell,
            functions: HashMap::new(),
            positional: Vec::new(),
            shell_name: "krusty".to_string(),
            local_stack: Vec::new(),
            capture_output: false,
            expansion_caches: ExpansionCaches::default(),
            next_job_id: AtomicI32::new(1),
        }
    }

    /// Declare `name` local to the innermost function frame, stashing its
    /// prior value (if any) the first time it is shadowed in that frame.
    pub fn declare_local(&mut self, name: &str, value: Option<String>) {
        if let Some(frame) = self.local_stack.last_mut() {
            frame.entry(name.to_string()).or_insert_with(|| self.environment.get(name).cloned());
        }
        match value {
            Some(v) => {
                self.environment.insert(name.to_string(), v);
            }
            None => {
                self.environment.remove(name);
            }
        }
    }

    /// Pop the innermost function frame, restoring every variable it shadowed.
    pub fn pop_local_frame(&mut self) {
        let Some(frame) = self.local_stack.pop() else { return };
        for (name, prior) in frame {
            match prior {
                Some(v) => {
                    self.environment.insert(name, v);
                }
                None => {
                    self.environment.remove(&name);
                }
            }
        }
    }

    /// Monotonic job id allocation; ids increase and are never reused.
    pub fn next_job_id(&self) -> i32 {
        self.next_job_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn env_or(&self, key: &str, default: &str) -> String {
        self.environment.get(key).cloned().unwrap_or_else(|| default.to_string())
    }

    pub fn path_dirs(&self) -> Vec<String> {
        self.environment
            .get("PATH")
            .map(|p| p.split(':').map(str::to_string).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shellopts_render_sorted_enabled_only() {
        let mut o = ShellOptions::default();
        o.pipefail = true;
        o.xtrace = true;
        assert_eq!(build_shellopts(&o), "pipefail:xtrace");
    }

    #[test]
    fn sandbox_blocks_non_whitelisted_command() {
        let mode = SubstitutionMode::default_sandbox();
        assert!(mode.is_allowed("echo", "echo hi"));
        assert!(!mode.is_allowed("rm", "rm -rf /"));
    }

    #[test]
    fn sandbox_blocks_metacharacters_in_whitelisted_command() {
        let mode = SubstitutionMode::default_sandbox();
        assert!(!mode.is_allowed("echo", "echo hi; rm -rf /"));
    }
}
