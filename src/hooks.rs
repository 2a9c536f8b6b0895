//! Hook dispatch.
//!
//! A `HookRegistry` is built once from `Config.hooks` at startup and fired at
//! each named lifecycle point. Only the `command` action kind runs a real
//! chain through `crate::exec::chain::run_chain`; `script`/`function`/
//! `plugin` actions are accepted (so config files naming them don't error)
//! but are no-ops here, since krusty carries no plugin loader.

use std::collections::HashMap;
use std::fmt;

use crate::builtins::BuiltinRegistry;
use crate::config::HookSpecConfig;
use crate::state::ShellState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    ShellInit,
    ShellStart,
    ShellStop,
    ShellExit,
    ShellReload,
    CommandBefore,
    CommandAfter,
    PromptBefore,
    PromptAfter,
    HistoryAdd,
    HistorySearch,
    CompletionBefore,
    CompletionAfter,
    DirectoryChange,
}

impl HookEvent {
    pub fn name(&self) -> &'static str {
        match self {
            HookEvent::ShellInit => "shell:init",
            HookEvent::ShellStart => "shell:start",
            HookEvent::ShellStop => "shell:stop",
            HookEvent::ShellExit => "shell:exit",
            HookEvent::ShellReload => "shell:reload",
            HookEvent::CommandBefore => "command:before",
            HookEvent::CommandAfter => "command:after",
            HookEvent::PromptBefore => "prompt:before",
            HookEvent::PromptAfter => "prompt:after",
            HookEvent::HistoryAdd => "history:add",
            HookEvent::HistorySearch => "history:search",
            HookEvent::CompletionBefore => "completion:before",
            HookEvent::CompletionAfter => "completion:after",
            HookEvent::DirectoryChange => "directory:change",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "shell:init" => HookEvent::ShellInit,
            "shell:start" => HookEvent::ShellStart,
            "shell:stop" => HookEvent::ShellStop,
            "shell:exit" => HookEvent::ShellExit,
            "shell:reload" => HookEvent::ShellReload,
            "command:before" => HookEvent::CommandBefore,
            "command:after" => HookEvent::CommandAfter,
            "prompt:before" => HookEvent::PromptBefore,
            "prompt:after" => HookEvent::PromptAfter,
            "history:add" => HookEvent::HistoryAdd,
            "history:search" => HookEvent::HistorySearch,
            "completion:before" => HookEvent::CompletionBefore,
            "completion:after" => HookEvent::CompletionAfter,
            "directory:change" => HookEvent::DirectoryChange,
            _ => return None,
        })
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload attached to a firing, used to build `$1`/env bindings for
/// `command`-kind hook actions. Fields are joined as positional words in the
/// order listed here; unused fields are simply absent for a given event.
#[derive(Debug, Clone, Default)]
pub struct HookPayload {
    pub command: Option<String>,
    pub exit_code: Option<i32>,
    pub old_dir: Option<String>,
    pub new_dir: Option<String>,
    pub query: Option<String>,
}

impl HookPayload {
    fn as_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(c) = &self.command {
            args.push(c.clone());
        }
        if let Some(code) = self.exit_code {
            args.push(code.to_string());
        }
        if let Some(d) = &self.old_dir {
            args.push(d.clone());
        }
        if let Some(d) = &self.new_dir {
            args.push(d.clone());
        }
        if let Some(q) = &self.query {
            args.push(q.clone());
        }
        args
    }
}

#[derive(Debug, Clone)]
struct Hook {
    action: HookSpecConfig,
}

#[derive(Debug, Default)]
pub struct HookRegistry {
    hooks: HashMap<HookEvent, Vec<Hook>>,
}

impl HookRegistry {
    pub fn from_config(hooks: &HashMap<String, Vec<HookSpecConfig>>) -> Self {
        let mut map: HashMap<HookEvent, Vec<Hook>> = HashMap::new();
        for (name, specs) in hooks {
            let Some(event) = HookEvent::parse(name) else {
                tracing::warn!(event = %name, "unknown hook event in config, ignoring");
                continue;
            };
            let mut list: Vec<Hook> = specs.iter().cloned().map(|action| Hook { action }).collect();
            list.sort_by_key(|h| -h.action.priority);
            map.insert(event, list);
        }
        Self { hooks: map }
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.values().all(|v| v.is_empty())
    }

    /// Run every enabled hook registered for `event`, in descending-priority
    /// order. Errors from one hook don't block later hooks in the same
    /// firing; each failure is logged and skipped.
    pub async fn fire(&self, event: HookEvent, payload: &HookPayload, state: &mut ShellState) {
        let Some(hooks) = self.hooks.get(&event) else { return };
        if hooks.is_empty() {
            return;
        }
        let registry = BuiltinRegistry::new();
        for hook in hooks {
            if !hook.action.enabled {
                continue;
            }
            if let Some(template) = &hook.action.command {
                let line = substitute_payload(template, payload);
                if let Err(e) = crate::exec::chain::run_chain(&line, &registry, state).await {
                    tracing::warn!(event = %event, error = %e, "hook command failed");
                }
            }
            // `script`/`function`/`plugin` hook kinds have no loader in this
            // build; they're accepted in config but don't fire anything.
        }
    }
}

/// Very small template substitution: `{}` is replaced with the payload's
/// positional args joined by spaces, so a config hook like
/// `"command": "echo changed dir to {}"` receives the new directory.
fn substitute_payload(template: &str, payload: &HookPayload) -> String {
    let args = payload.as_args().join(" ");
    template.replace("{}", &args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_event_names() {
        assert_eq!(HookEvent::parse("directory:change"), Some(HookEvent::DirectoryChange));
        assert_eq!(HookEvent::parse("bogus"), None);
    }

    #[test]
    fn empty_registry_reports_empty() {
        let reg = HookRegistry::from_config(&HashMap::new());
        assert!(reg.is_empty());
    }

    #[test]
    fn substitutes_payload_into_template() {
        let payload = HookPayload { new_dir: Some("/tmp".into()), ..Default::default() };
        assert_eq!(substitute_payload("cd to {}", &payload), "cd to /tmp");
    }
}
