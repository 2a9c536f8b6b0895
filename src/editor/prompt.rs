//! Prompt renderer seam.
//!
//! The core only requires a callable `render`/`render_right`; `KrustyPrompt`
//! adapts whatever `PromptRenderer` it's given to `reedline::Prompt`, the
//! trait the line editor actually drives.

use std::borrow::Cow;
use std::path::PathBuf;

use reedline::{Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};

/// Everything the core hands a prompt renderer each turn. `git_branch` is
/// always `None` in this build — git integration is a theming collaborator's
/// job, not the core's, per the spec's "consumed, not implemented" framing.
#[derive(Debug, Clone)]
pub struct PromptState {
    pub cwd: PathBuf,
    pub last_exit_code: i32,
    pub last_duration_ms: u64,
    pub git_branch: Option<String>,
}

impl Default for PromptState {
    fn default() -> Self {
        Self { cwd: PathBuf::from("/"), last_exit_code: 0, last_duration_ms: 0, git_branch: None }
    }
}

pub trait PromptRenderer: Send {
    fn render(&self, state: &PromptState) -> String;
    fn render_right(&self, state: &PromptState) -> String;
}

/// cwd + exit code, no git/theme info — enough to run the shell standalone.
pub struct DefaultPromptRenderer;

impl PromptRenderer for DefaultPromptRenderer {
    fn render(&self, state: &PromptState) -> String {
        let cwd = state.cwd.display();
        if state.last_exit_code == 0 {
            format!("{cwd} $ ")
        } else {
            format!("{cwd} [{}] $ ", state.last_exit_code)
        }
    }

    fn render_right(&self, state: &PromptState) -> String {
        if state.last_duration_ms > 0 {
            format!("{}ms", state.last_duration_ms)
        } else {
            String::new()
        }
    }
}

pub struct KrustyPrompt {
    pub renderer: Box<dyn PromptRenderer>,
    pub state: PromptState,
}

impl KrustyPrompt {
    pub fn new(renderer: Box<dyn PromptRenderer>, state: PromptState) -> Self {
        Self { renderer, state }
    }
}

impl Prompt for KrustyPrompt {
    fn render_prompt_left(&self) -> Cow<str> {
        Cow::Owned(self.renderer.render(&self.state))
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Owned(self.renderer.render_right(&self.state))
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed("::: ")
    }

    fn render_prompt_history_search_indicator(&self, history_search: PromptHistorySearch) -> Cow<str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({prefix}reverse-search: {}) ", history_search.term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_renderer_shows_exit_code_only_on_failure() {
        let renderer = DefaultPromptRenderer;
        let mut state = PromptState { cwd: PathBuf::from("/tmp"), ..Default::default() };
        assert_eq!(renderer.render(&state), "/tmp $ ");
        state.last_exit_code = 2;
        assert_eq!(renderer.render(&state), "/tmp [2] $ ");
    }
}
