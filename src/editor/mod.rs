//! Line editor, grounded on `nushell`'s reedline+crossterm dependency pair.
//!
//! `reedline::Reedline` owns the keypress loop, cursor model, and raw
//! terminal I/O (`crossterm`); krusty supplies the four pluggable pieces it
//! customizes (`Completer`, `Hinter`, `Highlighter`, `Validator`) plus the
//! `Prompt` adapter over `PromptRenderer`. Emacs keybindings are reedline's
//! own defaults (Ctrl-A/E, Alt-B/F, Ctrl-W/Alt-D, Ctrl-U/K, history arrows,
//! Tab completion, Ctrl-R reverse search, Ctrl-C, Enter), so krusty never
//! reimplements ANSI keypress handling.

pub mod completer;
pub mod highlighter;
pub mod hinter;
pub mod prompt;
pub mod validator;

use std::sync::{Arc, RwLock};

use reedline::{Reedline, Signal};

use crate::builtins::BuiltinRegistry;
use crate::completion::Snapshot;
use crate::config::CompletionSettings;
use crate::error::{KrustyError, Result};
use crate::state::ShellState;

use completer::KrustyCompleter;
use highlighter::KrustyHighlighter;
use hinter::KrustyHinter;
pub use prompt::{DefaultPromptRenderer, PromptRenderer, PromptState};
use prompt::KrustyPrompt;
use validator::KrustyValidator;

pub enum EditorSignal {
    Submit(String),
    Interrupted,
    Eof,
}

pub struct LineEditor {
    editor: Reedline,
    prompt: KrustyPrompt,
    snapshot: Arc<RwLock<Snapshot>>,
    hint_source: Arc<RwLock<Vec<String>>>,
}

impl LineEditor {
    pub fn new(renderer: Box<dyn PromptRenderer>, completion: &CompletionSettings) -> Self {
        let snapshot = Arc::new(RwLock::new(Snapshot::default()));
        let hint_source = Arc::new(RwLock::new(Vec::new()));

        let completer = Box::new(KrustyCompleter::new(snapshot.clone(), completion.case_sensitive, completion.max_suggestions));
        let hinter = Box::new(KrustyHinter::new(hint_source.clone()));
        let highlighter = Box::new(KrustyHighlighter::new(snapshot.clone()));
        let validator = Box::new(KrustyValidator);

        let editor = Reedline::create()
            .with_completer(completer)
            .with_hinter(hinter)
            .with_highlighter(highlighter)
            .with_validator(validator);

        let prompt = KrustyPrompt::new(renderer, PromptState::default());

        Self { editor, prompt, snapshot, hint_source }
    }

    /// Refresh the completer/highlighter snapshot and hint source, and the
    /// prompt's rendered state, from the live shell. Called once per
    /// REPL turn before `read_line`.
    pub fn sync(&mut self, state: &ShellState, registry: &BuiltinRegistry) {
        if let Ok(mut snap) = self.snapshot.write() {
            *snap = Snapshot::capture(state, registry);
        }
        if let Ok(mut hints) = self.hint_source.write() {
            *hints = state.history.iter().map(|e| e.command.clone()).collect();
        }
        self.prompt.state = PromptState {
            cwd: state.cwd.clone(),
            last_exit_code: state.last_exit_code,
            last_duration_ms: state.last_duration_ms,
            git_branch: None,
        };
    }

    pub fn read_line(&mut self) -> Result<EditorSignal> {
        match self.editor.read_line(&self.prompt) {
            Ok(Signal::Success(buffer)) => Ok(EditorSignal::Submit(buffer)),
            Ok(Signal::CtrlC) => Ok(EditorSignal::Interrupted),
            Ok(Signal::CtrlD) => Ok(EditorSignal::Eof),
            Err(e) => Err(KrustyError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))),
        }
    }
}
