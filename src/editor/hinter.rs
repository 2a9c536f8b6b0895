//! Inline history-based suggestion overlay.
//!
//! Shown dimmed after the cursor; accepting it completes the buffer to the
//! most recent history entry sharing the current line as a prefix. Searches
//! krusty's own `History`, refreshed into `history` before each `read_line`
//! call (see `editor::LineEditor::sync`), rather than reedline's built-in
//! history store.

use std::sync::{Arc, RwLock};

use nu_ansi_term::Style;
use reedline::{Hinter, History as ReedlineHistory};

pub struct KrustyHinter {
    history: Arc<RwLock<Vec<String>>>,
    current_hint: String,
}

impl KrustyHinter {
    pub fn new(history: Arc<RwLock<Vec<String>>>) -> Self {
        Self { history, current_hint: String::new() }
    }
}

impl Hinter for KrustyHinter {
    fn handle(&mut self, line: &str, _pos: usize, _history: &dyn ReedlineHistory, _use_ansi_coloring: bool) -> String {
        let entries = self.history.read().map(|e| e.clone()).unwrap_or_default();
        self.current_hint = find_hint(&entries, line);
        if self.current_hint.is_empty() {
            String::new()
        } else {
            Style::new().dimmed().paint(&self.current_hint).to_string()
        }
    }

    fn complete_hint(&self) -> String {
        self.current_hint.clone()
    }

    fn next_hint(&mut self, _forward: bool) -> String {
        self.current_hint.clone()
    }
}

/// The remainder of the most recent history entry that has `line` as a
/// strict prefix, or empty if there is no such entry.
fn find_hint(entries: &[String], line: &str) -> String {
    if line.is_empty() {
        return String::new();
    }
    entries
        .iter()
        .rev()
        .find(|cmd| cmd.as_str() != line && cmd.starts_with(line))
        .map(|cmd| cmd[line.len()..].to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_the_most_recent_matching_entry() {
        let entries = vec!["git status".to_string(), "git commit -m fix".to_string()];
        assert_eq!(find_hint(&entries, "git c"), "ommit -m fix");
        assert_eq!(find_hint(&entries, "git commit -m fix"), "");
        assert_eq!(find_hint(&entries, ""), "");
    }
}
