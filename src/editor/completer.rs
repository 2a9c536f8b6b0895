//! `reedline::Completer` adapter over the pure completion provider
//! (`crate::completion`).

use std::sync::{Arc, RwLock};

use reedline::{Completer, Span, Suggestion};

use crate::completion::{self, Snapshot};

pub struct KrustyCompleter {
    snapshot: Arc<RwLock<Snapshot>>,
    case_sensitive: bool,
    max_suggestions: usize,
}

impl KrustyCompleter {
    pub fn new(snapshot: Arc<RwLock<Snapshot>>, case_sensitive: bool, max_suggestions: usize) -> Self {
        Self { snapshot, case_sensitive, max_suggestions }
    }
}

impl Completer for KrustyCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let Ok(snapshot) = self.snapshot.read() else { return Vec::new() };
        let groups = completion::complete(line, pos, &snapshot, self.case_sensitive, self.max_suggestions);
        let word_start = current_word_start(line, pos);
        groups
            .into_iter()
            .flat_map(|g| g.items)
            .map(|value| Suggestion {
                value,
                description: None,
                style: None,
                extra: None,
                span: Span::new(word_start, pos),
                append_whitespace: true,
            })
            .collect()
    }
}

fn current_word_start(line: &str, pos: usize) -> usize {
    line[..pos.min(line.len())].rfind(char::is_whitespace).map(|i| i + 1).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_start_of_last_word() {
        assert_eq!(current_word_start("cd foo/ba", 9), 3);
        assert_eq!(current_word_start("ls", 2), 0);
    }
}
