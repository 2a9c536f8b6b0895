//! Syntax highlighting; purely presentational.
//!
//! Tokenizes the buffer (`crate::parser::word_lexer`) and re-renders with
//! per-kind colors. Never alters the stored buffer — only the returned
//! `StyledText`.

use std::sync::{Arc, RwLock};

use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

use crate::ast::{Token, TokenKind};
use crate::completion::Snapshot;

const KEYWORDS: &[&str] =
    &["if", "then", "elif", "else", "fi", "for", "while", "until", "do", "done", "case", "esac", "function", "in", "select"];

pub struct KrustyHighlighter {
    snapshot: Arc<RwLock<Snapshot>>,
}

impl KrustyHighlighter {
    pub fn new(snapshot: Arc<RwLock<Snapshot>>) -> Self {
        Self { snapshot }
    }
}

impl Highlighter for KrustyHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();
        let Ok(tokens) = crate::parser::word_lexer::tokenize(line) else {
            styled.push((Style::new(), line.to_string()));
            return styled;
        };

        let snapshot = self.snapshot.read().ok();
        let mut last_end = 0usize;
        for (i, token) in tokens.iter().enumerate() {
            if token.span.start > last_end && token.span.start <= line.len() {
                styled.push((Style::new(), line[last_end..token.span.start].to_string()));
            }
            styled.push((classify(token, i == 0, snapshot.as_deref()), token.text.clone()));
            last_end = token.span.end.min(line.len());
        }
        if last_end < line.len() {
            styled.push((Style::new(), line[last_end..].to_string()));
        }
        styled
    }
}

fn classify(token: &Token, is_command_position: bool, snapshot: Option<&Snapshot>) -> Style {
    match token.kind {
        TokenKind::String(_) => Style::new().fg(Color::Green),
        TokenKind::Operator => Style::new().fg(Color::White),
        TokenKind::Word => classify_word(&token.text, is_command_position, snapshot),
    }
}

fn classify_word(text: &str, is_command_position: bool, snapshot: Option<&Snapshot>) -> Style {
    if text.starts_with('#') {
        Style::new().fg(Color::DarkGray)
    } else if text.starts_with('$') {
        Style::new().fg(Color::Blue)
    } else if text.starts_with('-') {
        Style::new().fg(Color::Yellow)
    } else if KEYWORDS.contains(&text) {
        Style::new().fg(Color::Magenta).bold()
    } else if text.parse::<f64>().is_ok() {
        Style::new().fg(Color::Purple)
    } else if is_command_position {
        let known = snapshot.map(|s| s.builtins.iter().any(|b| b == text) || s.aliases.iter().any(|a| a == text)).unwrap_or(false);
        let style = Style::new().fg(Color::Cyan);
        if known {
            style.bold()
        } else {
            style
        }
    } else if text.contains('/') || text.starts_with('~') {
        Style::new().fg(Color::LightBlue)
    } else {
        Style::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_words_are_yellow() {
        assert_eq!(classify_word("--verbose", false, None), Style::new().fg(Color::Yellow));
    }

    #[test]
    fn keywords_are_bold_magenta() {
        assert_eq!(classify_word("while", false, None), Style::new().fg(Color::Magenta).bold());
    }
}
