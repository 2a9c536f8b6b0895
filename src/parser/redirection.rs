//! Redirection extractor.
//!
//! Walks the already-tokenized words of one simple command and pulls out
//! every redirection operator (`<`, `>`, `>>`, `<<`, `<<-`, `<<<`, `>&`, `<&`,
//! `&>`, `&>>`, and fd-prefixed forms like `2>&1`), leaving the remaining
//! words as the command's `args`. Grounded on the teacher's
//! `interpreter/redirections.rs`, which does the same split at execution
//! time rather than parse time — krusty moves it earlier so `Command` always
//! carries a fully resolved `redirections: Vec<Redirection>` list.

use crate::ast::{RedirectionDirection, RedirectionType, Redirection, Token, TokenKind, APPEND_SENTINEL};

pub struct ExtractResult {
    pub args: Vec<String>,
    pub redirections: Vec<Redirection>,
    pub heredoc_delims: Vec<(String, bool)>, // (delimiter, strip_tabs) in order seen
}

pub fn extract_redirections(tokens: &[Token]) -> ExtractResult {
    let mut args = Vec::new();
    let mut redirections = Vec::new();
    let mut heredoc_delims = Vec::new();
    let mut i = 0usize;

    while i < tokens.len() {
        let t = &tokens[i];

        // fd-prefixed: a bare numeric word immediately followed by a redirect operator.
        let mut fd: Option<i32> = None;
        let mut op_index = i;
        if t.kind == TokenKind::Word && t.text.chars().all(|c| c.is_ascii_digit()) {
            if let Some(next) = tokens.get(i + 1) {
                if next.kind == TokenKind::Operator && is_redirect_op(&next.text) {
                    fd = t.text.parse().ok();
                    op_index = i + 1;
                }
            }
        }

        let op_tok = &tokens[op_index];
        if op_tok.kind == TokenKind::Operator && is_redirect_op(&op_tok.text) {
            let Some(target_tok) = tokens.get(op_index + 1) else {
                // Dangling redirection operator; treat operator text as a
                // literal arg rather than panicking the parser.
                args.push(op_tok.text.clone());
                i += 1;
                continue;
            };
            let target = target_tok.text.clone();
            let (kind, direction) = classify(&op_tok.text, fd);

            match op_tok.text.as_str() {
                "<<" | "<<-" => {
                    heredoc_delims.push((target.clone(), op_tok.text == "<<-"));
                }
                _ => {}
            }

            let stored_target = if matches!(op_tok.text.as_str(), "&>>" | ">>" ) && direction == RedirectionDirection::Both {
                format!("{}{}", APPEND_SENTINEL, target)
            } else {
                target
            };

            redirections.push(Redirection { kind, direction, target: stored_target, fd });
            i = op_index + 2;
            continue;
        }

        args.push(render(t));
        i += 1;
    }

    ExtractResult { args, redirections, heredoc_delims }
}

fn is_redirect_op(op: &str) -> bool {
    matches!(op, "<" | ">" | ">>" | "<<" | "<<-" | "<<<" | "<&" | ">&" | "<>" | ">|" | "&>" | "&>>")
}

fn classify(op: &str, fd: Option<i32>) -> (RedirectionType, RedirectionDirection) {
    match op {
        "<" => (RedirectionType::File, RedirectionDirection::Input),
        ">" | ">|" => (RedirectionType::File, RedirectionDirection::Output),
        ">>" => (RedirectionType::File, RedirectionDirection::Append),
        "<<" | "<<-" => (RedirectionType::HereDoc, RedirectionDirection::Input),
        "<<<" => (RedirectionType::HereString, RedirectionDirection::Input),
        "&>" => (RedirectionType::File, RedirectionDirection::Both),
        "&>>" => (RedirectionType::File, RedirectionDirection::Both),
        ">&" | "<&" => {
            let dir = if fd == Some(2) || op == ">&" {
                RedirectionDirection::ErrorAppend
            } else {
                RedirectionDirection::Input
            };
            (RedirectionType::Fd, dir)
        }
        "<>" => (RedirectionType::File, RedirectionDirection::Both),
        _ => (RedirectionType::File, RedirectionDirection::Output),
    }
}

fn render(t: &Token) -> String {
    match t.kind {
        TokenKind::String('\'') => t.text.clone(),
        TokenKind::String('"') => t.text.clone(),
        _ => t.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::word_lexer::tokenize;

    #[test]
    fn extracts_simple_output_redirect() {
        let toks = tokenize("echo hi > out.txt").unwrap();
        let r = extract_redirections(&toks);
        assert_eq!(r.args, vec!["echo", "hi"]);
        assert_eq!(r.redirections.len(), 1);
        assert_eq!(r.redirections[0].direction, RedirectionDirection::Output);
        assert_eq!(r.redirections[0].target, "out.txt");
    }

    #[test]
    fn extracts_fd_redirect() {
        let toks = tokenize("cmd 2> err.log").unwrap();
        let r = extract_redirections(&toks);
        assert_eq!(r.args, vec!["cmd"]);
        assert_eq!(r.redirections[0].fd, Some(2));
        assert_eq!(r.redirections[0].direction, RedirectionDirection::Output);
    }

    #[test]
    fn extracts_append() {
        let toks = tokenize("echo hi >> log.txt").unwrap();
        let r = extract_redirections(&toks);
        assert_eq!(r.redirections[0].direction, RedirectionDirection::Append);
    }

    #[test]
    fn extracts_heredoc_delimiter() {
        let toks = tokenize("cat << EOF").unwrap();
        let r = extract_redirections(&toks);
        assert_eq!(r.heredoc_delims, vec![("EOF".to_string(), false)]);
    }

    #[test]
    fn extracts_herestring() {
        let toks = tokenize("cat <<< hello").unwrap();
        let r = extract_redirections(&toks);
        assert_eq!(r.redirections[0].kind, RedirectionType::HereString);
        assert_eq!(r.redirections[0].target, "hello");
    }
}
