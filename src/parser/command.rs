//! Pipeline/chain splitter and command builder.
//!
//! Two layers, both operating on the tokenizer's token stream so that `;`,
//! `&&`, `||`, `&`, and `|` inside quotes or `$(...)`/`${...}` never get
//! mistaken for chain/pipeline operators:
//!
//! 1. [`split_chain`] splits a command line into pipeline segments joined by
//!    `;`, `&&`, `||`, or `&` (background). `crate::exec::chain` walks the
//!    result applying short-circuit semantics.
//! 2. [`parse_pipeline`] splits one such segment into its `|`-joined stages
//!    and builds a [`crate::ast::Command`] per stage via
//!    `crate::parser::redirection`.

use crate::ast::{Command, ParseError, ParsedLine, Token, TokenKind};
use crate::parser::redirection::extract_redirections;
use crate::parser::word_lexer::tokenize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOp {
    And,
    Or,
    Seq,
    Background,
    End,
}

#[derive(Debug, Clone)]
pub struct ChainLink {
    pub text: String,
    pub op: ChainOp,
}

/// Split `line` into pipeline segments joined by `;`, `&&`, `||`, `&`, or
/// newline, all of which are only recognized at depth zero (the tokenizer
/// already keeps quoted/substituted text opaque).
pub fn split_chain(line: &str) -> Result<Vec<ChainLink>, ParseError> {
    let tokens = tokenize(line).map_err(|e| ParseError { message: e, index: line.len() })?;
    let mut links = Vec::new();
    let mut seg_start = 0usize;
    let mut last_end = 0usize;
    let mut saw_any = false;

    for (idx, t) in tokens.iter().enumerate() {
        if t.kind != TokenKind::Operator {
            last_end = t.span.end;
            continue;
        }
        let op = match t.text.as_str() {
            "&&" => Some(ChainOp::And),
            "||" => Some(ChainOp::Or),
            ";" | "\n" => Some(ChainOp::Seq),
            "&" => Some(ChainOp::Background),
            _ => None,
        };
        let Some(op) = op else {
            last_end = t.span.end;
            continue;
        };
        let segment = line[seg_start..last_end].trim().to_string();
        if !segment.is_empty() {
            links.push(ChainLink { text: segment, op });
            saw_any = true;
        }
        seg_start = t.span.end;
        last_end = t.span.end;
        let _ = idx;
    }

    let tail = line[seg_start..].trim().to_string();
    if !tail.is_empty() {
        links.push(ChainLink { text: tail, op: ChainOp::End });
    } else if saw_any {
        if let Some(last) = links.last_mut() {
            if last.op == ChainOp::Background {
                // trailing `&` with nothing after: keep background flag on
                // the final emitted segment, no synthetic empty tail.
            } else {
                last.op = ChainOp::End;
            }
        }
    }

    Ok(links)
}

/// Parse one pipeline segment (no top-level `;`/`&&`/`||`/`&`) into a
/// [`ParsedLine`] of `|`-joined [`Command`]s.
pub fn parse_pipeline(segment: &str) -> Result<ParsedLine, ParseError> {
    let tokens = tokenize(segment).map_err(|e| ParseError { message: e, index: segment.len() })?;

    let mut background = false;
    let mut effective = tokens.as_slice();
    if let Some(last) = effective.last() {
        if last.kind == TokenKind::Operator && last.text == "&" {
            background = true;
            effective = &effective[..effective.len() - 1];
        }
    }

    let stages = split_on_pipe(effective);
    let mut commands = Vec::with_capacity(stages.len());
    for stage in stages {
        if stage.is_empty() {
            return Err(ParseError { message: "unexpected token near `|`".to_string(), index: segment.len() });
        }
        commands.push(build_command(&stage, segment)?);
    }

    if commands.is_empty() {
        return Err(ParseError { message: "empty command".to_string(), index: 0 });
    }

    Ok(ParsedLine { commands, background })
}

fn split_on_pipe(tokens: &[Token]) -> Vec<Vec<Token>> {
    let mut stages = Vec::new();
    let mut current = Vec::new();
    for t in tokens {
        if t.kind == TokenKind::Operator && t.text == "|" {
            stages.push(std::mem::take(&mut current));
        } else {
            current.push(t.clone());
        }
    }
    stages.push(current);
    stages
}

fn build_command(tokens: &[Token], raw_source: &str) -> Result<Command, ParseError> {
    let extracted = extract_redirections(tokens);
    let Some((name, rest)) = extracted.args.split_first() else {
        return Err(ParseError { message: "expected command name".to_string(), index: 0 });
    };
    let start = tokens.first().map(|t| t.span.start).unwrap_or(0);
    let end = tokens.last().map(|t| t.span.end).unwrap_or(raw_source.len());
    Ok(Command {
        name: name.clone(),
        args: rest.to_vec(),
        raw: raw_source[start.min(raw_source.len())..end.min(raw_source.len())].to_string(),
        background: false,
        original_args: rest.to_vec(),
        stdin_file: None,
        redirections: extracted.redirections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_chain() {
        let links = split_chain("make && make test").unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].op, ChainOp::And);
        assert_eq!(links[1].op, ChainOp::End);
        assert_eq!(links[0].text, "make");
        assert_eq!(links[1].text, "make test");
    }

    #[test]
    fn splits_or_and_seq() {
        let links = split_chain("a || b; c").unwrap();
        assert_eq!(links[0].op, ChainOp::Or);
        assert_eq!(links[1].op, ChainOp::Seq);
        assert_eq!(links[2].op, ChainOp::End);
    }

    #[test]
    fn semicolon_inside_command_substitution_is_not_a_boundary() {
        let links = split_chain("echo $(a; b)").unwrap();
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn background_marker_detected() {
        let links = split_chain("sleep 5 &").unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].op, ChainOp::Background);
    }

    #[test]
    fn parse_pipeline_two_stages() {
        let parsed = parse_pipeline("cat file | grep foo").unwrap();
        assert_eq!(parsed.commands.len(), 2);
        assert_eq!(parsed.commands[0].name, "cat");
        assert_eq!(parsed.commands[1].name, "grep");
    }

    #[test]
    fn parse_pipeline_background() {
        let parsed = parse_pipeline("sleep 5 &").unwrap();
        assert!(parsed.background);
        assert_eq!(parsed.commands.len(), 1);
    }

    #[test]
    fn parse_pipeline_with_redirection() {
        let parsed = parse_pipeline("echo hi > out.txt").unwrap();
        assert_eq!(parsed.commands[0].redirections.len(), 1);
        assert_eq!(parsed.commands[0].args, vec!["hi"]);
    }
}
