//! Script parser: control-flow preprocessing + recursive-descent Block AST
//! builder.
//!
//! Preprocessing strips comments, joins `\`-continuation lines, and splits
//! semicolon lists into physical statements (except when the whole line is a
//! single-line function body, e.g. `greet() { echo hi; }`). The builder then
//! walks a word/operator token stream (reusing the component-A tokenizer)
//! recognizing reserved words only when they start a statement, so ordinary
//! arguments named `if`/`do`/etc. never get mistaken for control flow.
//!
//! Leaf commands are *not* re-parsed here: a `CommandStmt` simply carries the
//! raw source text of its segment, which `crate::exec::chain` parses with the
//! full §4.D pipeline/chain splitter at execution time. This mirrors the
//! teacher's split between grammar recognition (parser/) and word-level
//! command construction (parser/command_parser.rs).

use crate::ast::{ParseError, Token as LexToken, TokenKind as LexKind};
use crate::parser::word_lexer::tokenize;
use crate::script::ast::*;

const KEYWORDS: &[&str] = &[
    "if", "then", "elif", "else", "fi", "for", "while", "until", "do", "done", "case", "esac",
    "in", "function", "esac",
];

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

/// Strip `#`-to-EOL comments outside quotes, join backslash-newline
/// continuations. Does not split semicolons — that happens token-side.
pub fn preprocess(script: &str) -> String {
    let mut out = String::with_capacity(script.len());
    let mut chars = script.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' if !in_single => {
                if chars.peek() == Some(&'\n') {
                    chars.next(); // swallow the continuation entirely
                    continue;
                }
                out.push(c);
                if let Some(&next) = chars.peek() {
                    out.push(next);
                    chars.next();
                }
            }
            '\'' if !in_double => {
                in_single = !in_single;
                out.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                out.push(c);
            }
            '#' if !in_single && !in_double => {
                // Only a comment if at start of word (preceded by whitespace/start/operator).
                let prev_ok = out
                    .chars()
                    .last()
                    .map(|p| p.is_whitespace() || "|&;()<>".contains(p))
                    .unwrap_or(true);
                if prev_ok {
                    while let Some(&n) = chars.peek() {
                        if n == '\n' {
                            break;
                        }
                        chars.next();
                    }
                } else {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

struct Cursor {
    tokens: Vec<LexToken>,
    pos: usize,
}

impl Cursor {
    fn peek(&self) -> Option<&LexToken> {
        self.tokens.get(self.pos)
    }

    fn peek_word(&self) -> Option<&str> {
        self.peek().filter(|t| t.kind == LexKind::Word).map(|t| t.text.as_str())
    }

    fn at_keyword(&self, kw: &str) -> bool {
        self.peek_word() == Some(kw)
    }

    fn advance(&mut self) -> Option<LexToken> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn skip_separators(&mut self) {
        while let Some(t) = self.peek() {
            if t.kind == LexKind::Operator && (t.text == ";" || t.text == "\n") {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}

pub fn parse_script(script: &str) -> Result<Vec<Statement>, ParseError> {
    let preprocessed = preprocess(script);
    let tokens = tokenize(&preprocessed).map_err(|e| ParseError { message: e, index: preprocessed.len() })?;
    let mut cur = Cursor { tokens, pos: 0 };
    let stmts = parse_statement_list(&mut cur, &[])?;
    cur.skip_separators();
    if !cur.eof() {
        return Err(ParseError {
            message: format!("unexpected token near '{}'", cur.peek().map(|t| t.text.as_str()).unwrap_or("")),
            index: preprocessed.len(),
        });
    }
    Ok(stmts)
}

/// Parse statements until EOF or one of `terminators` is the next keyword.
fn parse_statement_list(cur: &mut Cursor, terminators: &[&str]) -> Result<Vec<Statement>, ParseError> {
    let mut stmts = Vec::new();
    loop {
        cur.skip_separators();
        if cur.eof() {
            break;
        }
        if let Some(word) = cur.peek_word() {
            if terminators.contains(&word) {
                break;
            }
        }
        let stmt = parse_statement(cur)?;
        stmts.push(stmt);
    }
    Ok(stmts)
}

fn parse_statement(cur: &mut Cursor) -> Result<Statement, ParseError> {
    if cur.at_keyword("if") {
        return Ok(Statement { block: Block::If(parse_if(cur)?) });
    }
    if cur.at_keyword("for") {
        return Ok(Statement { block: Block::For(parse_for(cur)?) });
    }
    if cur.at_keyword("while") {
        return Ok(Statement { block: Block::While(parse_while(cur)?) });
    }
    if cur.at_keyword("until") {
        return Ok(Statement { block: Block::Until(parse_until(cur)?) });
    }
    if cur.at_keyword("case") {
        return Ok(Statement { block: Block::Case(parse_case(cur)?) });
    }
    if cur.at_keyword("function") || is_function_def(cur) {
        return Ok(Statement { block: Block::Function(parse_function(cur)?) });
    }
    Ok(Statement { block: Block::CommandStmt(parse_command_stmt(cur)?) })
}

fn is_function_def(cur: &Cursor) -> bool {
    // `name ( ) {` without the `function` keyword.
    let t0 = cur.tokens.get(cur.pos);
    let t1 = cur.tokens.get(cur.pos + 1);
    let t2 = cur.tokens.get(cur.pos + 2);
    matches!(
        (t0, t1, t2),
        (Some(a), Some(b), Some(c))
            if a.kind == LexKind::Word
                && !is_keyword(&a.text)
                && b.kind == LexKind::Operator
                && b.text == "("
                && c.kind == LexKind::Operator
                && c.text == ")"
    )
}

/// Consume raw tokens up to (not including) the next statement separator at
/// depth zero, joining their original text. Used to build `CommandStmt.line`.
fn consume_raw_segment(cur: &mut Cursor) -> (String, bool) {
    let mut words = Vec::new();
    let mut negated = false;
    let mut first = true;
    let mut depth = 0i32;
    loop {
        let Some(t) = cur.peek() else { break };
        if depth == 0 && t.kind == LexKind::Operator && matches!(t.text.as_str(), ";" | "\n") {
            break;
        }
        if depth == 0 && t.kind == LexKind::Word && is_keyword(&t.text) && !first {
            break;
        }
        if t.kind == LexKind::Operator {
            match t.text.as_str() {
                "(" | "{" => depth += 1,
                ")" | "}" => depth -= 1,
                _ => {}
            }
        }
        if first && t.kind == LexKind::Word && t.text == "!" {
            negated = true;
            cur.advance();
            first = false;
            continue;
        }
        words.push(render_token(t));
        cur.advance();
        first = false;
    }
    (words.join(" "), negated)
}

fn render_token(t: &LexToken) -> String {
    match t.kind {
        LexKind::String('\'') => format!("'{}'", t.text),
        LexKind::String('"') => format!("\"{}\"", t.text),
        _ => t.text.clone(),
    }
}

fn parse_command_stmt(cur: &mut Cursor) -> Result<CommandStmt, ParseError> {
    let (line, negated) = consume_raw_segment(cur);
    Ok(CommandStmt { line, negated })
}

fn expect_keyword(cur: &mut Cursor, kw: &str) -> Result<(), ParseError> {
    if cur.at_keyword(kw) {
        cur.advance();
        Ok(())
    } else {
        Err(ParseError {
            message: format!("expected `{}`, found `{}`", kw, cur.peek_word().unwrap_or("EOF")),
            index: cur.peek().map(|t| t.span.start).unwrap_or(0),
        })
    }
}

fn parse_if(cur: &mut Cursor) -> Result<If, ParseError> {
    expect_keyword(cur, "if")?;
    let mut clauses = Vec::new();
    loop {
        let condition = parse_command_stmt(cur)?;
        cur.skip_separators();
        expect_keyword(cur, "then")?;
        let body = parse_statement_list(cur, &["elif", "else", "fi"])?;
        clauses.push(IfClause { condition, body });
        if cur.at_keyword("elif") {
            cur.advance();
            continue;
        }
        break;
    }
    let else_body = if cur.at_keyword("else") {
        cur.advance();
        parse_statement_list(cur, &["fi"])?
    } else {
        Vec::new()
    };
    expect_keyword(cur, "fi")?;
    Ok(If { clauses, else_body })
}

fn parse_for(cur: &mut Cursor) -> Result<For, ParseError> {
    expect_keyword(cur, "for")?;
    let variable = cur
        .advance()
        .map(|t| t.text)
        .ok_or_else(|| ParseError { message: "expected loop variable after `for`".into(), index: 0 })?;
    cur.skip_separators();
    let words = if cur.at_keyword("in") {
        cur.advance();
        let mut words = Vec::new();
        while let Some(t) = cur.peek() {
            if t.kind == LexKind::Operator && (t.text == ";" || t.text == "\n") {
                break;
            }
            words.push(render_token(t));
            cur.advance();
        }
        Some(words)
    } else {
        None
    };
    cur.skip_separators();
    expect_keyword(cur, "do")?;
    let body = parse_statement_list(cur, &["done"])?;
    expect_keyword(cur, "done")?;
    Ok(For { variable, words, body })
}

fn parse_while(cur: &mut Cursor) -> Result<While, ParseError> {
    expect_keyword(cur, "while")?;
    let condition = parse_command_stmt(cur)?;
    cur.skip_separators();
    expect_keyword(cur, "do")?;
    let body = parse_statement_list(cur, &["done"])?;
    expect_keyword(cur, "done")?;
    Ok(While { condition, body })
}

fn parse_until(cur: &mut Cursor) -> Result<Until, ParseError> {
    expect_keyword(cur, "until")?;
    let condition = parse_command_stmt(cur)?;
    cur.skip_separators();
    expect_keyword(cur, "do")?;
    let body = parse_statement_list(cur, &["done"])?;
    expect_keyword(cur, "done")?;
    Ok(Until { condition, body })
}

fn parse_case(cur: &mut Cursor) -> Result<Case, ParseError> {
    expect_keyword(cur, "case")?;
    let word = cur.advance().map(|t| render_token(&t)).unwrap_or_default();
    cur.skip_separators();
    expect_keyword(cur, "in")?;
    cur.skip_separators();
    let mut items = Vec::new();
    while !cur.at_keyword("esac") && !cur.eof() {
        // optional leading `(`
        if matches!(cur.peek(), Some(t) if t.kind == LexKind::Operator && t.text == "(") {
            cur.advance();
        }
        let mut patterns = vec![cur.advance().map(|t| render_token(&t)).unwrap_or_default()];
        while matches!(cur.peek(), Some(t) if t.kind == LexKind::Operator && t.text == "|") {
            cur.advance();
            patterns.push(cur.advance().map(|t| render_token(&t)).unwrap_or_default());
        }
        if matches!(cur.peek(), Some(t) if t.kind == LexKind::Operator && t.text == ")") {
            cur.advance();
        }
        let body = parse_statement_list(cur, &["esac"])?;
        // Re-check trailing terminator token, if the lexer preserved it as an operator.
        let terminator = consume_case_terminator(cur);
        items.push(CaseItem { patterns, body, terminator });
        cur.skip_separators();
    }
    expect_keyword(cur, "esac")?;
    Ok(Case { word, items })
}

fn consume_case_terminator(cur: &mut Cursor) -> CaseTerminator {
    match cur.peek() {
        Some(t) if t.kind == LexKind::Operator && t.text == ";;" => {
            cur.advance();
            CaseTerminator::Stop
        }
        Some(t) if t.kind == LexKind::Operator && t.text == ";&" => {
            cur.advance();
            CaseTerminator::FallThrough
        }
        Some(t) if t.kind == LexKind::Operator && t.text == ";;&" => {
            cur.advance();
            CaseTerminator::FallTest
        }
        _ => CaseTerminator::Stop,
    }
}

fn parse_function(cur: &mut Cursor) -> Result<Function, ParseError> {
    if cur.at_keyword("function") {
        cur.advance();
    }
    let name = cur
        .advance()
        .map(|t| t.text)
        .ok_or_else(|| ParseError { message: "expected function name".into(), index: 0 })?;
    // optional `()`
    if matches!(cur.peek(), Some(t) if t.kind == LexKind::Operator && t.text == "(") {
        cur.advance();
        if matches!(cur.peek(), Some(t) if t.kind == LexKind::Operator && t.text == ")") {
            cur.advance();
        }
    }
    cur.skip_separators();
    if matches!(cur.peek(), Some(t) if t.kind == LexKind::Operator && t.text == "{") {
        cur.advance();
    } else {
        return Err(ParseError { message: format!("expected `{{` in function `{}`", name), index: 0 });
    }
    let body = parse_statement_list(cur, &[])?;
    cur.skip_separators();
    if matches!(cur.peek(), Some(t) if t.kind == LexKind::Operator && t.text == "}") {
        cur.advance();
    } else {
        return Err(ParseError { message: format!("expected `}}` closing function `{}`", name), index: 0 });
    }
    Ok(Function { name, parameters: Vec::new(), body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preprocess_strips_comment() {
        assert_eq!(preprocess("echo hi # comment"), "echo hi ");
    }

    #[test]
    fn preprocess_keeps_hash_in_word() {
        assert_eq!(preprocess("echo a#b"), "echo a#b");
    }

    #[test]
    fn preprocess_joins_continuation() {
        assert_eq!(preprocess("echo a \\\nb"), "echo a b");
    }

    #[test]
    fn parse_plain_command() {
        let stmts = parse_script("echo hello").unwrap();
        assert_eq!(stmts.len(), 1);
        match &stmts[0].block {
            Block::CommandStmt(c) => assert_eq!(c.line, "echo hello"),
            _ => panic!("expected CommandStmt"),
        }
    }

    #[test]
    fn parse_if_then_fi() {
        let stmts = parse_script("if true; then echo yes; fi").unwrap();
        assert_eq!(stmts.len(), 1);
        match &stmts[0].block {
            Block::If(i) => {
                assert_eq!(i.clauses.len(), 1);
                assert_eq!(i.clauses[0].condition.line, "true");
                assert_eq!(i.clauses[0].body.len(), 1);
            }
            _ => panic!("expected If"),
        }
    }

    #[test]
    fn parse_if_elif_else() {
        let stmts = parse_script("if false; then echo a; elif true; then echo b; else echo c; fi").unwrap();
        match &stmts[0].block {
            Block::If(i) => {
                assert_eq!(i.clauses.len(), 2);
                assert_eq!(i.else_body.len(), 1);
            }
            _ => panic!("expected If"),
        }
    }

    #[test]
    fn parse_for_loop() {
        let stmts = parse_script("for i in a b c; do echo $i; done").unwrap();
        match &stmts[0].block {
            Block::For(f) => {
                assert_eq!(f.variable, "i");
                assert_eq!(f.words.as_ref().unwrap(), &vec!["a", "b", "c"]);
            }
            _ => panic!("expected For"),
        }
    }

    #[test]
    fn parse_while_loop() {
        let stmts = parse_script("while true; do echo x; done").unwrap();
        assert!(matches!(stmts[0].block, Block::While(_)));
    }

    #[test]
    fn parse_case_statement() {
        let stmts = parse_script("case $x in a) echo a ;; b|c) echo bc ;; *) echo other ;; esac").unwrap();
        match &stmts[0].block {
            Block::Case(c) => assert_eq!(c.items.len(), 3),
            _ => panic!("expected Case"),
        }
    }

    #[test]
    fn parse_function_with_keyword() {
        let stmts = parse_script("function greet { echo hi; }").unwrap();
        match &stmts[0].block {
            Block::Function(f) => assert_eq!(f.name, "greet"),
            _ => panic!("expected Function"),
        }
    }

    #[test]
    fn parse_function_posix_style() {
        let stmts = parse_script("greet() { echo hi; }").unwrap();
        match &stmts[0].block {
            Block::Function(f) => assert_eq!(f.name, "greet"),
            _ => panic!("expected Function"),
        }
    }

    #[test]
    fn parse_negated_command() {
        let stmts = parse_script("! false").unwrap();
        match &stmts[0].block {
            Block::CommandStmt(c) => assert!(c.negated),
            _ => panic!("expected CommandStmt"),
        }
    }
}
