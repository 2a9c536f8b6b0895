//! Script control-flow interpreter.
//!
//! Walks the Block AST produced by `script::parser`, executing each
//! `CommandStmt` leaf through the real chain executor (`crate::exec::chain`)
//! and implementing loop/function unwinding with `Flow`. Ported from the
//! teacher's `interpreter::control_flow`/`functions`/`errors` modules
//! (`ControlFlowError`, `ExitError`, `ErrexitError`) onto the flatter Block
//! AST: `break`/`continue`/`return` are intercepted before generic command
//! dispatch rather than modeled as their own exception types, since krusty's
//! `Flow` enum already carries that unwinding information through the
//! recursive walk.

use std::future::Future;
use std::pin::Pin;

use crate::builtins::BuiltinRegistry;
use crate::error::{KrustyError, Result};
use crate::exec::chain::run_chain;
use crate::exec::ExecResult;
use crate::expansion::glob::glob_match;
use crate::script::ast::{Block, Case, CommandStmt, For, Function, If, Statement, Until, While};
use crate::script::conditionals;
use crate::script::ast::Flow;
use crate::state::ShellState;

type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Parse and run a full script, returning the exit code of its last
/// statement. Used by the REPL driver, `source`, and `eval`.
pub async fn run_script(source: &str, state: &mut ShellState, registry: &BuiltinRegistry) -> ExecResult {
    let statements = match crate::script::parser::parse_script(source) {
        Ok(s) => s,
        Err(e) => return ExecResult::failure(e.render(source), 2),
    };

    match exec_block(&statements, state, registry).await {
        Ok(Flow::Normal(code)) | Ok(Flow::Return(code)) => {
            state.last_exit_code = code;
            ExecResult { stdout: String::new(), stderr: String::new(), exit_code: code }
        }
        Ok(Flow::Break(_)) | Ok(Flow::Continue(_)) => ExecResult::success(""),
        Err(KrustyError::Errexit(code)) => {
            state.last_exit_code = code;
            ExecResult { stdout: String::new(), stderr: String::new(), exit_code: code }
        }
        Err(e) => ExecResult::failure(e.to_string(), 1),
    }
}

/// Entry point for a function body invocation (`crate::script::functions`).
pub async fn run_block(stmts: &[Statement], state: &mut ShellState, registry: &BuiltinRegistry) -> Result<Flow> {
    exec_block(stmts, state, registry).await
}

fn exec_block<'a>(stmts: &'a [Statement], state: &'a mut ShellState, registry: &'a BuiltinRegistry) -> BoxFut<'a, Result<Flow>> {
    Box::pin(async move {
        let mut last = Flow::Normal(0);
        for stmt in stmts {
            last = exec_statement(stmt, state, registry).await?;
            if !matches!(last, Flow::Normal(_)) {
                return Ok(last);
            }
        }
        Ok(last)
    })
}

fn exec_statement<'a>(stmt: &'a Statement, state: &'a mut ShellState, registry: &'a BuiltinRegistry) -> BoxFut<'a, Result<Flow>> {
    Box::pin(async move {
        match &stmt.block {
            Block::CommandStmt(cs) => exec_command_stmt(cs, state, registry).await,
            Block::If(if_stmt) => exec_if(if_stmt, state, registry).await,
            Block::For(for_stmt) => exec_for(for_stmt, state, registry).await,
            Block::While(w) => exec_while(w, state, registry).await,
            Block::Until(u) => exec_until(u, state, registry).await,
            Block::Case(c) => exec_case(c, state, registry).await,
            Block::Function(f) => {
                register_function(f, state);
                Ok(Flow::Normal(0))
            }
        }
    })
}

fn register_function(f: &Function, state: &mut ShellState) {
    state.functions.insert(f.name.clone(), f.clone());
}

/// `break`/`continue`/`return` are script-level control-flow operators, not
/// ordinary commands; the interpreter must catch them before a generic chain
/// execution attempt would resolve `break` against the builtin registry
/// (whose `break` implementation is a no-op placeholder for the rare case it
/// runs outside the interpreter's reach, e.g. via `command break`).
fn intercept_control_flow(line: &str) -> Option<Flow> {
    let mut words = line.split_whitespace();
    let level = |rest: &mut std::str::SplitWhitespace| -> u32 {
        rest.next().and_then(|s| s.parse::<u32>().ok()).unwrap_or(1).max(1)
    };
    match words.next()? {
        "break" => Some(Flow::Break(level(&mut words))),
        "continue" => Some(Flow::Continue(level(&mut words))),
        "return" => {
            let code = words.next().and_then(|s| s.parse::<i32>().ok()).unwrap_or(0);
            Some(Flow::Return(code))
        }
        _ => None,
    }
}

async fn exec_command_stmt(cs: &CommandStmt, state: &mut ShellState, registry: &BuiltinRegistry) -> Result<Flow> {
    if let Some(flow) = intercept_control_flow(&cs.line) {
        return Ok(flow);
    }
    let result = run_chain(&cs.line, registry, state).await?;
    let code = if cs.negated {
        if result.exit_code == 0 {
            1
        } else {
            0
        }
    } else {
        result.exit_code
    };
    state.last_exit_code = code;
    Ok(Flow::Normal(code))
}

async fn exec_if(if_stmt: &If, state: &mut ShellState, registry: &BuiltinRegistry) -> Result<Flow> {
    for clause in &if_stmt.clauses {
        if eval_condition(&clause.condition, state, registry).await? {
            return exec_block(&clause.body, state, registry).await;
        }
    }
    exec_block(&if_stmt.else_body, state, registry).await
}

async fn exec_for(for_stmt: &For, state: &mut ShellState, registry: &BuiltinRegistry) -> Result<Flow> {
    let raw_words = for_stmt.words.clone().unwrap_or_else(|| state.positional.clone());
    let mut words = Vec::new();
    for raw in &raw_words {
        words.extend(crate::expansion::expand_word(raw, state).await?);
    }

    for word in words {
        state.environment.insert(for_stmt.variable.clone(), word);
        match exec_block(&for_stmt.body, state, registry).await? {
            Flow::Break(n) if n > 1 => return Ok(Flow::Break(n - 1)),
            Flow::Break(_) => break,
            Flow::Continue(n) if n > 1 => return Ok(Flow::Continue(n - 1)),
            Flow::Continue(_) => continue,
            Flow::Return(code) => return Ok(Flow::Return(code)),
            Flow::Normal(_) => {}
        }
    }
    Ok(Flow::Normal(state.last_exit_code))
}

async fn exec_while(w: &While, state: &mut ShellState, registry: &BuiltinRegistry) -> Result<Flow> {
    loop {
        if !eval_condition(&w.condition, state, registry).await? {
            break;
        }
        match exec_block(&w.body, state, registry).await? {
            Flow::Break(n) if n > 1 => return Ok(Flow::Break(n - 1)),
            Flow::Break(_) => break,
            Flow::Continue(n) if n > 1 => return Ok(Flow::Continue(n - 1)),
            Flow::Continue(_) => continue,
            Flow::Return(code) => return Ok(Flow::Return(code)),
            Flow::Normal(_) => {}
        }
    }
    Ok(Flow::Normal(state.last_exit_code))
}

async fn exec_until(u: &Until, state: &mut ShellState, registry: &BuiltinRegistry) -> Result<Flow> {
    loop {
        if eval_condition(&u.condition, state, registry).await? {
            break;
        }
        match exec_block(&u.body, state, registry).await? {
            Flow::Break(n) if n > 1 => return Ok(Flow::Break(n - 1)),
            Flow::Break(_) => break,
            Flow::Continue(n) if n > 1 => return Ok(Flow::Continue(n - 1)),
            Flow::Continue(_) => continue,
            Flow::Return(code) => return Ok(Flow::Return(code)),
            Flow::Normal(_) => {}
        }
    }
    Ok(Flow::Normal(state.last_exit_code))
}

async fn exec_case(c: &Case, state: &mut ShellState, registry: &BuiltinRegistry) -> Result<Flow> {
    let expanded = crate::expansion::expand_word(&c.word, state).await?;
    let subject = expanded.join(" ");

    let mut idx = 0;
    while idx < c.items.len() {
        let item = &c.items[idx];
        let matches = item.patterns.iter().any(|p| glob_match(p, &subject));
        if !matches {
            idx += 1;
            continue;
        }
        let flow = exec_block(&item.body, state, registry).await?;
        use crate::script::ast::CaseTerminator;
        match item.terminator {
            CaseTerminator::Stop => return Ok(flow),
            CaseTerminator::FallThrough => {
                if !matches!(flow, Flow::Normal(_)) {
                    return Ok(flow);
                }
                idx += 1;
                if idx < c.items.len() {
                    return exec_case_from(c, idx, state, registry).await;
                }
                return Ok(flow);
            }
            CaseTerminator::FallTest => {
                if !matches!(flow, Flow::Normal(_)) {
                    return Ok(flow);
                }
                idx += 1;
            }
        }
    }
    Ok(Flow::Normal(0))
}

/// Re-enter `exec_case`'s pattern loop at `start_idx` unconditionally
/// (`;&` semantics: run the next body without testing its patterns).
fn exec_case_from<'a>(c: &'a Case, start_idx: usize, state: &'a mut ShellState, registry: &'a BuiltinRegistry) -> BoxFut<'a, Result<Flow>> {
    Box::pin(async move {
        use crate::script::ast::CaseTerminator;
        let item = &c.items[start_idx];
        let flow = exec_block(&item.body, state, registry).await?;
        match item.terminator {
            CaseTerminator::Stop | CaseTerminator::FallTest => Ok(flow),
            CaseTerminator::FallThrough => {
                if !matches!(flow, Flow::Normal(_)) || start_idx + 1 >= c.items.len() {
                    return Ok(flow);
                }
                exec_case_from(c, start_idx + 1, state, registry).await
            }
        }
    })
}

async fn eval_condition(cond: &CommandStmt, state: &mut ShellState, registry: &BuiltinRegistry) -> Result<bool> {
    let tokens = crate::parser::word_lexer::tokenize(&cond.line).unwrap_or_default();
    let words: Vec<String> = tokens
        .iter()
        .filter(|t| t.kind != crate::ast::TokenKind::Operator)
        .map(|t| t.text.clone())
        .collect();

    let outcome = if words.first().map(String::as_str) == Some("[") {
        let args = strip_brackets(&words, "]");
        let expanded = crate::expansion::expand_args(&args, state).await?;
        conditionals::evaluate_test(&expanded).map_err(|e| KrustyError::Parse { message: e.to_string(), index: 0 })?
    } else if words.first().map(String::as_str) == Some("[[") {
        let args = strip_brackets(&words, "]]");
        let expanded = crate::expansion::expand_args(&args, state).await?;
        conditionals::evaluate_extended(&expanded).map_err(|e| KrustyError::Parse { message: e.to_string(), index: 0 })?
    } else {
        let result = run_chain(&cond.line, registry, state).await?;
        result.is_success()
    };

    Ok(if cond.negated { !outcome } else { outcome })
}

fn strip_brackets(words: &[String], closer: &str) -> Vec<String> {
    let mut rest = &words[1.min(words.len())..];
    if rest.last().map(String::as_str) == Some(closer) {
        rest = &rest[..rest.len() - 1];
    }
    rest.to_vec()
}
