//! Command chain executor.
//!
//! Re-splits on `&&`/`||`/`;`/newline at depth zero (`crate::parser::command`)
//! and short-circuits per the previous link's exit status: an `&&`-joined
//! link only runs if the previous one succeeded, an `||`-joined link only if
//! it failed; `;` and backgrounded (`&`) links always run. Backgrounded
//! pipelines are registered with the job manager and not waited on.

use crate::ast::{Token, TokenKind};
use crate::builtins::BuiltinRegistry;
use crate::error::{KrustyError, Result};
use crate::exec::pipeline::run_pipeline;
use crate::exec::ExecResult;
use crate::parser::command::{parse_pipeline, split_chain, ChainOp};
use crate::state::ShellState;

pub async fn run_chain(line: &str, registry: &BuiltinRegistry, state: &mut ShellState) -> Result<ExecResult> {
    let links = split_chain(line).map_err(|e| KrustyError::Parse { message: e.message, index: e.index })?;
    let mut last = ExecResult::success("");
    let mut prev_op = ChainOp::Seq;

    for link in &links {
        let should_run = match prev_op {
            ChainOp::And => last.is_success(),
            ChainOp::Or => !last.is_success(),
            _ => true,
        };
        prev_op = link.op;
        if !should_run {
            continue;
        }

        let mut parsed = parse_pipeline(&link.text).map_err(|e| KrustyError::Parse { message: e.message, index: e.index })?;
        for cmd in &mut parsed.commands {
            expand_alias(cmd, state);
            expand_words(cmd, state).await?;
        }

        let background = parsed.background || link.op == ChainOp::Background;
        let outcome = run_pipeline(&parsed.commands, background, registry, state).await?;

        if background {
            if let Some(pgid) = outcome.pgid {
                let id = state.next_job_id();
                state.jobs.add(id, pgid, link.text.clone(), true);
                tracing::debug!(job_id = id, "backgrounded pipeline");
            }
            last = ExecResult::success("");
        } else {
            last = outcome.result;
        }

        state.last_exit_code = last.exit_code;
        if state.options.errexit && !last.is_success() && !background && is_errexit_checkpoint(link.op) {
            return Err(KrustyError::Errexit(last.exit_code));
        }
    }

    Ok(last)
}

/// `set -e` only fires for a command that is the final element of an
/// `&&`/`||` list: a link whose trailing operator is `And`/`Or` is not a
/// checkpoint, since its failure is itself part of the chain's control flow.
fn is_errexit_checkpoint(trailing_op: ChainOp) -> bool {
    !matches!(trailing_op, ChainOp::And | ChainOp::Or)
}

fn expand_alias(cmd: &mut crate::ast::Command, state: &ShellState) {
    if let Some(Ok(expanded)) = state.aliases.expand(&cmd.name, &cmd.args) {
        let words = words_from(&expanded);
        if let Some((name, rest)) = words.split_first() {
            cmd.name = name.clone();
            cmd.args = rest.to_vec();
            cmd.original_args = rest.to_vec();
        }
    }
}

async fn expand_words(cmd: &mut crate::ast::Command, state: &mut ShellState) -> Result<()> {
    let mut expanded_name = crate::expansion::expand_word(&cmd.name, state).await?;
    if let Some(first) = expanded_name.drain(..).next() {
        cmd.name = first;
    }
    cmd.args = crate::expansion::expand_args(&cmd.args, state).await?;
    cmd.original_args = cmd.args.clone();
    Ok(())
}

fn words_from(text: &str) -> Vec<String> {
    match crate::parser::word_lexer::tokenize(text) {
        Ok(tokens) => tokens.into_iter().filter(|t: &Token| t.kind != TokenKind::Operator).map(|t| t.text).collect(),
        Err(_) => text.split_whitespace().map(str::to_string).collect(),
    }
}
