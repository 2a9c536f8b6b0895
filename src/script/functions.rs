//! Function call mechanics — positional-parameter save/restore around a
//! function body invocation.
//!
//! Mirrors the teacher's `interpreter::functions` save/restore of `$1..$N`
//! and adds a `local` scope frame (`ShellState::local_stack`) so `local`
//! declarations inside the body unwind on return, matching real bash dynamic
//! scoping rather than krusty's otherwise-flat environment map.

use crate::exec::ExecResult;
use crate::script::ast::{Flow, Function};
use crate::state::ShellState;

pub async fn call(function: &Function, args: &[String], state: &mut ShellState) -> crate::error::Result<ExecResult> {
    let saved_positional = std::mem::replace(&mut state.positional, args.to_vec());
    state.local_stack.push(Default::default());

    let registry = crate::builtins::BuiltinRegistry::new();
    let result = crate::script::interpreter::run_block(&function.body, state, &registry).await;

    state.pop_local_frame();
    state.positional = saved_positional;

    let code = match result {
        Ok(Flow::Normal(code)) | Ok(Flow::Return(code)) => code,
        Ok(Flow::Break(_)) | Ok(Flow::Continue(_)) => 0,
        Err(e) => return Err(e),
    };
    state.last_exit_code = code;
    Ok(ExecResult { stdout: String::new(), stderr: String::new(), exit_code: code })
}
