//! Process substitution `<(cmd)` / `>(cmd)`.
//!
//! Input-direction `<(cmd)` materializes the inner command's output through a
//! temp file rather than a true anonymous pipe, since krusty's executor is
//! `tokio::process`-based, not raw `fork`/`pipe`; the caller sees a path it
//! can open for reading once `expand` returns. Output-direction `>(cmd)`
//! would need the reverse — a path callers write into, streamed to `cmd`'s
//! stdin as it arrives — which needs a real FIFO and a background reader
//! krusty's buffered pipeline relay doesn't have a stage for yet, so it's a
//! hard error rather than a temp path that silently discards what's written.

use std::io::Write;

use crate::expansion::{command_subst, ExpansionError};
use crate::state::ShellState;

pub async fn expand(arg: &str, state: &mut ShellState) -> Result<String, ExpansionError> {
    if let Some(script) = arg.strip_prefix("<(").and_then(|s| s.strip_suffix(')')) {
        let output = command_subst::run(script, state).await?;
        let path = write_temp(&output)?;
        return Ok(path);
    }
    if arg.strip_prefix(">(").and_then(|s| s.strip_suffix(')')).is_some() {
        return Err(ExpansionError::Unsupported(format!("output-direction process substitution {arg} is not supported")));
    }
    Ok(arg.to_string())
}

pub fn is_process_substitution(arg: &str) -> bool {
    (arg.starts_with("<(") || arg.starts_with(">(")) && arg.ends_with(')')
}

fn write_temp(content: &str) -> Result<String, ExpansionError> {
    let mut path = std::env::temp_dir();
    let unique = format!("krusty-procsubst-{}-{}", std::process::id(), path.as_os_str().len());
    path.push(unique);
    let mut file = std::fs::File::create(&path).map_err(ExpansionError::Io)?;
    file.write_all(content.as_bytes()).map_err(ExpansionError::Io)?;
    Ok(path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn detects_process_substitution_syntax() {
        assert!(is_process_substitution("<(echo hi)"));
        assert!(is_process_substitution(">(cat)"));
        assert!(!is_process_substitution("echo hi"));
    }

    #[tokio::test]
    async fn expand_input_direction_writes_temp_file() {
        let mut state = ShellState::new(std::env::temp_dir(), HashMap::new());
        let path = expand("<(echo hi)", &mut state).await.unwrap();
        assert!(std::path::Path::new(&path).exists());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn expand_output_direction_is_a_hard_error() {
        let mut state = ShellState::new(std::env::temp_dir(), HashMap::new());
        let err = expand(">(cat)", &mut state).await.unwrap_err();
        assert!(matches!(err, ExpansionError::Unsupported(_)));
    }
}
