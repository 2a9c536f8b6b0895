//! Expansion engine.
//!
//! Expansion runs in bash's documented order: brace expansion, then
//! parameter/command/arithmetic substitution (interleaved, since `${...}`
//! bodies can themselves contain `$(...)`), then field splitting on `$IFS`,
//! then pathname (glob) expansion. Quote removal happens last, implicitly,
//! by only field-splitting and globbing the unquoted spans the substitution
//! pass marked in its returned bitmap.

pub mod arithmetic;
pub mod brace;
pub mod cache;
pub mod command_subst;
pub mod glob;
pub mod param;
pub mod process_subst;

use crate::state::ShellState;

#[derive(Debug, thiserror::Error)]
pub enum ExpansionError {
    #[error(transparent)]
    Arith(#[from] arithmetic::ArithError),
    #[error("{0}: unbound variable")]
    UnboundVariable(String),
    #[error("bad substitution: {0}")]
    BadSubstitution(String),
    #[error("command substitution of \"{0}\" blocked by sandbox policy")]
    SandboxDenied(String),
    #[error("{0}")]
    Unsupported(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Expand one raw word into zero or more resulting words, per bash's
/// brace -> substitute -> split -> glob pipeline.
pub async fn expand_word(raw: &str, state: &mut ShellState) -> Result<Vec<String>, ExpansionError> {
    let mut out = Vec::new();
    for braced in brace::expand(raw) {
        let substituted = expand_one(&braced, state).await?;
        out.extend(substituted);
    }
    Ok(out)
}

/// Expand a full argv, flattening each word's possibly-multiple results.
pub async fn expand_args(raw_words: &[String], state: &mut ShellState) -> Result<Vec<String>, ExpansionError> {
    let mut out = Vec::new();
    for raw in raw_words {
        out.extend(expand_word(raw, state).await?);
    }
    Ok(out)
}

async fn expand_one(braced: &str, state: &mut ShellState) -> Result<Vec<String>, ExpansionError> {
    if process_subst::is_process_substitution(braced) {
        return Ok(vec![process_subst::expand(braced, state).await?]);
    }

    let (tilde_expanded, tilde_was_quoted) = expand_tilde(braced, state);
    let (substituted, mask) = param::substitute(&tilde_expanded, state).await?;

    let fully_quoted = tilde_was_quoted || braced.starts_with('"') || braced.starts_with('\'');
    if fully_quoted {
        return Ok(vec![substituted]);
    }

    let fields = split_fields(&substituted, &mask, state);
    let mut results = Vec::new();
    for field in fields {
        if state.options.noglob || !glob::has_glob_chars(&field) {
            results.push(field);
            continue;
        }
        results.extend(glob::expand_glob(&field, &state.cwd));
    }
    Ok(results)
}

/// Unquoted leading `~` and `~user` expand to the owner's home directory;
/// krusty only resolves the invoking user's own `$HOME`, matching the
/// teacher's sandboxed filesystem view rather than shelling out to `getent`.
fn expand_tilde(word: &str, state: &ShellState) -> (String, bool) {
    if let Some(rest) = word.strip_prefix('~') {
        if rest.is_empty() || rest.starts_with('/') {
            let home = state.env_or("HOME", "/root");
            return (format!("{home}{rest}"), false);
        }
    }
    (word.to_string(), false)
}

/// Split `text` on `$IFS` at positions the quote bitmap marks as unquoted.
/// `mask[i]` is `true` when `text`'s i-th byte originated inside quotes in
/// the source word, so splitting (and later globbing) must skip it. Results
/// are cached on `(text, mask, ifs)`, since the same already-substituted
/// text reappears often in loops over a fixed word list.
fn split_fields(text: &str, mask: &[bool], state: &mut ShellState) -> Vec<String> {
    let ifs_str = state.environment.get("IFS").cloned().unwrap_or_else(|| " \t\n".to_string());
    let key = (text.to_string(), mask.to_vec(), ifs_str.clone());
    if let Some(cached) = state.expansion_caches.arg_split.get(&key) {
        return cached.clone();
    }

    let ifs: Vec<char> = ifs_str.chars().collect();
    let chars: Vec<char> = text.chars().collect();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut any_content = false;

    for (i, &c) in chars.iter().enumerate() {
        let quoted = mask.get(i).copied().unwrap_or(false);
        if !quoted && ifs.contains(&c) {
            if !current.is_empty() || any_content {
                fields.push(std::mem::take(&mut current));
            }
            any_content = false;
            continue;
        }
        current.push(c);
        any_content = true;
    }
    if any_content || !current.is_empty() {
        fields.push(current);
    }
    if fields.is_empty() {
        fields.push(String::new());
    }

    state.expansion_caches.arg_split.put(key, fields.clone());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn state() -> ShellState {
        let mut env = HashMap::new();
        env.insert("HOME".to_string(), "/home/krusty".to_string());
        ShellState::new(std::path::PathBuf::from("/tmp"), env)
    }

    #[tokio::test]
    async fn expands_tilde_at_start() {
        let mut st = state();
        let words = expand_word("~/src", &mut st).await.unwrap();
        assert_eq!(words, vec!["/home/krusty/src"]);
    }

    #[tokio::test]
    async fn splits_unquoted_fields_on_whitespace() {
        let mut st = state();
        let words = expand_word("a b  c", &mut st).await.unwrap();
        assert_eq!(words, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn double_quoted_word_is_not_field_split() {
        let mut st = state();
        let words = expand_word("\"a b c\"", &mut st).await.unwrap();
        assert_eq!(words, vec!["a b c"]);
    }

    #[tokio::test]
    async fn brace_expansion_runs_before_substitution() {
        let mut st = state();
        let mut words = expand_word("file{1,2}", &mut st).await.unwrap();
        words.sort();
        assert_eq!(words, vec!["file1", "file2"]);
    }

    #[tokio::test]
    async fn combines_brace_and_field_results() {
        let mut st = state();
        let words = expand_word("{a,b} c", &mut st).await.unwrap();
        assert_eq!(words, vec!["a", "c", "b", "c"]);
    }

    #[tokio::test]
    async fn repeated_split_reuses_the_cached_fields() {
        let mut st = state();
        let _ = expand_word("a b  c", &mut st).await.unwrap();
        let before = st.expansion_caches.arg_split.len();
        let _ = expand_word("a b  c", &mut st).await.unwrap();
        assert_eq!(st.expansion_caches.arg_split.len(), before);
    }
}
