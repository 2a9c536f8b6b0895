//! Parameter, command, and arithmetic substitution scanner.
//!
//! A single pass over the raw word text tracks quote state and, for every
//! `$...` construct found outside single quotes, expands it in place. The
//! output carries a parallel `quoted` bitmap (one bool per output char) so
//! the caller (`expansion::mod::expand_word`) knows which spans came from a
//! quoted context and must be exempted from field splitting and globbing —
//! this mirrors how the teacher's `interpreter` keeps a `quoted` flag on
//! lexer tokens, just carried at the character granularity substitution
//! needs instead of the whole-word granularity the lexer needs.
//!
//! `substitute` recurses into itself through `${VAR:-word}`-style default
//! words (via `expand_plain`), and command substitution recurses into the
//! chain executor, which can itself contain more substitutions. `substitute`
//! is boxed (`BoxFut`) at that one cycle-closing point, the same technique
//! `script::interpreter` uses for its mutually-recursive block/statement
//! execution.

use std::future::Future;
use std::pin::Pin;

use crate::expansion::{arithmetic, command_subst, ExpansionError};
use crate::state::ShellState;

type BoxFut<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub fn substitute<'a>(raw: &'a str, state: &'a mut ShellState) -> BoxFut<'a, Result<(String, Vec<bool>), ExpansionError>> {
    Box::pin(async move {
        let chars: Vec<char> = raw.chars().collect();
        let mut out = String::new();
        let mut mask = Vec::new();
        let mut i = 0;
        let mut in_single = false;
        let mut in_double = false;

        while i < chars.len() {
            let c = chars[i];

            if in_single {
                if c == '\'' {
                    in_single = false;
                    i += 1;
                    continue;
                }
                push(&mut out, &mut mask, c, true);
                i += 1;
                continue;
            }

            match c {
                '\'' => {
                    in_single = true;
                    i += 1;
                }
                '"' => {
                    in_double = !in_double;
                    i += 1;
                }
                '\\' if i + 1 < chars.len() => {
                    let next = chars[i + 1];
                    if in_double && !matches!(next, '"' | '\\' | '$' | '`') {
                        push(&mut out, &mut mask, c, true);
                        i += 1;
                    } else {
                        push(&mut out, &mut mask, next, true);
                        i += 2;
                    }
                }
                '`' => {
                    let (script, end) = read_until(&chars, i + 1, '`');
                    let result = command_subst::run(&unescape_backticks(&script), state).await?;
                    for rc in result.chars() {
                        push(&mut out, &mut mask, rc, in_double);
                    }
                    i = end;
                }
                '$' => {
                    let (text, consumed, quoted_result) = expand_dollar(&chars, i, state, in_double).await?;
                    for rc in text.chars() {
                        push(&mut out, &mut mask, rc, in_double || quoted_result);
                    }
                    i += consumed;
                }
                _ => {
                    push(&mut out, &mut mask, c, in_double);
                    i += 1;
                }
            }
        }

        Ok((out, mask))
    })
}

fn push(out: &mut String, mask: &mut Vec<bool>, c: char, quoted: bool) {
    out.push(c);
    mask.push(quoted);
}

fn read_until(chars: &[char], start: usize, terminator: char) -> (String, usize) {
    let mut i = start;
    let mut out = String::new();
    while i < chars.len() && chars[i] != terminator {
        if chars[i] == '\\' && chars.get(i + 1).is_some() {
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    (out, (i + 1).min(chars.len()))
}

fn unescape_backticks(s: &str) -> String {
    s.to_string()
}

/// Returns (expanded text, chars consumed from `$`, force-quoted). The third
/// element lets `$(cmd)` and `$((expr))` results be treated as quoted even
/// when the `$` itself wasn't inside double quotes, since krusty performs
/// word splitting before this function returns rather than inside it for
/// those two constructs (command/arithmetic substitution results are always
/// split as a post-step, consistent with bash, so we keep them unquoted —
/// only parameter expansion respects the surrounding quote context exactly).
async fn expand_dollar(
    chars: &[char],
    at: usize,
    state: &mut ShellState,
    in_double: bool,
) -> Result<(String, usize, bool), ExpansionError> {
    let next = chars.get(at + 1).copied();

    if next == Some('(') {
        if chars.get(at + 2) == Some(&'(') {
            let (body, end) = read_balanced(chars, at + 3, '(', ')', 2);
            let vars = state.environment.clone();
            let value = arithmetic::evaluate_cached(&body, &vars, &mut state.expansion_caches.arithmetic_tokens).map_err(ExpansionError::Arith)?;
            return Ok((value.to_string(), end - at, false));
        }
        let (script, end) = read_balanced(chars, at + 2, '(', ')', 1);
        let result = command_subst::run(&script, state).await?;
        return Ok((result, end - at, false));
    }

    if next == Some('{') {
        let (body, end) = read_balanced(chars, at + 2, '{', '}', 1);
        let inner = &body[..body.len().saturating_sub(1)]; // drop trailing '}'
        let value = expand_braced_param(inner, state).await?;
        return Ok((value, end - at, false));
    }

    match next {
        Some(d) if d.is_ascii_digit() => {
            let n: usize = d.to_digit(10).unwrap() as usize;
            let value = if n == 0 { state.shell_name.clone() } else { state.positional.get(n - 1).cloned().unwrap_or_default() };
            Ok((value, 2, false))
        }
        Some('@') => Ok((state.positional.join(" "), 2, false)),
        Some('*') => {
            let ifs_sep = state.environment.get("IFS").and_then(|s| s.chars().next()).unwrap_or(' ');
            Ok((state.positional.join(&ifs_sep.to_string()), 2, in_double))
        }
        Some('#') => Ok((state.positional.len().to_string(), 2, false)),
        Some('?') => Ok((state.last_exit_code.to_string(), 2, false)),
        Some('$') => Ok((std::process::id().to_string(), 2, false)),
        Some('!') => Ok((state.jobs.current().map(|j| j.pgid.as_raw().to_string()).unwrap_or_default(), 2, false)),
        Some(c) if c.is_alphabetic() || c == '_' => {
            let start = at + 1;
            let mut end = start;
            while chars.get(end).map(|c| c.is_alphanumeric() || *c == '_').unwrap_or(false) {
                end += 1;
            }
            let name: String = chars[start..end].iter().collect();
            let value = state.environment.get(&name).cloned().unwrap_or_default();
            if state.options.nounset && !state.environment.contains_key(&name) {
                return Err(ExpansionError::UnboundVariable(name));
            }
            Ok((value, end - at, false))
        }
        _ => Ok(("$".to_string(), 1, false)),
    }
}

fn read_balanced(chars: &[char], start: usize, open: char, close: char, depth_start: i32) -> (String, usize) {
    let mut i = start;
    let mut depth = depth_start;
    let mut out = String::new();
    while i < chars.len() && depth > 0 {
        let c = chars[i];
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                out.push(c);
                i += 1;
                break;
            }
        }
        out.push(c);
        i += 1;
    }
    (out, i)
}

/// Parse and evaluate the inside of `${...}`.
async fn expand_braced_param(body: &str, state: &mut ShellState) -> Result<String, ExpansionError> {
    if let Some(name) = body.strip_prefix('#') {
        if !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            let len = state.environment.get(name).map(|v| v.chars().count()).unwrap_or(0);
            return Ok(len.to_string());
        }
    }

    let (name, rest) = split_name(body);
    let current = state.environment.get(&name).cloned();

    if rest.is_empty() {
        if state.options.nounset && current.is_none() {
            return Err(ExpansionError::UnboundVariable(name));
        }
        return Ok(current.unwrap_or_default());
    }

    if let Some(word) = rest.strip_prefix(":-") {
        return Ok(match &current {
            Some(v) if !v.is_empty() => v.clone(),
            _ => expand_plain(word, state).await?,
        });
    }
    if let Some(word) = rest.strip_prefix('-') {
        return Ok(match &current {
            Some(v) => v.clone(),
            None => expand_plain(word, state).await?,
        });
    }
    if let Some(word) = rest.strip_prefix(":=") {
        let value = match &current {
            Some(v) if !v.is_empty() => v.clone(),
            _ => expand_plain(word, state).await?,
        };
        state.environment.insert(name, value.clone());
        return Ok(value);
    }
    if let Some(word) = rest.strip_prefix(":?") {
        return match &current {
            Some(v) if !v.is_empty() => Ok(v.clone()),
            _ => Err(ExpansionError::BadSubstitution(if word.is_empty() {
                format!("{name}: parameter null or not set")
            } else {
                expand_plain(word, state).await?
            })),
        };
    }
    if let Some(word) = rest.strip_prefix(":+") {
        return Ok(match &current {
            Some(v) if !v.is_empty() => expand_plain(word, state).await?,
            _ => String::new(),
        });
    }
    if let Some(spec) = rest.strip_prefix(':') {
        let base = current.clone().unwrap_or_default();
        let mut parts = spec.splitn(2, ':');
        let offset: i64 = parts.next().unwrap_or("0").trim().parse().unwrap_or(0);
        let length: Option<i64> = parts.next().and_then(|s| s.trim().parse().ok());
        return Ok(substring(&base, offset, length));
    }
    if let Some(pat) = rest.strip_prefix("##") {
        return Ok(strip_pattern(&current.unwrap_or_default(), pat, true, true));
    }
    if let Some(pat) = rest.strip_prefix('#') {
        return Ok(strip_pattern(&current.unwrap_or_default(), pat, true, false));
    }
    if let Some(pat) = rest.strip_prefix("%%") {
        return Ok(strip_pattern(&current.unwrap_or_default(), pat, false, true));
    }
    if let Some(pat) = rest.strip_prefix('%') {
        return Ok(strip_pattern(&current.unwrap_or_default(), pat, false, false));
    }
    if let Some(spec) = rest.strip_prefix("//") {
        return Ok(replace_pattern(&current.unwrap_or_default(), spec, true));
    }
    if let Some(spec) = rest.strip_prefix('/') {
        return Ok(replace_pattern(&current.unwrap_or_default(), spec, false));
    }
    if let Some(rest2) = rest.strip_prefix("^^") {
        let _ = rest2;
        return Ok(current.unwrap_or_default().to_uppercase());
    }
    if rest.starts_with('^') {
        return Ok(capitalize_first(&current.unwrap_or_default()));
    }
    if let Some(_rest2) = rest.strip_prefix(",,") {
        return Ok(current.unwrap_or_default().to_lowercase());
    }
    if rest.starts_with(',') {
        return Ok(lowercase_first(&current.unwrap_or_default()));
    }

    Err(ExpansionError::BadSubstitution(body.to_string()))
}

async fn expand_plain(word: &str, state: &mut ShellState) -> Result<String, ExpansionError> {
    let (text, _mask) = substitute(word, state).await?;
    Ok(text)
}

fn split_name(body: &str) -> (String, String) {
    let end = body.find(|c: char| !(c.is_alphanumeric() || c == '_')).unwrap_or(body.len());
    (body[..end].to_string(), body[end..].to_string())
}

fn substring(s: &str, offset: i64, length: Option<i64>) -> String {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let start = if offset < 0 { (len + offset).max(0) } else { offset.min(len) };
    let end = match length {
        None => len,
        Some(l) if l < 0 => (len + l).max(start),
        Some(l) => (start + l).min(len),
    };
    chars[start as usize..end as usize].iter().collect()
}

fn strip_pattern(value: &str, pattern: &str, prefix: bool, greedy: bool) -> String {
    use crate::expansion::glob::glob_match;
    let chars: Vec<char> = value.chars().collect();
    if prefix {
        let range: Box<dyn Iterator<Item = usize>> =
            if greedy { Box::new((0..=chars.len()).rev()) } else { Box::new(0..=chars.len()) };
        for cut in range {
            let candidate: String = chars[..cut].iter().collect();
            if glob_match(pattern, &candidate) {
                return chars[cut..].iter().collect();
            }
        }
    } else {
        let iter: Vec<usize> = if greedy { (0..=chars.len()).collect() } else { (0..=chars.len()).rev().collect() };
        for cut in iter {
            let candidate: String = chars[cut..].iter().collect();
            if glob_match(pattern, &candidate) {
                return chars[..cut].iter().collect();
            }
        }
    }
    value.to_string()
}

fn replace_pattern(value: &str, spec: &str, all: bool) -> String {
    use crate::expansion::glob::glob_match;
    let mut parts = spec.splitn(2, '/');
    let pattern = parts.next().unwrap_or("");
    let replacement = parts.next().unwrap_or("");
    if pattern.is_empty() {
        return value.to_string();
    }
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    let mut replaced_once = false;
    while i < chars.len() {
        let mut matched_len = None;
        if !replaced_once || all {
            for end in (i..=chars.len()).rev() {
                let candidate: String = chars[i..end].iter().collect();
                if !candidate.is_empty() && glob_match(pattern, &candidate) {
                    matched_len = Some(end - i);
                    break;
                }
            }
        }
        if let Some(len) = matched_len {
            out.push_str(replacement);
            i += len;
            replaced_once = true;
            if !all {
                out.extend(&chars[i..]);
                return out;
            }
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn state_with(vars: &[(&str, &str)]) -> ShellState {
        let mut env = HashMap::new();
        for (k, v) in vars {
            env.insert(k.to_string(), v.to_string());
        }
        ShellState::new(std::env::temp_dir(), env)
    }

    #[tokio::test]
    async fn simple_variable_substitution() {
        let mut s = state_with(&[("NAME", "world")]);
        let (out, _) = substitute("hello $NAME", &mut s).await.unwrap();
        assert_eq!(out, "hello world");
    }

    #[tokio::test]
    async fn default_value_operator() {
        let mut s = state_with(&[]);
        let (out, _) = substitute("${MISSING:-fallback}", &mut s).await.unwrap();
        assert_eq!(out, "fallback");
    }

    #[tokio::test]
    async fn assign_default_operator_mutates_env() {
        let mut s = state_with(&[]);
        let (out, _) = substitute("${X:=set}", &mut s).await.unwrap();
        assert_eq!(out, "set");
        assert_eq!(s.environment.get("X").unwrap(), "set");
    }

    #[tokio::test]
    async fn length_operator() {
        let mut s = state_with(&[("X", "hello")]);
        let (out, _) = substitute("${#X}", &mut s).await.unwrap();
        assert_eq!(out, "5");
    }

    #[tokio::test]
    async fn suffix_removal_greedy_vs_lazy() {
        let mut s = state_with(&[("X", "a.b.c")]);
        let (out, _) = substitute("${X%.*}", &mut s).await.unwrap();
        assert_eq!(out, "a.b");
        let (out2, _) = substitute("${X%%.*}", &mut s).await.unwrap();
        assert_eq!(out2, "a");
    }

    #[tokio::test]
    async fn pattern_replacement_all() {
        let mut s = state_with(&[("X", "aXbXc")]);
        let (out, _) = substitute("${X//X/-}", &mut s).await.unwrap();
        assert_eq!(out, "a-b-c");
    }

    #[tokio::test]
    async fn case_modification() {
        let mut s = state_with(&[("X", "hello")]);
        let (out, _) = substitute("${X^^}", &mut s).await.unwrap();
        assert_eq!(out, "HELLO");
    }

    #[tokio::test]
    async fn single_quotes_suppress_expansion() {
        let mut s = state_with(&[("X", "hi")]);
        let (out, _) = substitute("'$X'", &mut s).await.unwrap();
        assert_eq!(out, "$X");
    }

    #[tokio::test]
    async fn arithmetic_expansion_inline() {
        let mut s = state_with(&[]);
        let (out, _) = substitute("$((2+3))", &mut s).await.unwrap();
        assert_eq!(out, "5");
    }

    #[tokio::test]
    async fn nounset_errors_on_missing_variable() {
        let mut s = state_with(&[]);
        s.options.nounset = true;
        assert!(substitute("$MISSING", &mut s).await.is_err());
    }

    #[tokio::test]
    async fn command_substitution_runs_in_process() {
        let mut s = state_with(&[]);
        let (out, _) = substitute("$(echo hi)", &mut s).await.unwrap();
        assert_eq!(out, "hi");
    }
}
