//! Alias manager.
//!
//! Distinct from POSIX `alias`: krusty aliases carry `$@`/`$N` placeholders
//! that get substituted with the invocation's actual arguments before the
//! expanded text is re-parsed as a fresh command line. Cycle detection uses a
//! visited-name set plus a hard depth cap, mirroring the teacher's
//! `interpreter/alias_expansion.rs` guard against self-referential aliases.
//! A cycle doesn't error: the unexpandable head is kept literally, with each
//! level's own trailing text reattached after it, the same way a shell falls
//! back to running the alias name as a plain command once expansion bottoms
//! out.

use std::collections::HashMap;

const MAX_EXPANSION_DEPTH: usize = 10;

#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.entries.insert(name.to_string(), value.to_string());
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Expand `name` with `args` applied to its `$@`/`$1..$N` placeholders,
    /// then recursively re-expand the leading word of the result while it is
    /// itself a known alias, up to [`MAX_EXPANSION_DEPTH`]. Returns `None` if
    /// `name` isn't an alias.
    pub fn expand(&self, name: &str, args: &[String]) -> Option<Result<String, AliasError>> {
        if !self.entries.contains_key(name) {
            return None;
        }
        Some(self.expand_inner(name, args, &mut vec![name.to_string()]))
    }

    fn expand_inner(
        &self,
        name: &str,
        args: &[String],
        visited: &mut Vec<String>,
    ) -> Result<String, AliasError> {
        if visited.len() > MAX_EXPANSION_DEPTH {
            return Err(AliasError::DepthExceeded(MAX_EXPANSION_DEPTH));
        }
        let Some(template) = self.entries.get(name) else {
            // Leaf: reconstruct name + args verbatim.
            let mut parts = vec![name.to_string()];
            parts.extend(args.iter().cloned());
            return Ok(parts.join(" "));
        };
        let substituted = substitute_placeholders(template, args);

        let mut words = substituted.splitn(2, char::is_whitespace);
        let head = words.next().unwrap_or("").to_string();
        let tail = words.next().unwrap_or("").to_string();

        if head != name && self.entries.contains_key(&head) {
            if visited.contains(&head) {
                // Cycle: `head` can't be re-expanded again. Keep it as the
                // literal leaf command, with this level's own trailing text
                // reattached — callers up the chain reattach theirs in turn,
                // so the final string accumulates every level's tail in order.
                return Ok(join_tail(&head, &tail));
            }
            visited.push(head.clone());
            let expanded_head = self.expand_inner(&head, &[], visited)?;
            return Ok(join_tail(&expanded_head, &tail));
        }

        Ok(substituted)
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AliasError {
    #[error("alias expansion cycle detected at `{0}`")]
    Cycle(String),
    #[error("alias expansion exceeded max depth ({0})")]
    DepthExceeded(usize),
}

/// Replace `$@` with all args space-joined, and `$1`.."$N" with the
/// corresponding positional arg (empty string if absent).
fn substitute_placeholders(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let chars: Vec<char> = template.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '$' {
            if chars.get(i + 1) == Some(&'@') {
                out.push_str(&args.join(" "));
                i += 2;
                continue;
            }
            if let Some(d) = chars.get(i + 1).filter(|c| c.is_ascii_digit()) {
                let n: usize = d.to_digit(10).unwrap() as usize;
                if n >= 1 {
                    if let Some(a) = args.get(n - 1) {
                        out.push_str(a);
                    }
                }
                i += 2;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn join_tail(head: &str, tail: &str) -> String {
    if tail.is_empty() {
        head.to_string()
    } else {
        format!("{head} {tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_simple_alias() {
        let mut t = AliasTable::new();
        t.set("ll", "ls -la");
        assert_eq!(t.expand("ll", &[]).unwrap().unwrap(), "ls -la");
    }

    #[test]
    fn expands_with_all_args_placeholder() {
        let mut t = AliasTable::new();
        t.set("gl", "git log $@");
        let args = vec!["--oneline".to_string(), "-5".to_string()];
        assert_eq!(t.expand("gl", &args).unwrap().unwrap(), "git log --oneline -5");
    }

    #[test]
    fn expands_with_positional_placeholder() {
        let mut t = AliasTable::new();
        t.set("first", "echo $1");
        let args = vec!["a".to_string(), "b".to_string()];
        assert_eq!(t.expand("first", &args).unwrap().unwrap(), "echo a");
    }

    #[test]
    fn direct_cycle_falls_back_to_the_leaf_name() {
        let mut t = AliasTable::new();
        t.set("a", "b");
        t.set("b", "a");
        assert_eq!(t.expand("a", &[]).unwrap().unwrap(), "a");
    }

    #[test]
    fn cycle_with_trailing_args_accumulates_every_level() {
        let mut t = AliasTable::new();
        t.set("a", "b x");
        t.set("b", "a y");
        assert_eq!(t.expand("a", &[]).unwrap().unwrap(), "a y x");
    }

    #[test]
    fn unknown_alias_returns_none() {
        let t = AliasTable::new();
        assert!(t.expand("nope", &[]).is_none());
    }

    #[test]
    fn removes_alias() {
        let mut t = AliasTable::new();
        t.set("x", "y");
        assert!(t.remove("x"));
        assert!(!t.remove("x"));
    }
}
