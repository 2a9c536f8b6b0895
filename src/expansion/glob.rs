//! Pathname (glob) expansion.
//!
//! `glob_match` is a small `fnmatch`-style matcher used both for filesystem
//! globbing and for `[[ x == pattern ]]` string matching. Filesystem
//! expansion itself is delegated to the `glob` crate (already in the
//! teacher's dependency graph) rather than hand-rolling directory walking.

pub fn has_glob_chars(s: &str) -> bool {
    s.chars().any(|c| matches!(c, '*' | '?' | '['))
}

/// Expand a glob pattern against the filesystem relative to `cwd`. Returns
/// the pattern itself, unexpanded, if it matches nothing (bash's default
/// `nullglob`-off behavior) or isn't glob-eligible at all.
pub fn expand_glob(pattern: &str, cwd: &std::path::Path) -> Vec<String> {
    if !has_glob_chars(pattern) {
        return vec![pattern.to_string()];
    }
    let joined = if std::path::Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        cwd.join(pattern).to_string_lossy().into_owned()
    };
    match glob::glob(&joined) {
        Ok(paths) => {
            let mut matches: Vec<String> = paths
                .filter_map(|p| p.ok())
                .map(|p| relativize(&p, cwd, pattern))
                .collect();
            matches.sort();
            if matches.is_empty() {
                vec![pattern.to_string()]
            } else {
                matches
            }
        }
        Err(_) => vec![pattern.to_string()],
    }
}

fn relativize(p: &std::path::Path, cwd: &std::path::Path, original_pattern: &str) -> String {
    if std::path::Path::new(original_pattern).is_absolute() {
        return p.to_string_lossy().into_owned();
    }
    p.strip_prefix(cwd).unwrap_or(p).to_string_lossy().into_owned()
}

/// `fnmatch`-style glob match of `text` against `pattern` (`*`, `?`, `[...]`).
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    match_from(&p, 0, &t, 0)
}

fn match_from(p: &[char], pi: usize, t: &[char], ti: usize) -> bool {
    if pi == p.len() {
        return ti == t.len();
    }
    match p[pi] {
        '*' => {
            for k in ti..=t.len() {
                if match_from(p, pi + 1, t, k) {
                    return true;
                }
            }
            false
        }
        '?' => ti < t.len() && match_from(p, pi + 1, t, ti + 1),
        '[' => {
            let Some((matched, next_pi)) = match_bracket(p, pi, t.get(ti).copied()) else {
                return ti < t.len() && t[ti] == '[' && match_from(p, pi + 1, t, ti + 1);
            };
            ti < t.len() && matched && match_from(p, next_pi, t, ti + 1)
        }
        c => ti < t.len() && t[ti] == c && match_from(p, pi + 1, t, ti + 1),
    }
}

fn match_bracket(p: &[char], start: usize, ch: Option<char>) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negate = matches!(p.get(i), Some('!') | Some('^'));
    if negate {
        i += 1;
    }
    let set_start = i;
    let mut found = false;
    while i < p.len() && (p[i] != ']' || i == set_start) {
        if p.get(i + 1) == Some(&'-') && p.get(i + 2).is_some() && p[i + 2] != ']' {
            if let Some(c) = ch {
                if c >= p[i] && c <= p[i + 2] {
                    found = true;
                }
            }
            i += 3;
        } else {
            if Some(p[i]) == ch {
                found = true;
            }
            i += 1;
        }
    }
    if i >= p.len() {
        return None; // unterminated bracket: treat '[' as literal
    }
    let result = if negate { ch.is_some() && !found } else { found };
    Some((result, i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_anything() {
        assert!(glob_match("*.txt", "readme.txt"));
        assert!(!glob_match("*.txt", "readme.md"));
    }

    #[test]
    fn question_matches_one_char() {
        assert!(glob_match("a?c", "abc"));
        assert!(!glob_match("a?c", "abbc"));
    }

    #[test]
    fn bracket_class_and_range() {
        assert!(glob_match("[abc]x", "ax"));
        assert!(glob_match("[a-c]x", "bx"));
        assert!(!glob_match("[a-c]x", "dx"));
    }

    #[test]
    fn negated_bracket() {
        assert!(glob_match("[!abc]x", "dx"));
        assert!(!glob_match("[!abc]x", "ax"));
    }

    #[test]
    fn has_glob_chars_detects_metacharacters() {
        assert!(has_glob_chars("*.rs"));
        assert!(!has_glob_chars("plain"));
    }
}
