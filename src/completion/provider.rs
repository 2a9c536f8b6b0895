//! Rule-based completion.

use std::path::{Path, PathBuf};

use super::snapshot::Snapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub title: Option<String>,
    pub items: Vec<String>,
}

/// Known flags for commands the spec names explicitly (`bun`, git-like
/// tools, and krusty's own builtins get their flags from the registry
/// instead). A thin, informational list — not a full CLI spec per tool.
const BUN_FLAGS: &[&str] = &["--watch", "--hot", "--smol", "--bun", "--silent", "--version", "--help"];
const GIT_LIKE_FLAGS: &[&str] = &["--help", "--version", "--verbose", "--quiet", "--dry-run", "--force"];

pub fn complete(line: &str, cursor: usize, snapshot: &Snapshot, case_sensitive: bool, max_suggestions: usize) -> Vec<Group> {
    let cursor = cursor.min(line.len());
    let prefix = &line[..cursor];
    let (word_start, current_word, prior_words) = split_words(prefix);

    let groups = if prior_words.is_empty() {
        vec![Group { title: None, items: command_position_candidates(snapshot) }]
    } else if prior_words[0] == "cd" {
        vec![Group { title: None, items: cd_candidates(&current_word, snapshot) }]
    } else if prior_words.len() >= 2 && prior_words[0] == "bun" && prior_words[1] == "run" && prior_words.len() == 2 {
        bun_run_candidates(snapshot)
    } else if current_word.starts_with('-') {
        vec![Group { title: None, items: flag_candidates(&prior_words[0], &current_word) }]
    } else {
        vec![Group { title: None, items: path_candidates(&current_word, snapshot) }]
    };

    let _ = word_start;
    groups
        .into_iter()
        .map(|g| Group { title: g.title, items: rank_and_truncate(g.items, &current_word, case_sensitive, max_suggestions) })
        .filter(|g| !g.items.is_empty())
        .collect()
}

/// Split `prefix` (the line up to the cursor) into `(start offset of the
/// current word, current word text with surrounding quotes stripped, prior
/// complete words)`. Unquoted whitespace separates words; a quote character
/// suppresses splitting until its match or EOF.
fn split_words(prefix: &str) -> (usize, String, Vec<String>) {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut current_start = 0usize;
    let mut in_quote: Option<char> = None;
    let mut byte_idx = 0usize;

    for ch in prefix.chars() {
        let ch_len = ch.len_utf8();
        match in_quote {
            Some(q) if ch == q => in_quote = None,
            Some(_) => current.push(ch),
            None if ch == '\'' || ch == '"' => in_quote = Some(ch),
            None if ch.is_whitespace() => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                current_start = byte_idx + ch_len;
            }
            None => current.push(ch),
        }
        byte_idx += ch_len;
    }

    if words.is_empty() {
        current_start = 0;
    }
    (current_start, current, words)
}

fn command_position_candidates(snapshot: &Snapshot) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    names.extend(snapshot.builtins.iter().cloned());
    names.extend(snapshot.aliases.iter().cloned());
    names.extend(snapshot.path_executables.iter().cloned());
    names.extend(node_bin_names(&snapshot.cwd));
    names.sort();
    names.dedup();
    names
}

/// `node_modules/.bin` entries, when the cwd looks like a package project
/// (i.e. a `package.json` is present).
fn node_bin_names(cwd: &Path) -> Vec<String> {
    if !cwd.join("package.json").is_file() {
        return Vec::new();
    }
    let bin_dir = cwd.join("node_modules").join(".bin");
    list_dir_names(&bin_dir)
}

fn list_dir_names(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|e| e.file_name().into_string().ok())
        .collect()
}

fn cd_candidates(current_word: &str, snapshot: &Snapshot) -> Vec<String> {
    let mut candidates = directory_names(current_word, &snapshot.cwd);
    candidates.push("-".to_string());
    candidates.push("~".to_string());
    for i in 1..=snapshot.dir_stack_len.min(9) {
        candidates.push(format!("-{i}"));
    }
    for bookmark in &snapshot.bookmarks {
        candidates.push(format!(":{bookmark}"));
    }
    candidates
}

/// `bun run` completions: project script names (`package.json` "scripts"),
/// then local/project binaries (`node_modules/.bin`), then file paths —
/// returned as separate titled groups per the spec.
fn bun_run_candidates(snapshot: &Snapshot) -> Vec<Group> {
    let mut groups = Vec::new();

    let scripts = read_package_json_scripts(&snapshot.cwd);
    if !scripts.is_empty() {
        groups.push(Group { title: Some("scripts".to_string()), items: scripts });
    }

    let binaries = node_bin_names(&snapshot.cwd);
    if !binaries.is_empty() {
        groups.push(Group { title: Some("binaries".to_string()), items: binaries });
    }

    let files = directory_names("", &snapshot.cwd);
    if !files.is_empty() {
        groups.push(Group { title: Some("files".to_string()), items: files });
    }

    groups
}

fn read_package_json_scripts(cwd: &Path) -> Vec<String> {
    let Ok(text) = std::fs::read_to_string(cwd.join("package.json")) else { return Vec::new() };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else { return Vec::new() };
    value
        .get("scripts")
        .and_then(|v| v.as_object())
        .map(|obj| obj.keys().cloned().collect())
        .unwrap_or_default()
}

fn flag_candidates(command: &str, current_word: &str) -> Vec<String> {
    let pool: &[&str] = match command {
        "bun" => BUN_FLAGS,
        "git" => GIT_LIKE_FLAGS,
        _ => &[],
    };
    pool.iter().filter(|f| f.starts_with(current_word)).map(|f| f.to_string()).collect()
}

/// Path completion relative to `cwd`, expanding a leading `~` and returning
/// bare file/directory names (not full paths) so the editor can replace just
/// the current word.
fn path_candidates(current_word: &str, snapshot: &Snapshot) -> Vec<String> {
    directory_names(current_word, &snapshot.cwd)
}

fn directory_names(current_word: &str, cwd: &Path) -> Vec<String> {
    let expanded = expand_tilde(current_word);
    let (dir, fragment) = split_dir_fragment(&expanded, cwd);
    list_dir_names(&dir)
        .into_iter()
        .filter(|name| name.starts_with(&fragment))
        .collect()
}

fn expand_tilde(word: &str) -> String {
    if let Some(rest) = word.strip_prefix('~') {
        if rest.is_empty() || rest.starts_with('/') {
            if let Some(home) = dirs::home_dir() {
                return format!("{}{}", home.display(), rest);
            }
        }
    }
    word.to_string()
}

fn split_dir_fragment(word: &str, cwd: &Path) -> (PathBuf, String) {
    let path = Path::new(word);
    match word.rfind('/') {
        Some(idx) => {
            let dir_part = &word[..=idx];
            let fragment = word[idx + 1..].to_string();
            let dir = if path.is_absolute() { PathBuf::from(dir_part) } else { cwd.join(dir_part) };
            (dir, fragment)
        }
        None => (cwd.to_path_buf(), word.to_string()),
    }
}

fn rank_and_truncate(mut items: Vec<String>, current_word: &str, case_sensitive: bool, max_suggestions: usize) -> Vec<String> {
    let matches_prefix = |s: &str| -> bool {
        if case_sensitive {
            s.starts_with(current_word)
        } else {
            s.to_lowercase().starts_with(&current_word.to_lowercase())
        }
    };
    items.retain(|s| matches_prefix(s));
    items.sort_by(|a, b| {
        let a_exact = a == current_word;
        let b_exact = b == current_word;
        b_exact.cmp(&a_exact).then_with(|| a.cmp(b))
    });
    items.dedup();
    items.truncate(max_suggestions);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> Snapshot {
        Snapshot {
            cwd: PathBuf::from("/tmp"),
            builtins: vec!["cd".into(), "export".into()],
            aliases: vec!["ll".into()],
            path_executables: vec!["cat".into(), "curl".into()],
            bookmarks: vec!["proj".into()],
            dir_stack_len: 2,
            has_oldpwd: true,
        }
    }

    #[test]
    fn command_position_merges_sources() {
        let groups = complete("c", 1, &snapshot(), false, 50);
        let items = &groups[0].items;
        assert!(items.contains(&"cd".to_string()));
        assert!(items.contains(&"cat".to_string()));
        assert!(!items.contains(&"export".to_string()));
    }

    #[test]
    fn cd_offers_dash_and_tilde_and_stack_indexes() {
        let groups = complete("cd ", 3, &snapshot(), false, 50);
        let items = &groups[0].items;
        assert!(items.contains(&"-".to_string()));
        assert!(items.contains(&"~".to_string()));
        assert!(items.contains(&"-1".to_string()));
        assert!(items.contains(&":proj".to_string()));
    }

    #[test]
    fn exact_match_sorts_before_prefix_matches() {
        let ranked = rank_and_truncate(vec!["catdog".into(), "cat".into()], "cat", false, 50);
        assert_eq!(ranked[0], "cat");
    }

    #[test]
    fn flag_completion_filters_known_flags_by_prefix() {
        let items = flag_candidates("bun", "--h");
        assert_eq!(items, vec!["--hot".to_string(), "--help".to_string()]);
    }
}
