//! Point-in-time capture of everything the completion provider needs to read
//! from `ShellState`, so the provider itself stays a pure function over owned
//! data instead of borrowing the shell for the life of the line editor.

use std::path::{Path, PathBuf};

use crate::builtins::BuiltinRegistry;
use crate::state::ShellState;

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub cwd: PathBuf,
    pub builtins: Vec<String>,
    pub aliases: Vec<String>,
    pub path_executables: Vec<String>,
    pub bookmarks: Vec<String>,
    pub dir_stack_len: usize,
    pub has_oldpwd: bool,
}

impl Snapshot {
    pub fn capture(state: &ShellState, registry: &BuiltinRegistry) -> Self {
        Self {
            cwd: state.cwd.clone(),
            builtins: registry.names().map(str::to_string).collect(),
            aliases: state.aliases.iter().map(|(name, _)| name.to_string()).collect(),
            path_executables: scan_path_executables(&state.path_dirs()),
            bookmarks: state.bookmarks.keys().cloned().collect(),
            dir_stack_len: state.dir_stack.len(),
            has_oldpwd: state.environment.contains_key("OLDPWD"),
        }
    }
}

/// List every executable filename on `$PATH`. Bounded by the directories
/// themselves being a finite, usually-small list; duplicate names across
/// directories are deduplicated (first `PATH` entry wins, matching lookup
/// order).
fn scan_path_executables(dirs: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut names = Vec::new();
    for dir in dirs {
        let Ok(entries) = std::fs::read_dir(dir) else { continue };
        for entry in entries.flatten() {
            let Ok(meta) = entry.metadata() else { continue };
            if !meta.is_file() && !is_symlink_to_file(&entry.path()) {
                continue;
            }
            if !is_executable(&meta) {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else { continue };
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
    }
    names
}

fn is_symlink_to_file(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &std::fs::Metadata) -> bool {
    true
}
