//! Command history.
//!
//! An append-only in-memory log backed by a line-delimited file under
//! `~/.krusty/history` (location resolved via the `dirs` crate, following
//! the same pattern the pack's `benwelker-terse` config loader uses for its
//! dotfile path). Search supports four modes: exact, prefix, regex, and
//! fuzzy (ordered subsequence) matching.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use regex_lite::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub index: usize,
    pub command: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub path: Option<PathBuf>,
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { path: default_history_path(), max_entries: 10_000 }
    }
}

fn default_history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".krusty").join("history"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Exact,
    StartsWith,
    Regex,
    Fuzzy,
}

#[derive(Debug)]
pub struct History {
    entries: Vec<HistoryEntry>,
    config: HistoryConfig,
    next_index: usize,
}

impl History {
    pub fn new(config: HistoryConfig) -> Self {
        Self { entries: Vec::new(), config, next_index: 1 }
    }

    pub fn load(&mut self) -> io::Result<()> {
        let Some(path) = &self.config.path else { return Ok(()) };
        let Ok(file) = fs::File::open(path) else { return Ok(()) };
        let reader = io::BufReader::new(file);
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            self.append(&line);
        }
        Ok(())
    }

    pub fn save(&self) -> io::Result<()> {
        let Some(path) = &self.config.path else { return Ok(()) };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        for entry in &self.entries {
            writeln!(file, "{}", entry.command)?;
        }
        Ok(())
    }

    /// Append a command; never stores blank lines, and indices are
    /// monotonically increasing, never reused even after truncation to
    /// `max_entries`.
    pub fn append(&mut self, command: &str) {
        if command.trim().is_empty() {
            return;
        }
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
        self.entries.push(HistoryEntry { index: self.next_index, command: command.to_string(), timestamp });
        self.next_index += 1;
        if self.entries.len() > self.config.max_entries {
            let overflow = self.entries.len() - self.config.max_entries;
            self.entries.drain(0..overflow);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn get_by_index(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.index == index)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn search(&self, query: &str, mode: SearchMode) -> Vec<&HistoryEntry> {
        match mode {
            SearchMode::Exact => self.entries.iter().filter(|e| e.command == query).collect(),
            SearchMode::StartsWith => self.entries.iter().filter(|e| e.command.starts_with(query)).collect(),
            SearchMode::Regex => match Regex::new(query) {
                Ok(re) => self.entries.iter().filter(|e| re.is_match(&e.command)).collect(),
                Err(_) => Vec::new(),
            },
            SearchMode::Fuzzy => self.entries.iter().filter(|e| is_subsequence(query, &e.command)).collect(),
        }
    }
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut hay = haystack.chars();
    needle.chars().all(|nc| hay.any(|hc| hc.eq_ignore_ascii_case(&nc)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_no_persist() -> History {
        History::new(HistoryConfig { path: None, max_entries: 5 })
    }

    #[test]
    fn append_assigns_increasing_indices() {
        let mut h = history_no_persist();
        h.append("echo 1");
        h.append("echo 2");
        assert_eq!(h.iter().map(|e| e.index).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn blank_commands_are_dropped() {
        let mut h = history_no_persist();
        h.append("   ");
        assert!(h.is_empty());
    }

    #[test]
    fn truncates_to_max_entries_without_reusing_indices() {
        let mut h = history_no_persist();
        for i in 0..8 {
            h.append(&format!("cmd{i}"));
        }
        assert_eq!(h.len(), 5);
        assert_eq!(h.last().unwrap().index, 8);
    }

    #[test]
    fn search_modes() {
        let mut h = history_no_persist();
        h.append("git commit -m fix");
        h.append("git push origin main");
        assert_eq!(h.search("git commit -m fix", SearchMode::Exact).len(), 1);
        assert_eq!(h.search("git", SearchMode::StartsWith).len(), 2);
        assert_eq!(h.search(r"^git push", SearchMode::Regex).len(), 1);
        assert_eq!(h.search("gpom", SearchMode::Fuzzy).len(), 1);
    }
}
