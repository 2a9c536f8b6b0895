//! Config contract consumed at startup.
//!
//! krusty does not own a config format; it deserializes whatever JSON object
//! `KRUSTY_CONFIG` points at (falling back to `~/.krusty/config.json`) into
//! this recognized shape, the way `benwelker-terse`'s `config::load` layers a
//! typed schema over a loosely-structured file. Unlike that loader krusty has
//! exactly one file layer, with no project-local override.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::history::{HistoryConfig, SearchMode};

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistorySettings {
    pub max_entries: usize,
    pub file: Option<PathBuf>,
    pub ignore_duplicates: bool,
    pub ignore_space: bool,
    pub search_mode: SearchModeSetting,
    pub search_limit: Option<usize>,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            file: None,
            ignore_duplicates: true,
            ignore_space: true,
            search_mode: SearchModeSetting::Fuzzy,
            search_limit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchModeSetting {
    Fuzzy,
    Exact,
    Startswith,
    Regex,
}

impl From<SearchModeSetting> for SearchMode {
    fn from(s: SearchModeSetting) -> Self {
        match s {
            SearchModeSetting::Fuzzy => SearchMode::Fuzzy,
            SearchModeSetting::Exact => SearchMode::Exact,
            SearchModeSetting::Startswith => SearchMode::StartsWith,
            SearchModeSetting::Regex => SearchMode::Regex,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompletionSettings {
    pub enabled: bool,
    pub case_sensitive: bool,
    pub max_suggestions: usize,
    pub bin_path_max_suggestions: Option<usize>,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self { enabled: true, case_sensitive: false, max_suggestions: 50, bin_path_max_suggestions: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheLimits {
    pub arg: usize,
    pub exec: usize,
    pub arithmetic: usize,
}

impl Default for CacheLimits {
    fn default() -> Self {
        Self { arg: 256, exec: 256, arithmetic: 256 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpansionSettings {
    pub cache_limits: CacheLimits,
}

impl Default for ExpansionSettings {
    fn default() -> Self {
        Self { cache_limits: CacheLimits::default() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExecutionSettings {
    pub default_timeout_ms: Option<u64>,
    pub kill_signal: String,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self { default_timeout_ms: None, kill_signal: "SIGTERM".to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HookSpecConfig {
    pub command: Option<String>,
    pub script: Option<String>,
    pub function: Option<String>,
    pub plugin: Option<String>,
    pub conditions: Vec<String>,
    pub priority: i32,
    pub timeout: Option<u64>,
    pub enabled: bool,
}

impl Default for HookSpecConfig {
    fn default() -> Self {
        Self {
            command: None,
            script: None,
            function: None,
            plugin: None,
            conditions: Vec::new(),
            priority: 0,
            timeout: None,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub verbose: bool,
    pub stream_output: bool,
    pub aliases: std::collections::HashMap<String, String>,
    pub environment: std::collections::HashMap<String, String>,
    pub plugins: Vec<String>,
    pub history: HistorySettings,
    pub completion: CompletionSettings,
    pub expansion: ExpansionSettings,
    pub execution: ExecutionSettings,
    pub hooks: std::collections::HashMap<String, Vec<HookSpecConfig>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            stream_output: true,
            aliases: std::collections::HashMap::new(),
            environment: std::collections::HashMap::new(),
            plugins: Vec::new(),
            history: HistorySettings::default(),
            completion: CompletionSettings::default(),
            expansion: ExpansionSettings::default(),
            execution: ExecutionSettings::default(),
            hooks: std::collections::HashMap::new(),
        }
    }
}

impl Config {
    /// Load from an explicit path, falling back to `KRUSTY_CONFIG`, then
    /// `~/.krusty/config.json`. A missing or malformed file yields defaults
    /// rather than failing startup.
    pub fn load(explicit_path: Option<&Path>) -> Self {
        let candidate = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("KRUSTY_CONFIG").ok().map(PathBuf::from))
            .or_else(default_config_path);

        let Some(path) = candidate else { return Config::default() };
        let Ok(text) = std::fs::read_to_string(&path) else { return Config::default() };
        match serde_json::from_str(&text) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "malformed config, using defaults");
                Config::default()
            }
        }
    }

    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig {
            path: self.history.file.clone().or_else(default_history_path),
            max_entries: self.history.max_entries,
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".krusty").join("config.json"))
}

fn default_history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".krusty").join("history"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert!(cfg.stream_output);
        assert_eq!(cfg.completion.max_suggestions, 50);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = Config::load(Some(Path::new("/nonexistent/krusty-config-test.json")));
        assert_eq!(cfg.history.max_entries, 10_000);
    }

    #[test]
    fn parses_a_minimal_json_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"verbose": true, "history": {"maxEntries": 500}}"#).unwrap();
        let cfg = Config::load(Some(&path));
        assert!(cfg.verbose);
        assert_eq!(cfg.history.max_entries, 500);
    }
}
