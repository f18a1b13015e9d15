//! Application settings management

use crate::PathManager;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Application settings stored in settings.toml
///
/// The OpenAI API key is deliberately not part of this file; it is read from
/// `OPENAI_API_KEY` at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Chat model used for summaries (e.g., "gpt-4o-mini")
    pub model: String,
    /// Custom base URL for an OpenAI-compatible API (proxy, local gateway)
    pub openai_base_url: Option<String>,
    /// Language the summary is written in
    pub summary_language: String,
    /// Upper bound on a single summarizer call
    pub summary_timeout_secs: u64,
    /// Message cap for the "recent" and "last N hours" windows
    pub recent_limit: usize,
    /// Completion token budget for one summary
    pub max_summary_tokens: u32,
    pub temperature: f32,
    /// Database location; defaults to `PathManager::db_path()`
    pub database_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            openai_base_url: None,
            summary_language: "English".to_string(),
            summary_timeout_secs: 60,
            recent_limit: 200,
            max_summary_tokens: 500,
            temperature: 0.7,
            database_path: None,
        }
    }
}

impl Settings {
    /// Load settings from the settings file, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = PathManager::settings_path() else {
            return Self::default();
        };

        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };

        Self::from_toml(&content)
    }

    /// Parse settings from TOML, falling back to defaults on malformed input
    pub fn from_toml(content: &str) -> Self {
        toml::from_str(content).unwrap_or_default()
    }

    /// Save settings to the settings file
    pub fn save(&self) -> Result<(), String> {
        let path = PathManager::settings_path().ok_or("Could not determine settings path")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config dir: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        fs::write(&path, content).map_err(|e| format!("Failed to write settings: {}", e))?;
        Ok(())
    }

    /// Overlay values from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup (environment, test fixtures)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("RECAP_MODEL").filter(|v| !v.trim().is_empty()) {
            self.model = model;
        }
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.openai_base_url = Some(url);
        }
        if let Some(secs) = lookup("RECAP_SUMMARY_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.summary_timeout_secs = secs;
        }
        if let Some(path) = lookup("RECAP_DB_PATH").filter(|v| !v.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }
    }

    pub fn summary_timeout(&self) -> Duration {
        Duration::from_secs(self.summary_timeout_secs.max(1))
    }

    /// Resolved database path: explicit setting, else the platform data dir
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path.clone().or_else(PathManager::db_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml("model = \"gpt-4o\"\nrecent_limit = 50\n");
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.recent_limit, 50);
        assert_eq!(settings.summary_timeout_secs, 60);
        assert_eq!(settings.summary_language, "English");
    }

    #[test]
    fn test_malformed_toml_falls_back_to_defaults() {
        let settings = Settings::from_toml("model = [");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut settings = Settings::default();
        settings.openai_base_url = Some("http://localhost:8080".to_string());
        let text = toml::to_string_pretty(&settings).unwrap();
        assert_eq!(Settings::from_toml(&text), settings);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("RECAP_MODEL", "gpt-4.1"),
            ("RECAP_SUMMARY_TIMEOUT_SECS", "15"),
            ("RECAP_DB_PATH", "/tmp/recap-test.db"),
            ("OPENAI_BASE_URL", ""),
        ]);
        let mut settings = Settings::default();
        settings.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.model, "gpt-4.1");
        assert_eq!(settings.summary_timeout(), Duration::from_secs(15));
        assert_eq!(settings.database_path, Some(PathBuf::from("/tmp/recap-test.db")));
        // Blank values are ignored
        assert_eq!(settings.openai_base_url, None);
    }

    #[test]
    fn test_unparseable_timeout_is_ignored() {
        let mut settings = Settings::default();
        settings.apply_overrides(|key| (key == "RECAP_SUMMARY_TIMEOUT_SECS").then(|| "soon".to_string()));
        assert_eq!(settings.summary_timeout_secs, 60);
    }
}
