use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExampleBackend {
    /// Call the AI workflow service directly and parse its stream locally.
    #[default]
    Workflow,
    /// Go through the `/api/ai/examples` proxy.
    Proxy,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_sentence_count")]
    pub sentence_count: usize,
    #[serde(default = "default_force_refresh")]
    pub force_refresh: bool,
    #[serde(default)]
    pub backend: ExampleBackend,
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    #[serde(default = "default_workflow_base_url")]
    pub workflow_base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate_app_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate_app_secret: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_advance_cooldown_ms")]
    pub advance_cooldown_ms: u64,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

const MAX_SENTENCE_COUNT: usize = 20;
const MIN_TIMEOUT_SECS: u64 = 5;
const MAX_TIMEOUT_SECS: u64 = 300;

fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_sentence_count() -> usize {
    10
}
fn default_force_refresh() -> bool {
    true
}
fn default_proxy_url() -> String {
    "http://localhost:80".to_string()
}
fn default_workflow_base_url() -> String {
    "https://api.coze.cn".to_string()
}
fn default_request_timeout_secs() -> u64 {
    60
}
fn default_advance_cooldown_ms() -> u64 {
    600
}
fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            sentence_count: default_sentence_count(),
            force_refresh: default_force_refresh(),
            backend: ExampleBackend::default(),
            proxy_url: default_proxy_url(),
            workflow_base_url: default_workflow_base_url(),
            workflow_id: None,
            workflow_app_id: None,
            workflow_token: None,
            translate_app_key: None,
            translate_app_secret: None,
            request_timeout_secs: default_request_timeout_secs(),
            advance_cooldown_ms: default_advance_cooldown_ms(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load the config file (if any), then apply environment overrides.
    /// A malformed file falls back to the defaults and its error is handed
    /// back for the caller to report.
    pub fn load() -> (Self, Option<anyhow::Error>) {
        Self::load_from(&Self::config_path(), |name| std::env::var(name).ok())
    }

    pub fn load_from<F>(path: &Path, lookup: F) -> (Self, Option<anyhow::Error>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let (mut config, error) = match Self::read_file(path) {
            Ok(config) => (config, None),
            Err(err) => (Config::default(), Some(err)),
        };
        config.apply_env(lookup);
        config.validate();
        (config, error)
    }

    fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vocabdr")
            .join("config.toml")
    }

    /// Override credentials and endpoints from the environment. Blank values
    /// are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("COZE_TOKEN") {
            self.workflow_token = Some(v);
        }
        if let Some(v) = get("COZE_BASE_URL") {
            self.workflow_base_url = v;
        }
        if let Some(v) = get("COZE_WORKFLOW_ID") {
            self.workflow_id = Some(v);
        }
        if let Some(v) = get("COZE_APP_ID") {
            self.workflow_app_id = Some(v);
        }
        if let Some(v) = get("YOUDAO_APP_KEY") {
            self.translate_app_key = Some(v);
        }
        if let Some(v) = get("YOUDAO_APP_SECRET") {
            self.translate_app_secret = Some(v);
        }
    }

    /// Clamp numeric settings into their usable ranges.
    pub fn validate(&mut self) {
        self.sentence_count = self.sentence_count.clamp(1, MAX_SENTENCE_COUNT);
        self.request_timeout_secs = self
            .request_timeout_secs
            .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn advance_cooldown(&self) -> Duration {
        Duration::from_millis(self.advance_cooldown_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.sentence_count, 10);
        assert!(config.force_refresh);
        assert_eq!(config.backend, ExampleBackend::Workflow);
        assert_eq!(config.proxy_url, "http://localhost:80");
        assert_eq!(config.workflow_base_url, "https://api.coze.cn");
        assert_eq!(config.workflow_token, None);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(config.advance_cooldown(), Duration::from_millis(600));
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_config_partial_file_keeps_other_defaults() {
        let toml_str = r#"
theme = "monokai"
backend = "proxy"
proxy_url = "http://127.0.0.1:3000"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.theme, "monokai");
        assert_eq!(config.backend, ExampleBackend::Proxy);
        assert_eq!(config.proxy_url, "http://127.0.0.1:3000");
        assert_eq!(config.sentence_count, 10);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let mut config = Config::default();
        config.workflow_id = Some("wf-1".to_string());
        let serialized = toml::to_string_pretty(&config).unwrap();
        assert!(!serialized.contains("workflow_token"));
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(deserialized.workflow_id.as_deref(), Some("wf-1"));
        assert_eq!(deserialized.backend, config.backend);
        assert_eq!(deserialized.advance_cooldown_ms, config.advance_cooldown_ms);
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(toml::from_str::<Config>("backend = \"carrier-pigeon\"").is_err());
    }

    #[test]
    fn test_env_overrides_credentials() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("COZE_TOKEN", "pat_123"),
            ("COZE_WORKFLOW_ID", "7500"),
            ("COZE_APP_ID", "  "),
            ("YOUDAO_APP_KEY", "key"),
        ]);
        let mut config = Config::default();
        config.workflow_app_id = Some("from-file".to_string());
        config.apply_env(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.workflow_token.as_deref(), Some("pat_123"));
        assert_eq!(config.workflow_id.as_deref(), Some("7500"));
        assert_eq!(config.workflow_app_id.as_deref(), Some("from-file"));
        assert_eq!(config.translate_app_key.as_deref(), Some("key"));
        assert_eq!(config.translate_app_secret, None);
        assert_eq!(config.workflow_base_url, "https://api.coze.cn");
    }

    #[test]
    fn test_malformed_file_still_applies_env() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "sentence_count = \"lots\"\nrequest_timeout_secs = 1").unwrap();

        let (config, error) = Config::load_from(&path, |name| {
            (name == "COZE_TOKEN").then(|| "pat_env".to_string())
        });
        assert!(error.is_some());
        assert_eq!(config.workflow_token.as_deref(), Some("pat_env"));
        assert_eq!(config.sentence_count, 10);
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let (config, error) = Config::load_from(&dir.path().join("absent.toml"), |_| None);
        assert!(error.is_none());
        assert_eq!(config.backend, ExampleBackend::Workflow);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.backend = ExampleBackend::Proxy;
        config.sentence_count = 50;
        config.save_to(&path).unwrap();

        let (loaded, error) = Config::load_from(&path, |_| None);
        assert!(error.is_none());
        assert_eq!(loaded.backend, ExampleBackend::Proxy);
        assert_eq!(loaded.sentence_count, 20);
    }

    #[test]
    fn test_validate_clamps_ranges() {
        let mut config = Config::default();
        config.sentence_count = 0;
        config.request_timeout_secs = 1;
        config.validate();
        assert_eq!(config.sentence_count, 1);
        assert_eq!(config.request_timeout_secs, 5);

        config.sentence_count = 500;
        config.request_timeout_secs = 10_000;
        config.validate();
        assert_eq!(config.sentence_count, 20);
        assert_eq!(config.request_timeout_secs, 300);
    }
}
