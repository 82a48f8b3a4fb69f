//! Configuration settings for Delve.

use super::Variant;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub agent: AgentSettings,
    pub endpoints: EndpointSettings,
    pub telemetry: TelemetrySettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Model identifier. Falls back to the variant's default when unset.
    pub name: Option<String>,
    /// Alternative OpenAI-compatible API base URL.
    pub api_base: Option<String>,
    /// Re-prompts allowed per run when the model emits an invalid tool call.
    pub max_retries: usize,
    /// Upper bound on model rounds within a single run.
    pub max_iterations: usize,
    /// Request timeout for the model API in seconds. Unset means no timeout.
    pub timeout_secs: Option<u64>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: None,
            api_base: None,
            max_retries: 2,
            max_iterations: 10,
            timeout_secs: None,
        }
    }
}

/// Agent persona and tool set selection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgentSettings {
    pub variant: Variant,
}

/// Base URLs of the lookup services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointSettings {
    pub brave_search: String,
    pub youtube: String,
    pub reddit_auth: String,
    pub reddit_api: String,
    /// User agent sent to Reddit, which rejects anonymous clients.
    pub reddit_user_agent: String,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            brave_search: "https://api.search.brave.com/res/v1/web/search".to_string(),
            youtube: "https://www.youtube.com".to_string(),
            reddit_auth: "https://www.reddit.com/api/v1/access_token".to_string(),
            reddit_api: "https://oauth.reddit.com".to_string(),
            reddit_user_agent: concat!("delve/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl EndpointSettings {
    /// Check that every endpoint is an absolute URL.
    pub fn validate(&self) -> crate::error::Result<()> {
        for endpoint in [
            &self.brave_search,
            &self.youtube,
            &self.reddit_auth,
            &self.reddit_api,
        ] {
            url::Url::parse(endpoint)?;
        }
        Ok(())
    }
}

/// Tracing metadata attached to every session span.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    pub service_name: String,
    pub service_version: String,
    pub environment: String,
    /// Export token. Read from the environment only.
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            service_name: "web-search-agent".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
            token: None,
        }
    }
}

/// HTTP API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// API credentials, taken from the environment and never written to disk.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub brave_api_key: Option<String>,
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
}

impl Credentials {
    /// Read credentials from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary variable lookup.
    ///
    /// Empty values are treated as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            brave_api_key: get("BRAVE_API_KEY"),
            reddit_client_id: get("REDDIT_CLIENT_ID"),
            reddit_client_secret: get("REDDIT_CLIENT_SECRET"),
        }
    }

    /// Reddit client id and secret, when both are present.
    pub fn reddit(&self) -> Option<(String, String)> {
        match (&self.reddit_client_id, &self.reddit_client_secret) {
            (Some(id), Some(secret)) => Some((id.clone(), secret.clone())),
            _ => None,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::DelveError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("delve")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Apply overrides from process environment variables.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides through an arbitrary variable lookup.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = get("LLM_MODEL") {
            self.model.name = Some(model);
        }
        if let Some(base) = get("OPENAI_API_BASE") {
            self.model.api_base = Some(base);
        }
        if let Some(name) = get("SERVICE_NAME") {
            self.telemetry.service_name = name;
        }
        if let Some(env) = get("ENVIRONMENT") {
            self.telemetry.environment = env;
        }
        self.telemetry.token = get("LOGFIRE_TOKEN");
    }

    /// Model identifier in effect for the configured variant.
    pub fn model_name(&self) -> String {
        self.model
            .name
            .clone()
            .unwrap_or_else(|| self.agent.variant.default_model().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.model.max_retries, 2);
        assert_eq!(settings.model.timeout_secs, None);
        assert_eq!(settings.agent.variant, Variant::WebSearch);
        assert_eq!(settings.model_name(), "gpt-4o");
        assert_eq!(settings.telemetry.environment, "development");
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings.apply_env_from(lookup(&[
            ("LLM_MODEL", "gpt-4o-mini"),
            ("ENVIRONMENT", "production"),
            ("LOGFIRE_TOKEN", "tok"),
            ("SERVICE_NAME", ""),
        ]));

        assert_eq!(settings.model_name(), "gpt-4o-mini");
        assert_eq!(settings.telemetry.environment, "production");
        assert_eq!(settings.telemetry.token.as_deref(), Some("tok"));
        assert_eq!(settings.telemetry.service_name, "web-search-agent");
    }

    #[test]
    fn test_credentials_treat_empty_as_missing() {
        let creds = Credentials::from_lookup(lookup(&[
            ("BRAVE_API_KEY", "  "),
            ("REDDIT_CLIENT_ID", "id"),
        ]));

        assert!(creds.brave_api_key.is_none());
        assert!(creds.reddit().is_none());

        let creds = Credentials::from_lookup(lookup(&[
            ("REDDIT_CLIENT_ID", "id"),
            ("REDDIT_CLIENT_SECRET", "secret"),
        ]));
        assert_eq!(
            creds.reddit(),
            Some(("id".to_string(), "secret".to_string()))
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.agent.variant = Variant::RedditStrict;
        settings.server.port = 8080;
        settings.telemetry.token = Some("secret".to_string());
        settings.save_to(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("secret"));

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.agent.variant, Variant::RedditStrict);
        assert_eq!(loaded.server.port, 8080);
        assert!(loaded.telemetry.token.is_none());
    }

    #[test]
    fn test_endpoint_validation() {
        tokio_test::assert_ok!(EndpointSettings::default().validate());

        let endpoints = EndpointSettings {
            reddit_api: "oauth.reddit.com".to_string(),
            ..Default::default()
        };
        let err = tokio_test::assert_err!(endpoints.validate());
        assert!(matches!(err, crate::error::DelveError::Url(_)));
    }

    #[test]
    fn test_model_timeout_is_opt_in() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[model]\ntimeout_secs = 30\n").unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.model.timeout_secs, Some(30));
        assert_eq!(loaded.model.max_iterations, 10);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(settings.server.host, "127.0.0.1");
    }
}
