//! Configuration loading and resolution.
//!
//! Precedence: environment variables > `config.toml` in the toolchat home > defaults.
//! The home directory is `TOOLCHAT_HOME` if set, otherwise `~/.toolchat`.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "QwQ-32B-AWQ";
pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

const CONFIG_FILE: &str = "config.toml";

fn default_stream() -> bool {
    true
}
fn default_request_timeout_secs() -> u64 {
    120
}
fn default_weather_url() -> String {
    DEFAULT_WEATHER_URL.to_string()
}
fn default_weather_timeout_secs() -> u64 {
    15
}
fn default_units() -> String {
    "metric".to_string()
}
fn default_lang() -> String {
    "zh_cn".to_string()
}
fn default_mcp_call_timeout_secs() -> u64 {
    30
}

/// OpenWeather lookup settings (`[weather]` table).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WeatherConfig {
    /// A missing key is not fatal: the weather tool reports it to the model.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_weather_url")]
    pub base_url: String,
    #[serde(default = "default_weather_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_units")]
    pub units: String,
    #[serde(default = "default_lang")]
    pub lang: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_url(),
            timeout_secs: default_weather_timeout_secs(),
            units: default_units(),
            lang: default_lang(),
        }
    }
}

impl WeatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Remote tool peer settings (`[mcp]` table).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct McpConfig {
    /// Bounds every remote call, and the handshake and tool listing at startup.
    #[serde(default = "default_mcp_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_mcp_call_timeout_secs(),
        }
    }
}

impl McpConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

/// Raw configuration as read from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_stream")]
    pub stream: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Replaces the system prompt generated from the tool registry.
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub mcp: McpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            model: None,
            stream: default_stream(),
            request_timeout_secs: default_request_timeout_secs(),
            temperature: None,
            max_tokens: None,
            system_prompt: None,
            weather: WeatherConfig::default(),
            mcp: McpConfig::default(),
        }
    }
}

/// Resolve the toolchat home directory: `TOOLCHAT_HOME` env > `~/.toolchat`.
pub fn toolchat_home() -> Option<PathBuf> {
    if let Ok(home) = std::env::var("TOOLCHAT_HOME")
        && !home.trim().is_empty()
    {
        return Some(PathBuf::from(home));
    }
    dirs_next::home_dir().map(|h| h.join(".toolchat"))
}

/// Read a non-empty environment variable.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load from the default home, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match toolchat_home() {
            Some(home) => Self::load_from(&home)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load `<home>/config.toml`. A missing file yields defaults.
    pub fn load_from(home: &Path) -> Result<Self, ConfigError> {
        let path = home.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Overlay environment variables onto the file values.
    pub fn apply_env(&mut self) {
        if let Some(url) = env_var("TOOLCHAT_API_URL").or_else(|| env_var("VLLM_API_URL")) {
            self.api_url = Some(url);
        }
        if let Some(key) = env_var("TOOLCHAT_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(model) = env_var("TOOLCHAT_MODEL").or_else(|| env_var("MODEL_NAME")) {
            self.model = Some(model);
        }
        if let Some(key) = env_var("OPENWEATHER_API_KEY") {
            self.weather.api_key = Some(key);
        }
    }

    /// Validate into a [`ResolvedConfig`]. Missing endpoint or key is fatal.
    pub fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        let raw_url = self
            .api_url
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::MissingApiUrl)?;
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(ResolvedConfig {
            api_url: chat_completions_url(&raw_url)?,
            api_key,
            model: self
                .model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            stream: self.stream,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            system_prompt: self.system_prompt,
            weather: self.weather,
            mcp: self.mcp,
        })
    }
}

/// Fully resolved configuration, built once at startup and passed by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    /// Full `.../chat/completions` endpoint.
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub stream: bool,
    pub request_timeout: Duration,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
    pub weather: WeatherConfig,
    pub mcp: McpConfig,
}

/// Turn a configured endpoint into the full chat-completions URL.
///
/// Accepts a base (`http://host:8000/v1`), the full endpoint, or a bare host
/// (which gets `/v1` appended).
pub fn chat_completions_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidApiUrl {
        url: raw.to_string(),
        reason,
    };

    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = url::Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }

    // Users sometimes paste the full endpoint.
    if trimmed.ends_with("/chat/completions") {
        return Ok(trimmed.to_string());
    }
    let path = parsed.path();
    if path.is_empty() || path == "/" {
        return Ok(format!("{trimmed}/v1/chat/completions"));
    }
    Ok(format!("{trimmed}/chat/completions"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_KEYS: &[&str] = &[
        "TOOLCHAT_HOME",
        "TOOLCHAT_API_URL",
        "VLLM_API_URL",
        "TOOLCHAT_API_KEY",
        "TOOLCHAT_MODEL",
        "MODEL_NAME",
        "OPENWEATHER_API_KEY",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            // SAFETY: tests touching the environment are #[serial]
            unsafe { std::env::remove_var(key) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: tests touching the environment are #[serial]
        unsafe { std::env::set_var(key, value) };
    }

    #[test]
    fn test_defaults_from_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.stream);
        assert_eq!(config.request_timeout_secs, 120);
        assert_eq!(config.weather.timeout_secs, 15);
        assert_eq!(config.weather.units, "metric");
        assert_eq!(config.weather.lang, "zh_cn");
        assert_eq!(config.mcp.call_timeout_secs, 30);
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
api_url = "http://localhost:8000/v1"
api_key = "secret"
model = "qwen"
stream = false
request_timeout_secs = 10
temperature = 0.5
max_tokens = 1024

[weather]
api_key = "ow"
timeout_secs = 5

[mcp]
call_timeout_secs = 60
"#,
        )
        .unwrap();
        assert!(!config.stream);
        assert_eq!(config.max_tokens, Some(1024));
        assert_eq!(config.weather.api_key.as_deref(), Some("ow"));
        assert_eq!(config.weather.lang, "zh_cn");
        assert_eq!(config.mcp.call_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_resolve_requires_url_and_key() {
        let err = Config::default().resolve().unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiUrl));

        let config = Config {
            api_url: Some("http://localhost:8000/v1".into()),
            ..Default::default()
        };
        assert!(matches!(config.resolve(), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_resolve_fills_model_and_timeout() {
        let config = Config {
            api_url: Some("http://localhost:8000/v1/".into()),
            api_key: Some("k".into()),
            ..Default::default()
        };
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.api_url, "http://localhost:8000/v1/chat/completions");
        assert_eq!(resolved.model, DEFAULT_MODEL);
        assert_eq!(resolved.request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_chat_completions_url_forms() {
        assert_eq!(
            chat_completions_url("http://192.168.50.208:8000").unwrap(),
            "http://192.168.50.208:8000/v1/chat/completions"
        );
        assert_eq!(
            chat_completions_url("http://host:8000/v1/chat/completions/").unwrap(),
            "http://host:8000/v1/chat/completions"
        );
        assert_eq!(
            chat_completions_url("https://api.example.com/openai/v1").unwrap(),
            "https://api.example.com/openai/v1/chat/completions"
        );
        assert!(chat_completions_url("not a url").is_err());
        assert!(chat_completions_url("ftp://host/v1").is_err());
    }

    #[test]
    fn test_load_from_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::load_from(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_invalid_file_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "stream = [").unwrap();
        assert!(matches!(
            Config::load_from(dir.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        clear_env();
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "api_url = \"http://file:8000/v1\"\napi_key = \"file-key\"\nmodel = \"file-model\"\n",
        )
        .unwrap();
        set_env("TOOLCHAT_HOME", dir.path().to_str().unwrap());
        set_env("VLLM_API_URL", "http://vllm:8000/v1");
        set_env("MODEL_NAME", "env-model");
        set_env("OPENWEATHER_API_KEY", "ow-key");

        let config = Config::load().unwrap();
        clear_env();

        assert_eq!(config.api_url.as_deref(), Some("http://vllm:8000/v1"));
        assert_eq!(config.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.model.as_deref(), Some("env-model"));
        assert_eq!(config.weather.api_key.as_deref(), Some("ow-key"));
    }

    #[test]
    #[serial]
    fn test_primary_env_names_win_over_fallbacks() {
        clear_env();
        let dir = TempDir::new().unwrap();
        set_env("TOOLCHAT_HOME", dir.path().to_str().unwrap());
        set_env("TOOLCHAT_API_URL", "http://primary/v1");
        set_env("VLLM_API_URL", "http://fallback/v1");
        set_env("TOOLCHAT_MODEL", "primary-model");
        set_env("MODEL_NAME", "fallback-model");

        let config = Config::load().unwrap();
        clear_env();

        assert_eq!(config.api_url.as_deref(), Some("http://primary/v1"));
        assert_eq!(config.model.as_deref(), Some("primary-model"));
    }
}
