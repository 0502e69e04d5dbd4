use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::constants::{
    API_KEY_ENV, CONFIG_PATH_ENV, DEFAULT_AI_ENDPOINT, DEFAULT_AI_MODEL, DEFAULT_BIND,
    DEFAULT_MAX_INPUT_CHARS, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_STATIC_DIR, DEFAULT_SUMMARY_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
use crate::error::ConfigError;
use crate::text::ScrubRules;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// Summarization service settings
    #[serde(default)]
    pub ai: AiConfig,
    /// Banner/footer keyword overrides
    #[serde(default)]
    pub scrub: ScrubRules,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory holding `index.html` and other static assets
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: default_static_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.bind.clone()))
    }
}

/// Summarization service configuration (OpenAI-compatible API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// API key; the OPENAI_API_KEY environment variable takes precedence
    #[serde(default)]
    pub api_key: Option<String>,
    /// Chat completions endpoint
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens for summary responses
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Characters of message text forwarded with each request
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_ai_endpoint(),
            model: default_ai_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_input_chars: default_max_input_chars(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AiConfig {
    /// Resolve the API key from the environment, falling back to the config file.
    pub fn require_api_key(&self) -> Result<String, ConfigError> {
        resolve_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.as_deref())
    }
}

/// Pick the first non-blank key, environment first.
pub fn resolve_api_key(
    from_env: Option<String>,
    from_file: Option<&str>,
) -> Result<String, ConfigError> {
    from_env
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .or_else(|| {
            from_file
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
        })
        .ok_or(ConfigError::MissingApiKey(API_KEY_ENV))
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STATIC_DIR)
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_ai_endpoint() -> String {
    DEFAULT_AI_ENDPOINT.to_string()
}

fn default_ai_model() -> String {
    DEFAULT_AI_MODEL.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_SUMMARY_MAX_TOKENS
}

fn default_max_input_chars() -> usize {
    DEFAULT_MAX_INPUT_CHARS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mailbrief"))
    }

    /// Explicit path from MAILBRIEF_CONFIG, else the per-user config file if present.
    pub fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }

        Self::config_dir()
            .map(|dir| dir.join("config.toml"))
            .filter(|path| path.exists())
    }

    /// Load configuration, using defaults when no config file exists.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(Config::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:8000");
        assert_eq!(config.server.static_dir, PathBuf::from("static"));
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(config.ai.max_tokens, 120);
        assert_eq!(config.ai.max_input_chars, 6000);
        assert!((config.ai.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.scrub, ScrubRules::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [server]
            bind = "0.0.0.0:9000"
            static_dir = "/srv/mailbrief/static"
            max_upload_bytes = 1048576

            [ai]
            api_key = "sk-from-file"
            endpoint = "http://localhost:11434/v1/chat/completions"
            model = "llama3"
            temperature = 0.0
            max_tokens = 256

            [scrub]
            footer_markers = ["unsubscribe", "sent from my iphone"]
        "#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(
            config.server.bind_addr().unwrap(),
            "0.0.0.0:9000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.server.max_upload_bytes, 1_048_576);
        assert_eq!(config.ai.api_key.as_deref(), Some("sk-from-file"));
        assert_eq!(config.ai.model, "llama3");
        assert_eq!(config.ai.max_tokens, 256);
        // Unset keys keep their defaults
        assert_eq!(config.ai.max_input_chars, 6000);
        assert_eq!(config.scrub.banner_keywords, vec!["cyber", "safety"]);
        assert_eq!(config.scrub.footer_markers.len(), 2);
    }

    #[test]
    fn test_invalid_bind() {
        let config = Config::parse("[server]\nbind = \"not an address\"").unwrap();
        assert!(matches!(
            config.server.bind_addr(),
            Err(ConfigError::InvalidBind(_))
        ));
    }

    #[test]
    fn test_load_from_file_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ai\nmodel = ").unwrap();

        assert!(matches!(
            Config::load_from(file.path()),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            Config::load_from(Path::new("/nonexistent/mailbrief.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_resolve_api_key() {
        assert_eq!(
            resolve_api_key(Some("sk-env".to_string()), Some("sk-file")).unwrap(),
            "sk-env"
        );
        assert_eq!(
            resolve_api_key(Some("   ".to_string()), Some("sk-file")).unwrap(),
            "sk-file"
        );
        assert!(matches!(
            resolve_api_key(None, None),
            Err(ConfigError::MissingApiKey("OPENAI_API_KEY"))
        ));
        assert!(matches!(
            resolve_api_key(Some(String::new()), Some("")),
            Err(ConfigError::MissingApiKey(_))
        ));
    }
}
