//! Configuration management
//!
//! Settings are resolved in this order (first wins):
//! 1. Environment variables
//! 2. `chat-relay.toml` (or an explicit path)
//! 3. Default values
//!
//! `${VAR_NAME}` inside the TOML file is expanded from the environment.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "chat-relay.toml";

/// Completion API dialect
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions API
    #[default]
    OpenAi,
    /// Anthropic messages API
    Claude,
}

impl LlmProvider {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" | "open_ai" | "" => Ok(Self::OpenAi),
            "claude" | "anthropic" => Ok(Self::Claude),
            other => Err(Error::Config(format!("Unknown LLM provider: {}", other))),
        }
    }

    /// Base URL used when none is configured
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Claude => "https://api.anthropic.com/v1",
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider credential
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// API dialect
    pub provider: LlmProvider,

    /// Custom endpoint
    pub base_url: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum output tokens
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            provider: LlmProvider::default(),
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins. `None` or an entry of `"*"` allows any origin.
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: None,
        }
    }
}

impl ServerConfig {
    /// Whether cross-origin requests from any origin are accepted
    pub fn is_cors_permissive(&self) -> bool {
        match &self.allowed_origins {
            None => true,
            Some(origins) => origins.is_empty() || origins.iter().any(|o| o == "*"),
        }
    }
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Main configuration for the relay
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub server: ServerConfig,
}

/// TOML file layout; every field is optional
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    llm: Option<TomlLlm>,
    server: Option<TomlServer>,
}

#[derive(Debug, Default, Deserialize)]
struct TomlLlm {
    api_key: Option<String>,
    model: Option<String>,
    provider: Option<String>,
    base_url: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct TomlServer {
    host: Option<String>,
    port: Option<u16>,
    allowed_origins: Option<Vec<String>>,
}

impl Config {
    /// Load `.env` into the environment, then read the default config file
    /// if present, otherwise the environment alone
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_toml_file(DEFAULT_CONFIG_FILE);
        }
        Self::from_env()
    }

    /// Build configuration from process environment variables only
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file, expanding `${VAR}` references, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;
        let lookup = |key: &str| std::env::var(key).ok();
        let mut config = Self::from_toml_str(&content, &lookup)?;
        config.apply_overrides(&lookup)?;
        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn from_toml_str<F>(content: &str, lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expanded = expand_env_vars(content, lookup);
        let toml: TomlConfig = toml::from_str(&expanded)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        let llm = toml.llm.unwrap_or_default();
        let provider = match llm.provider {
            Some(p) => LlmProvider::parse(&p)?,
            None => LlmProvider::default(),
        };
        let server = toml.server.unwrap_or_default();

        Ok(Self {
            llm: LlmConfig {
                api_key: llm.api_key.unwrap_or_default(),
                model: llm.model.unwrap_or_else(default_model),
                provider,
                base_url: llm.base_url,
                temperature: llm.temperature.unwrap_or_else(default_temperature),
                max_tokens: llm.max_tokens.unwrap_or_else(default_max_tokens),
            },
            server: ServerConfig {
                host: server.host.unwrap_or_else(default_host),
                port: server.port.unwrap_or_else(default_port),
                allowed_origins: server.allowed_origins,
            },
        })
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("LLM_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.llm.api_key = key;
        }
        if let Some(model) = lookup("MODEL_NAME") {
            self.llm.model = model;
        }
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = LlmProvider::parse(&provider)?;
        }
        if let Some(url) = lookup("LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(value) = lookup("TEMPERATURE") {
            self.llm.temperature = parse_number("TEMPERATURE", &value)?;
        }
        if let Some(value) = lookup("MAX_TOKENS") {
            self.llm.max_tokens = parse_number("MAX_TOKENS", &value)?;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(value) = lookup("PORT") {
            self.server.port = parse_number("PORT", &value)?;
        }
        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.server.allowed_origins = Some(
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            );
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.llm.api_key.trim().is_empty() {
            return Err(Error::Config(
                "LLM_API_KEY (or OPENAI_API_KEY) must be set".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective provider base URL
    pub fn base_url(&self) -> &str {
        self.llm
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.llm.provider.default_base_url())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {} value {:?}: {}", key, value, e)))
}

/// Replace `${VAR_NAME}` with the variable's value (empty if unset)
fn expand_env_vars<F>(value: &str, lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_name.push(c);
            }
            if let Some(env_value) = lookup(&var_name) {
                result.push_str(&env_value);
            }
        } else {
            result.push(c);
        }
    }

    result
}
