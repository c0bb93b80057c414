use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:poll_guide_bot.db";
pub const DEFAULT_LLM_ENDPOINT: &str = "https://api.deepseek.com/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "deepseek-chat";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub llm_endpoint: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_timeout: Duration,
    pub translate_endpoint: String,
    pub translate_api_key: String,
    pub source_lang: String,
    pub pivot_lang: String,
}

impl Config {
    /// Reads the process environment (call `dotenvy::dotenv()` first to pick up `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).filter(|v| !v.is_empty()).ok_or(ConfigError::Missing(name));
        let or_default = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let llm_timeout = match lookup("LLM_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid { name: "LLM_TIMEOUT_SECS", value })?,
            None => Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
        };

        Ok(Self {
            discord_token: required("DISCORD_TOKEN")?,
            database_url: or_default("DATABASE_URL", DEFAULT_DATABASE_URL),
            llm_endpoint: or_default("LLM_ENDPOINT", DEFAULT_LLM_ENDPOINT),
            llm_api_key: required("LLM_API_KEY")?,
            llm_model: or_default("LLM_MODEL", DEFAULT_LLM_MODEL),
            llm_timeout,
            translate_endpoint: or_default("TRANSLATE_ENDPOINT", crate::gateway::google::DEFAULT_ENDPOINT),
            translate_api_key: required("TRANSLATE_API_KEY")?,
            source_lang: or_default("GUIDE_SOURCE_LANG", "ko"),
            pivot_lang: or_default("GUIDE_PIVOT_LANG", "en"),
        })
    }
}
