// src/config.rs
use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result};

pub const DEFAULT_OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct:free";

/// Server settings, read from the environment (and `.env`, when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub openrouter_api_key: Option<String>,
    pub openrouter_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout: Duration,
    pub session_ttl: Duration,
    pub history_limit: usize,
    pub static_dir: PathBuf,
    pub portfolio_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            openrouter_api_key: None,
            openrouter_url: DEFAULT_OPENROUTER_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 500,
            request_timeout: Duration::from_secs(30),
            session_ttl: Duration::from_secs(2 * 60 * 60),
            history_limit: 10,
            static_dir: PathBuf::from("static"),
            portfolio_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", defaults.port)?,
            openrouter_api_key: get("OPENROUTER_API_KEY"),
            openrouter_url: get("OPENROUTER_URL").unwrap_or(defaults.openrouter_url),
            model: get("OPENROUTER_MODEL").unwrap_or(defaults.model),
            temperature: parse_or(&get, "CHAT_TEMPERATURE", defaults.temperature)?,
            max_tokens: parse_or(&get, "CHAT_MAX_TOKENS", defaults.max_tokens)?,
            request_timeout: Duration::from_secs(parse_or(
                &get,
                "CHAT_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            session_ttl: Duration::from_secs(parse_or(
                &get,
                "SESSION_TTL_SECS",
                defaults.session_ttl.as_secs(),
            )?),
            history_limit: parse_or(&get, "HISTORY_LIMIT", defaults.history_limit)?,
            static_dir: get("STATIC_DIR").map(PathBuf::from).unwrap_or(defaults.static_dir),
            portfolio_path: get("PORTFOLIO_PATH").map(PathBuf::from),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}
