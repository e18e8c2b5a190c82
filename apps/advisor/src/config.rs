use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_API_URL;
use crate::recommendation::orchestrator::{DEFAULT_MODELS, DEFAULT_TIMEOUT};

/// The completion API credential. Absence is a normal, typed state: the service
/// still starts and serves template recommendations.
#[derive(Clone, PartialEq)]
pub enum Credential {
    ApiKey(String),
    Missing,
}

impl Credential {
    fn from_option(value: Option<String>) -> Self {
        match value.map(|v| v.trim().to_string()) {
            Some(key) if !key.is_empty() => Credential::ApiKey(key),
            _ => Credential::Missing,
        }
    }

    /// First and last four characters only, for startup logs.
    pub fn masked(&self) -> Option<String> {
        match self {
            Credential::ApiKey(key) => {
                let chars: Vec<char> = key.chars().collect();
                if chars.len() <= 8 {
                    return Some("****".to_string());
                }
                let head: String = chars[..4].iter().collect();
                let tail: String = chars[chars.len() - 4..].iter().collect();
                Some(format!("{head}...{tail}"))
            }
            Credential::Missing => None,
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.masked() {
            Some(masked) => write!(f, "ApiKey({masked})"),
            None => f.write_str("Missing"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Only malformed values fail startup; a missing API key does not.
#[derive(Debug, Clone)]
pub struct Config {
    pub credential: Credential,
    pub port: u16,
    pub rust_log: String,
    pub catalog_path: PathBuf,
    pub llm_api_url: String,
    pub llm_models: Vec<String>,
    pub llm_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let api_key = non_empty_env("TOGETHER_API_KEY")
            .or_else(|| non_empty_env("API_KEY"))
            .or_else(|| api_key_from_args(std::env::args()));

        Ok(Config {
            credential: Credential::from_option(api_key),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            catalog_path: std::env::var("CATALOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/insurance_products.csv")),
            llm_api_url: std::env::var("LLM_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            llm_models: std::env::var("LLM_MODELS")
                .ok()
                .map(|raw| parse_model_list(&raw))
                .filter(|models| !models.is_empty())
                .unwrap_or_else(|| DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()),
            llm_timeout: match std::env::var("LLM_TIMEOUT_SECS") {
                Ok(raw) => Duration::from_secs(
                    raw.parse::<u64>()
                        .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
                ),
                Err(_) => DEFAULT_TIMEOUT,
            },
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Looks for `--api-key=VALUE` among process arguments.
fn api_key_from_args(args: impl IntoIterator<Item = String>) -> Option<String> {
    args.into_iter()
        .find_map(|arg| arg.strip_prefix("--api-key=").map(str::to_string))
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}
