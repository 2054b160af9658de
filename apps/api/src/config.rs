use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::models::params::{
    GenerationParams, LanguageLevel, ThinkingLevel, DEFAULT_MAIN_AGENT_MODEL,
    DEFAULT_MAX_WORDS, DEFAULT_SUB_AGENT_MODEL,
};
use crate::models::research::MinimumSuccessPolicy;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or unparsable.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub tavily_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Run defaults; CLI flags and form fields override per run.
    pub defaults: GenerationParams,
    pub task_timeout: Duration,
    pub research_budget: Duration,
    pub min_research_successes: MinimumSuccessPolicy,
    /// When set, full task outputs are written here instead of the console.
    pub agent_output_log: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = GenerationParams {
            sub_agent_model: optional_env("SUB_AGENT_MODEL")
                .unwrap_or_else(|| DEFAULT_SUB_AGENT_MODEL.to_string()),
            main_agent_model: optional_env("MAIN_AGENT_MODEL")
                .unwrap_or_else(|| DEFAULT_MAIN_AGENT_MODEL.to_string()),
            thinking_level: parse_env("THINKING_LEVEL", ThinkingLevel::default())?,
            language_level: parse_env("LANGUAGE_LEVEL", LanguageLevel::default())?,
            use_advanced_extraction: parse_bool_env("TAVILY_ADVANCED", false)?,
            max_words: parse_env("MAX_WORDS", DEFAULT_MAX_WORDS)?,
        };
        defaults
            .validate()
            .context("MAX_WORDS is out of range")?;

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            tavily_api_key: require_env("TAVILY_API_KEY")?,
            port: parse_env("PORT", 8080u16)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            defaults,
            task_timeout: Duration::from_secs(parse_env("TASK_TIMEOUT_SECS", 90u64)?),
            research_budget: Duration::from_secs(parse_env("RESEARCH_BUDGET_SECS", 180u64)?),
            min_research_successes: parse_env(
                "MIN_RESEARCH_SUCCESSES",
                MinimumSuccessPolicy::default(),
            )?,
            agent_output_log: optional_env("AGENT_OUTPUT_LOG").map(PathBuf::from),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values read as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => parse_value(key, &raw),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| anyhow!("{key} has an invalid value '{raw}': {e}"))
}

fn parse_bool_env(key: &str, default: bool) -> Result<bool> {
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => parse_bool(key, &raw),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("{key} must be a boolean, got '{raw}'")),
    }
}
