use std::str::FromStr;

use crate::app_config::{AppConfig, Environment, LlmSettings};
use crate::ConfigError;

const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a plain map.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("EIA_ENV", "development"));
    let bind_addr: SocketAddr = parse_var("EIA_BIND_ADDR", &or_default("EIA_BIND_ADDR", "0.0.0.0:5010"))?;
    let log_level = or_default("EIA_LOG_LEVEL", "info");
    let cors_origin = optional("EIA_CORS_ORIGIN");
    let catalog_path = PathBuf::from(or_default("EIA_CATALOG_PATH", "./config/catalog.yaml"));

    let db_max_connections = parse_var("EIA_DB_MAX_CONNECTIONS", &or_default("EIA_DB_MAX_CONNECTIONS", "10"))?;
    let db_min_connections = parse_var("EIA_DB_MIN_CONNECTIONS", &or_default("EIA_DB_MIN_CONNECTIONS", "1"))?;
    let db_acquire_timeout_secs = parse_var(
        "EIA_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("EIA_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    let temperature: f32 = parse_var("EIA_LLM_TEMPERATURE", &or_default("EIA_LLM_TEMPERATURE", "0.7"))?;
    if !(0.0..=2.0).contains(&temperature) {
        return Err(ConfigError::InvalidEnvVar {
            var: "EIA_LLM_TEMPERATURE".to_string(),
            reason: format!("must be between 0.0 and 2.0, got {temperature}"),
        });
    }

    let llm = LlmSettings {
        api_key: optional("OPENAI_API_KEY"),
        base_url: or_default("EIA_LLM_BASE_URL", DEFAULT_LLM_BASE_URL),
        model: or_default("EIA_LLM_MODEL", DEFAULT_LLM_MODEL),
        temperature,
        max_tokens: parse_var("EIA_LLM_MAX_TOKENS", &or_default("EIA_LLM_MAX_TOKENS", "1000"))?,
        timeout_secs: parse_var("EIA_LLM_TIMEOUT_SECS", &or_default("EIA_LLM_TIMEOUT_SECS", "60"))?,
        max_retries: parse_var("EIA_LLM_MAX_RETRIES", &or_default("EIA_LLM_MAX_RETRIES", "2"))?,
    };

    let recent_analysis_hours = parse_var(
        "EIA_RECENT_ANALYSIS_HOURS",
        &or_default("EIA_RECENT_ANALYSIS_HOURS", "24"),
    )?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        cors_origin,
        catalog_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        llm,
        recent_analysis_hours,
    })
}

fn parse_var<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
