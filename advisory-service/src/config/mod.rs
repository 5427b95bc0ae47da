use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

use crate::services::advisor::DEFAULT_EXTERNAL_TIMEOUT;
use crate::services::providers::gemini::GEMINI_API_BASE;

/// Credential value shipped in sample `.env` files; treated as absent.
pub const PLACEHOLDER_API_KEY: &str = "your_gemini_api_key_here";

#[derive(Debug, Clone)]
pub struct AdvisoryConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub advisory: AdvisorySettings,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// Already filtered: `None` when the key is unset, blank or the placeholder.
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub api_base: String,
}

#[derive(Debug, Clone)]
pub struct AdvisorySettings {
    /// Upper bound on one external call before the fallback is served.
    pub external_timeout: Duration,
}

impl AdvisoryConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let timeout_secs = get_env(
            "ADVISORY_EXTERNAL_TIMEOUT_SECS",
            Some(&DEFAULT_EXTERNAL_TIMEOUT.as_secs().to_string()),
            is_prod,
        )?;

        Ok(AdvisoryConfig {
            common: common_config,
            gemini: GeminiSettings {
                api_key: resolve_api_key(env::var("GEMINI_API_KEY").ok()),
                model: get_env("GEMINI_MODEL", Some("gemini-1.5-flash"), is_prod)?,
                api_base: get_env("GEMINI_API_BASE", Some(GEMINI_API_BASE), is_prod)?,
            },
            advisory: AdvisorySettings {
                external_timeout: parse_timeout(&timeout_secs)?,
            },
        })
    }
}

/// Drop absent, blank and placeholder credentials.
pub fn resolve_api_key(raw: Option<String>) -> Option<Secret<String>> {
    raw.map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty() && key != PLACEHOLDER_API_KEY)
        .map(Secret::new)
}

fn parse_timeout(value: &str) -> Result<Duration, AppError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(AppError::ConfigError(anyhow::anyhow!(
            "ADVISORY_EXTERNAL_TIMEOUT_SECS must be a positive number of seconds, got {:?}",
            value
        ))),
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
