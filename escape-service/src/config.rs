use std::sync::Arc;
use std::time::Duration;

use escape_flow::{GeminiModel, GenerativeModel, RetryPolicy};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("provider {0} is not available in this build")]
    UnsupportedProvider(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    Gemini { api_key: String, model: Option<String> },
    OpenRouter { api_key: String, model: Option<String> },
}

/// Everything the service reads from the environment, once, at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub port: u16,
    pub provider: ProviderConfig,
    pub retry: RetryPolicy,
    /// Where login notifications are forwarded, if anywhere.
    pub notify_forward_url: Option<String>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let provider = match non_empty("ESCAPE_PROVIDER").as_deref() {
            None | Some("gemini") => ProviderConfig::Gemini {
                api_key: non_empty("GEMINI_API_KEY")
                    .or_else(|| non_empty("API_KEY"))
                    .ok_or(ConfigError::Missing("GEMINI_API_KEY"))?,
                model: non_empty("GEMINI_MODEL"),
            },
            Some("openrouter") => ProviderConfig::OpenRouter {
                api_key: non_empty("OPENROUTER_API_KEY")
                    .ok_or(ConfigError::Missing("OPENROUTER_API_KEY"))?,
                model: non_empty("OPENROUTER_MODEL"),
            },
            Some(other) => return Err(ConfigError::UnsupportedProvider(other.to_string())),
        };

        let port = parse_or("PORT", non_empty("PORT"), 3000u16)?;
        let retries = parse_or(
            "ESCAPE_RETRIES",
            non_empty("ESCAPE_RETRIES"),
            RetryPolicy::DEFAULT_RETRIES,
        )?;
        let backoff_ms = parse_or(
            "ESCAPE_BACKOFF_MS",
            non_empty("ESCAPE_BACKOFF_MS"),
            RetryPolicy::DEFAULT_BACKOFF.as_millis() as u64,
        )?;

        Ok(Self {
            port,
            provider,
            retry: RetryPolicy::new(retries, Duration::from_millis(backoff_ms)),
            notify_forward_url: non_empty("NOTIFY_FORWARD_URL"),
        })
    }

    pub fn build_model(&self) -> Result<Arc<dyn GenerativeModel>, ConfigError> {
        match &self.provider {
            ProviderConfig::Gemini { api_key, model } => {
                let mut gemini = GeminiModel::new(api_key.clone());
                if let Some(model) = model {
                    gemini = gemini.with_model(model.clone());
                }
                Ok(Arc::new(gemini))
            }
            #[cfg(feature = "rig")]
            ProviderConfig::OpenRouter { api_key, model } => {
                let mut rig = escape_flow::RigModel::new(api_key);
                if let Some(model) = model {
                    rig = rig.with_model(model.clone());
                }
                Ok(Arc::new(rig))
            }
            #[cfg(not(feature = "rig"))]
            ProviderConfig::OpenRouter { .. } => {
                Err(ConfigError::UnsupportedProvider("openrouter".to_string()))
            }
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
