//! Configuration for the gateway, its rate limiter and the call throttle

use serde::{Deserialize, Serialize};
use log::{debug, warn};

pub const DEFAULT_API_BASE: &str
  = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_COOLDOWN_MS: u64 = 1_000;

/// Environment variables consulted by [`GatewayConfig::from_env`]
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const LEGACY_API_KEY_ENV: &str = "VITE_GEMINI_API_KEY";
pub const MODEL_ENV: &str = "GEMINI_MODEL";
pub const API_BASE_ENV: &str = "GEMINI_API_BASE";

/// Sliding-window quota
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimiterConfig
{   /// Admissions allowed per window
    pub max_requests: usize
  , /// Window length in milliseconds
    pub window_ms: u64
}

impl Default for RateLimiterConfig
{   fn default() -> Self
    {   RateLimiterConfig
        {   max_requests: crate::rate_limiter::DEFAULT_MAX_REQUESTS
          , window_ms: crate::rate_limiter::DEFAULT_WINDOW_MS
        }
    }
}

impl RateLimiterConfig
{   pub fn validate(&self) -> Result<(), crate::error::Error>
    {   if self.max_requests == 0
        {   return Err(crate::error::Error::InvalidConfiguration(
              "max_requests must be positive".to_string()
            ));
        }
        if self.window_ms == 0
        {   return Err(crate::error::Error::InvalidConfiguration(
              "window_ms must be positive".to_string()
            ));
        }
        Ok(())
    }
}

/// Gateway configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig
{   /// API key for the generative-language service
    pub api_key: Option<String>
  , /// API base URL
    pub api_base: String
  , /// Model name used in the endpoint path
    pub model: String
  , /// Hard timeout for one outbound request
    pub timeout_ms: u64
  , /// Reject prompts that fail the educational-input whitelist
    pub validate_prompt: bool
  , /// Sliding-window quota
    pub rate_limit: RateLimiterConfig
  , /// Minimum gap between caller-side calls
    pub cooldown_ms: u64
}

impl Default for GatewayConfig
{   fn default() -> Self
    {   GatewayConfig
        {   api_key: None
          , api_base: DEFAULT_API_BASE.to_string()
          , model: DEFAULT_MODEL.to_string()
          , timeout_ms: DEFAULT_TIMEOUT_MS
          , validate_prompt: true
          , rate_limit: RateLimiterConfig::default()
          , cooldown_ms: DEFAULT_COOLDOWN_MS
        }
    }
}

// Hand-written so the key never shows up in `{:?}` output.
impl std::fmt::Debug for GatewayConfig
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {   f.debug_struct("GatewayConfig")
          .field("api_key", &self.api_key.as_ref().map(|_| "***"))
          .field("api_base", &self.api_base)
          .field("model", &self.model)
          .field("timeout_ms", &self.timeout_ms)
          .field("validate_prompt", &self.validate_prompt)
          .field("rate_limit", &self.rate_limit)
          .field("cooldown_ms", &self.cooldown_ms)
          .finish()
    }
}

impl GatewayConfig
{   /// Defaults overlaid with whatever the environment provides
    pub fn from_env() -> Self
    {   let mut config = GatewayConfig::default();
        config.api_key = std::env::var(API_KEY_ENV)
          .or_else(|_| std::env::var(LEGACY_API_KEY_ENV))
          .ok();
        if config.api_key.is_none()
        {   warn!("Neither {} nor {} is set", API_KEY_ENV, LEGACY_API_KEY_ENV);
        }
        if let Ok(model) = std::env::var(MODEL_ENV)
        {   config.model = model;
        }
        if let Ok(base) = std::env::var(API_BASE_ENV)
        {   config.api_base = base;
        }
        debug!("Loaded config: {:?}", config);
        config
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self
    {   self.api_key = Some(key.into());
        self
    }

    /// Check the numeric settings. The key is checked per call so
    /// a bad key fails closed without preventing construction.
    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   if self.timeout_ms == 0
        {   return Err(crate::error::Error::InvalidConfiguration(
              "timeout_ms must be positive".to_string()
            ));
        }
        if self.api_base.is_empty() || self.model.is_empty()
        {   return Err(crate::error::Error::InvalidConfiguration(
              "api_base and model must be set".to_string()
            ));
        }
        self.rate_limit.validate()
    }
}
