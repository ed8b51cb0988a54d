//! The secure call pipeline between learning widgets and the
//! generative-language service.
//!
//! Every step can reject. [`SecureGateway::try_call_gemini`] reports
//! which one did; [`SecureGateway::call_gemini`] logs it and collapses
//! all failures to `None`, which is all widgets ever look at.

use std::time::Duration;
use log::{debug, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::GatewayConfig;
use crate::error::{Error, ErrorKind};
use crate::providers::{GeminiClient, GenerateContentRequest, Transport};
use crate::rate_limiter::RateLimiter;
use crate::request::ApiResponse;
use crate::schema::ResponseSchema;
use crate::security;

pub struct SecureGateway<T: Transport = GeminiClient, C: Clock = SystemClock>
{   api_key: Option<String>
  , validate_prompt: bool
  , timeout: Duration
  , limiter: RateLimiter<C>
  , transport: T
}

impl SecureGateway<GeminiClient, SystemClock>
{   /// HTTP transport and wall clock, both from `config`
    pub fn from_config(config: &GatewayConfig) -> Result<Self, Error>
    {   SecureGateway::new(config, GeminiClient::from_config(config))
    }
}

impl<T: Transport> SecureGateway<T, SystemClock>
{   pub fn new(config: &GatewayConfig, transport: T) -> Result<Self, Error>
    {   SecureGateway::with_clock(config, transport, SystemClock)
    }
}

impl<T: Transport, C: Clock> SecureGateway<T, C>
{   pub fn with_clock(
      config: &GatewayConfig
    , transport: T
    , clock: C
    ) -> Result<Self, Error>
    {   config.validate()?;
        debug!("Creating SecureGateway: {:?}", config);
        Ok(SecureGateway
        {   api_key: config.api_key.clone()
          , validate_prompt: config.validate_prompt
          , timeout: Duration::from_millis(config.timeout_ms)
          , limiter: RateLimiter::with_config(&config.rate_limit, clock)?
          , transport
        })
    }

    pub fn limiter(&self) -> &RateLimiter<C>
    {   &self.limiter
    }

    pub fn transport(&self) -> &T
    {   &self.transport
    }

    /// Run the pipeline; `None` on any rejection
    pub async fn call_gemini(
      &self
    , prompt: &str
    , schema: Option<&ResponseSchema>
    ) -> Option<ApiResponse>
    {   match self.try_call_gemini(prompt, schema).await
        {   Ok(response) => Some(response)
          , Err(e) => {
              match e.kind()
              {   ErrorKind::Configuration => {
                    warn!("Refusing call, configuration: {}", e)
                  }
                , ErrorKind::InputRejection => {
                    warn!("Refusing call, input: {}", e)
                  }
                , ErrorKind::Quota => warn!("{}", e)
                , ErrorKind::Transport => {
                    warn!("API request failed: {}", e)
                  }
                , ErrorKind::ContractViolation => {
                    warn!("Discarding response: {}", e)
                  }
              }
              None
            }
        }
    }

    /// Same pipeline with the failure reason kept
    pub async fn try_call_gemini(
      &self
    , prompt: &str
    , schema: Option<&ResponseSchema>
    ) -> Result<ApiResponse, Error>
    {   let api_key = self.checked_api_key()?;

        let prompt = security::sanitize_input(prompt);
        if prompt.trim().is_empty()
        {   return Err(Error::InvalidInput(
              "prompt is empty after sanitization".to_string()
            ));
        }
        if self.validate_prompt
        {   let outcome = security::validate_educational_input(&prompt);
            if !outcome.valid
            {   return Err(Error::InvalidInput(outcome.reason));
            }
        }

        if !self.limiter.can_make_request()
        {   return Err(Error::RateLimitExceeded
            {   retry_after_ms: self.limiter.time_until_reset()
            });
        }

        let request = GenerateContentRequest::new(&prompt, schema);
        trace!(
          "Request built: {} chars, structured: {}",
          prompt.len(), schema.is_some()
        );

        // Dropping the transport future on expiry cancels the call.
        let envelope = tokio::time::timeout(
            self.timeout,
            self.transport.generate(api_key, &request)
          )
          .await
          .map_err(|_| Error::Timeout)??;

        let text = envelope.first_text().ok_or(Error::EmptyResponse)?;
        let text = security::sanitize_input(text);

        match schema
        {   None => {
              debug!("Returning {} chars of text", text.len());
              Ok(ApiResponse::Text(text))
            }
          , Some(schema) => {
              let value = schema.parse_response(&text)?;
              debug!("Returning structured response");
              Ok(ApiResponse::Json(value))
            }
        }
    }

    fn checked_api_key(&self) -> Result<&str, Error>
    {   let key = self.api_key.as_deref();
        let outcome = security::validate_api_key(key);
        match key
        {   Some(key) if outcome.valid => Ok(key)
          , None => Err(Error::MissingApiKey)
          , Some(_) => Err(Error::InvalidConfiguration(outcome.reason))
        }
    }
}
