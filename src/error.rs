use std::fmt;

/// Custom error type for gateway operations
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// No API key configured
    MissingApiKey
  , /// Invalid configuration (malformed key, zero limits, ...)
    InvalidConfiguration(String)
  , /// Prompt rejected before any network activity
    InvalidInput(String)
  , /// Local rate limiter refused admission
    RateLimitExceeded { retry_after_ms: u64 }
  , /// Caller called again inside the cooldown
    CooldownActive { retry_after_ms: u64 }
  , /// HTTP request error
    HttpError(String)
  , /// Upstream answered 429
    UpstreamRateLimited
  , /// Upstream answered 403
    Forbidden
  , /// Upstream answered some other non-success status
    ApiError { status: u16 }
  , /// Timeout error
    Timeout
  , /// Response carried no generated text
    EmptyResponse
  , /// Failed to parse API response
    ParseError(String)
  , /// Parsed JSON lacks fields the schema requires
    MissingRequiredFields(Vec<String>)
  , /// Generic error
    Other(String)
}

/// Where in the call pipeline a failure belongs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind
{   Configuration
  , InputRejection
  , Quota
  , Transport
  , ContractViolation
}

impl Error
{   pub fn kind(&self) -> ErrorKind
    {   match self
        {   Error::MissingApiKey
          | Error::InvalidConfiguration(_) => ErrorKind::Configuration
          , Error::InvalidInput(_) => ErrorKind::InputRejection
          , Error::RateLimitExceeded { .. }
          | Error::CooldownActive { .. } => ErrorKind::Quota
          , Error::HttpError(_)
          | Error::UpstreamRateLimited
          | Error::Forbidden
          | Error::ApiError { .. }
          | Error::Timeout
          | Error::Other(_) => ErrorKind::Transport
          , Error::EmptyResponse
          | Error::ParseError(_)
          | Error::MissingRequiredFields(_) => ErrorKind::ContractViolation
        }
    }

    /// Classify a non-success upstream status
    pub fn from_status(status: u16) -> Self
    {   match status
        {   429 => Error::UpstreamRateLimited
          , 403 => Error::Forbidden
          , _ => Error::ApiError { status }
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::MissingApiKey => {
              write!(f, "Invalid or missing API key configuration")
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::InvalidInput(msg) => {
              write!(f, "Invalid input provided to API: {}", msg)
            }
          , Error::RateLimitExceeded { retry_after_ms } => {
              write!(f,
                "Rate limit exceeded. Try again in {} seconds.",
                retry_after_ms.div_ceil(1000)
              )
            }
          , Error::CooldownActive { retry_after_ms } => {
              write!(f,
                "Called again too soon; wait {} ms",
                retry_after_ms
              )
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::UpstreamRateLimited => {
              write!(f, "API rate limit exceeded")
            }
          , Error::Forbidden => {
              write!(f, "API access forbidden - check API key")
            }
          , Error::ApiError { status } => {
              write!(f, "API request failed with status: {}", status)
            }
          , Error::Timeout => {
              write!(f, "API request timed out")
            }
          , Error::EmptyResponse => {
              write!(f, "Invalid response structure from API")
            }
          , Error::ParseError(msg) => {
              write!(f, "Failed to parse JSON response: {}", msg)
            }
          , Error::MissingRequiredFields(fields) => {
              write!(f,
                "Response missing required fields: {}",
                fields.join(", ")
              )
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn status_classification()
    {   assert_eq!(Error::from_status(429), Error::UpstreamRateLimited);
        assert_eq!(Error::from_status(403), Error::Forbidden);
        assert_eq!(
          Error::from_status(500),
          Error::ApiError { status: 500 }
        );
        assert_eq!(Error::from_status(500).kind(), ErrorKind::Transport);
    }

    #[test]
    fn rate_limit_message_rounds_up_to_seconds()
    {   let e = Error::RateLimitExceeded { retry_after_ms: 1001 };
        assert_eq!(
          e.to_string(),
          "Rate limit exceeded. Try again in 2 seconds."
        );
        assert_eq!(e.kind(), ErrorKind::Quota);
    }
}
