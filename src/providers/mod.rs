//! Outbound transports to the generative-language service
//!
//! The gateway only needs "send prompt+config, get the envelope or a
//! classified failure"; anything that can do that implements
//! [`Transport`].

pub mod gemini;

use async_trait::async_trait;

// Re-export for convenience
pub use gemini::{
  GeminiClient, GenerateContentRequest, GenerateContentResponse
};

#[async_trait]
pub trait Transport: Send + Sync
{   /// Send one request. Non-success statuses come back as
    /// [`crate::error::Error::from_status`] values.
    async fn generate(
      &self
    , api_key: &str
    , request: &GenerateContentRequest
    ) -> Result<GenerateContentResponse, crate::error::Error>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T>
{   async fn generate(
      &self
    , api_key: &str
    , request: &GenerateContentRequest
    ) -> Result<GenerateContentResponse, crate::error::Error>
    {   (**self).generate(api_key, request).await
    }
}
