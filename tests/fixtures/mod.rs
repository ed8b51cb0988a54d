#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use eduapi::clock::Clock;
use eduapi::providers::{GenerateContentRequest, GenerateContentResponse, Transport};
use eduapi::{Error, GatewayConfig, RateLimiterConfig};

pub const TEST_KEY: &str = "AbCdEfGhIjKlMnOpQrStUvWxYz012345";

/// Clock the test moves by hand
#[derive(Debug, Clone, Default)]
pub struct ManualClock
{   now: Arc<AtomicU64>
}

impl ManualClock
{   pub fn at(ms: u64) -> Self
    {   ManualClock
        {   now: Arc::new(AtomicU64::new(ms))
        }
    }

    pub fn advance(&self, ms: u64)
    {   self.now.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock
{   fn now_ms(&self) -> u64
    {   self.now.load(Ordering::Relaxed)
    }
}

/// What the mock upstream does with each request
pub enum Script
{   /// Answer with one text part
    Text(String)
  , /// Answer with this envelope
    Envelope(GenerateContentResponse)
  , /// Fail with this status
    Status(u16)
  , /// Never answer
    Hang
  , /// Answer with text once the gate opens
    Gated(Arc<Notify>, String)
}

/// Sets its flag when dropped, i.e. when the call future is cancelled
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag
{   fn drop(&mut self)
    {   self.0.store(true, Ordering::SeqCst);
    }
}

pub struct MockTransport
{   script: Script
  , calls: AtomicUsize
  , cancelled: Arc<AtomicBool>
  , last_request: Mutex<Option<GenerateContentRequest>>
  , last_key: Mutex<Option<String>>
}

impl MockTransport
{   pub fn new(script: Script) -> Self
    {   MockTransport
        {   script
          , calls: AtomicUsize::new(0)
          , cancelled: Arc::new(AtomicBool::new(false))
          , last_request: Mutex::new(None)
          , last_key: Mutex::new(None)
        }
    }

    pub fn text(text: &str) -> Self
    {   MockTransport::new(Script::Text(text.to_string()))
    }

    pub fn calls(&self) -> usize
    {   self.calls.load(Ordering::SeqCst)
    }

    pub fn was_cancelled(&self) -> bool
    {   self.cancelled.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerateContentRequest>
    {   self.last_request.lock().unwrap().clone()
    }

    pub fn last_key(&self) -> Option<String>
    {   self.last_key.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport
{   async fn generate(
      &self
    , api_key: &str
    , request: &GenerateContentRequest
    ) -> Result<GenerateContentResponse, Error>
    {   self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        *self.last_key.lock().unwrap() = Some(api_key.to_string());

        match &self.script
        {   Script::Text(text) => Ok(GenerateContentResponse::from_text(text.clone()))
          , Script::Envelope(envelope) => Ok(envelope.clone())
          , Script::Status(status) => Err(Error::from_status(*status))
          , Script::Hang => {
              let _flag = DropFlag(Arc::clone(&self.cancelled));
              std::future::pending::<Result<GenerateContentResponse, Error>>().await
            }
          , Script::Gated(gate, text) => {
              gate.notified().await;
              Ok(GenerateContentResponse::from_text(text.clone()))
            }
        }
    }
}

pub fn config() -> GatewayConfig
{   GatewayConfig::default().with_api_key(TEST_KEY)
}

pub fn config_with_quota(max_requests: usize, window_ms: u64) -> GatewayConfig
{   GatewayConfig
    {   rate_limit: RateLimiterConfig { max_requests, window_ms }
      , ..config()
    }
}
