//! Caller-side guard above the gateway
//!
//! A plain cooldown against double submission, separate from the
//! gateway's sliding-window quota, plus the loading/error state a
//! widget renders.

use std::sync::{Arc, Mutex, MutexGuard};
use log::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::Error;
use crate::gateway::SecureGateway;
use crate::providers::{GeminiClient, Transport};
use crate::request::ApiResponse;
use crate::schema::ResponseSchema;

pub const COOLDOWN_MESSAGE: &str
  = "Please wait a moment before making another request.";
pub const FAILED_MESSAGE: &str
  = "Unable to process your request. Please try again.";

/// Snapshot of what a widget shows while a call runs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallStatus
{   pub is_loading: bool
  , pub error: Option<String>
}

#[derive(Debug, Default)]
struct ThrottleState
{   last_call_ms: Option<u64>
  , in_flight: usize
  , error: Option<String>
}

fn lock_state(state: &Mutex<ThrottleState>) -> MutexGuard<'_, ThrottleState>
{   state
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Counts one call as in flight until dropped, so a caller that
/// abandons the future still clears the loading flag.
struct InFlight<'a>
{   state: &'a Mutex<ThrottleState>
}

impl<'a> InFlight<'a>
{   fn enter(state: &'a Mutex<ThrottleState>) -> Self
    {   lock_state(state).in_flight += 1;
        InFlight { state }
    }
}

impl Drop for InFlight<'_>
{   fn drop(&mut self)
    {   let mut state = lock_state(self.state);
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

pub struct CallThrottle<T: Transport = GeminiClient, C: Clock + Clone = SystemClock>
{   gateway: Arc<SecureGateway<T, C>>
  , cooldown_ms: u64
  , clock: C
  , state: Mutex<ThrottleState>
}

impl<T: Transport> CallThrottle<T, SystemClock>
{   pub fn new(gateway: Arc<SecureGateway<T, SystemClock>>, cooldown_ms: u64)
      -> Self
    {   CallThrottle::with_clock(gateway, cooldown_ms, SystemClock)
    }
}

impl<T: Transport, C: Clock + Clone> CallThrottle<T, C>
{   pub fn with_clock(
      gateway: Arc<SecureGateway<T, C>>
    , cooldown_ms: u64
    , clock: C
    ) -> Self
    {   debug!("Creating CallThrottle with {} ms cooldown", cooldown_ms);
        CallThrottle
        {   gateway
          , cooldown_ms
          , clock
          , state: Mutex::new(ThrottleState::default())
        }
    }

    pub fn gateway(&self) -> &Arc<SecureGateway<T, C>>
    {   &self.gateway
    }

    fn lock(&self) -> MutexGuard<'_, ThrottleState>
    {   lock_state(&self.state)
    }

    /// Call the gateway unless the last call was under the cooldown
    /// ago; `None` on any failure, with [`CallThrottle::error`] set
    pub async fn make_secure_call(
      &self
    , prompt: &str
    , schema: Option<&ResponseSchema>
    ) -> Option<ApiResponse>
    {   self.try_make_secure_call(prompt, schema).await.ok()
    }

    pub async fn try_make_secure_call(
      &self
    , prompt: &str
    , schema: Option<&ResponseSchema>
    ) -> Result<ApiResponse, Error>
    {   let now = self.clock.now_ms();
        {   let mut state = self.lock();
            if let Some(last) = state.last_call_ms
            {   let elapsed = now.saturating_sub(last);
                if elapsed < self.cooldown_ms
                {   warn!("Call {} ms after the previous one, ignoring", elapsed);
                    state.error = Some(COOLDOWN_MESSAGE.to_string());
                    return Err(Error::CooldownActive
                    {   retry_after_ms: self.cooldown_ms - elapsed
                    });
                }
            }
            state.last_call_ms = Some(now);
            state.error = None;
        }

        let in_flight = InFlight::enter(&self.state);
        let result = self.gateway.try_call_gemini(prompt, schema).await;
        drop(in_flight);

        let mut state = self.lock();
        if let Err(e) = &result
        {   warn!("Secure call failed: {}", e);
            state.error = Some(FAILED_MESSAGE.to_string());
        }
        result
    }

    pub fn is_loading(&self) -> bool
    {   self.lock().in_flight > 0
    }

    pub fn error(&self) -> Option<String>
    {   self.lock().error.clone()
    }

    pub fn clear_error(&self)
    {   self.lock().error = None;
    }

    pub fn status(&self) -> CallStatus
    {   let state = self.lock();
        CallStatus
        {   is_loading: state.in_flight > 0
          , error: state.error.clone()
        }
    }
}
