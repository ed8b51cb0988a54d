//! Sliding-window admission control for outbound API calls
//!
//! The limiter keeps the timestamps of recent admissions and evicts
//! lazily on every check, so there is no background timer.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use log::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::config::RateLimiterConfig;

pub const DEFAULT_MAX_REQUESTS: usize = 10;
pub const DEFAULT_WINDOW_MS: u64 = 60_000;

/// At most `max_requests` admissions in any rolling `window_ms`
#[derive(Debug)]
pub struct RateLimiter<C: Clock = SystemClock>
{   max_requests: usize
  , window_ms: u64
  , requests: Mutex<VecDeque<u64>>
  , clock: C
}

impl RateLimiter<SystemClock>
{   pub fn new(max_requests: usize, window_ms: u64) -> Self
    {   RateLimiter::with_clock(max_requests, window_ms, SystemClock)
    }
}

impl Default for RateLimiter<SystemClock>
{   fn default() -> Self
    {   RateLimiter::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_MS)
    }
}

impl<C: Clock> RateLimiter<C>
{   pub fn with_clock(
      max_requests: usize
    , window_ms: u64
    , clock: C
    ) -> Self
    {   debug!(
          "Creating rate limiter: {} requests per {} ms",
          max_requests, window_ms
        );
        RateLimiter
        {   max_requests
          , window_ms
          , requests: Mutex::new(VecDeque::with_capacity(max_requests))
          , clock
        }
    }

    /// Build from a config, rejecting zero limits
    pub fn with_config(
      config: &RateLimiterConfig
    , clock: C
    ) -> Result<Self, crate::error::Error>
    {   config.validate()?;
        Ok(RateLimiter::with_clock(
          config.max_requests,
          config.window_ms,
          clock
        ))
    }

    pub fn max_requests(&self) -> usize
    {   self.max_requests
    }

    pub fn window_ms(&self) -> u64
    {   self.window_ms
    }

    // A panic while holding the lock cannot leave the deque
    // half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, VecDeque<u64>>
    {   self.requests
          .lock()
          .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn evict(&self, requests: &mut VecDeque<u64>, now: u64)
    {   requests.retain(|&t| now.saturating_sub(t) < self.window_ms);
    }

    /// Evict, count, and record as one step under the lock.
    /// Returns true if the call is admitted.
    pub fn can_make_request(&self) -> bool
    {   let now = self.clock.now_ms();
        let mut requests = self.lock();
        self.evict(&mut requests, now);

        if requests.len() < self.max_requests
        {   requests.push_back(now);
            trace!(
              "Admitted request ({}/{})",
              requests.len(), self.max_requests
            );
            true
        } else
        {   debug!(
              "Rejected request, {} already in window",
              requests.len()
            );
            false
        }
    }

    /// Milliseconds until the oldest retained admission leaves the
    /// window, i.e. until another slot frees up
    pub fn time_until_reset(&self) -> u64
    {   let now = self.clock.now_ms();
        let requests = self.lock();
        match requests.iter().min()
        {   Some(&oldest) => {
              self.window_ms.saturating_sub(now.saturating_sub(oldest))
            }
          , None => 0
        }
    }

    /// Admissions currently inside the window
    pub fn in_window(&self) -> usize
    {   let now = self.clock.now_ms();
        let mut requests = self.lock();
        self.evict(&mut requests, now);
        requests.len()
    }
}
