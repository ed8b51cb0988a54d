//! Time source for the rate limiter and call throttle

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
/// Implementors must be thread-safe so one limiter can be
/// shared between tasks.
pub trait Clock: Send + Sync
{   fn now_ms(&self) -> u64;
}

/// Wall clock. A system time before the epoch reads as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock
{   fn now_ms(&self) -> u64
    {   SystemTime::now()
          .duration_since(UNIX_EPOCH)
          .map(|d| d.as_millis() as u64)
          .unwrap_or(0)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C>
{   fn now_ms(&self) -> u64
    {   (**self).now_ms()
    }
}
