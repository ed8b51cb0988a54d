mod fixtures;

use std::sync::Arc;
use std::thread;

use eduapi::RateLimiter;
use fixtures::ManualClock;

#[test]
fn admits_in_any_window_never_exceed_max()
{   let max = 4;
    let window = 1_000;
    let clock = ManualClock::at(0);
    let limiter = RateLimiter::with_clock(max, window, clock.clone());

    // deterministic pseudo-random gaps between attempts
    let mut seed: u64 = 0x2545_f491;
    let mut now = 0;
    let mut admitted = Vec::new();
    for _ in 0..500
    {   seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let gap = (seed >> 33) % 300;
        clock.advance(gap);
        now += gap;
        if limiter.can_make_request()
        {   admitted.push(now);
        }
    }

    assert!(!admitted.is_empty());
    for &t in &admitted
    {   let in_window = admitted
          .iter()
          .filter(|&&u| u <= t && t - u < window)
          .count();
        assert!(in_window <= max, "{} admits in window ending at {}", in_window, t);
    }
}

#[test]
fn concurrent_checks_admit_exactly_max()
{   let limiter = Arc::new(RateLimiter::new(50, 60_000));
    let handles: Vec<_> = (0..8)
      .map(|_| {
        let limiter = Arc::clone(&limiter);
        thread::spawn(move || {
          (0..20).filter(|_| limiter.can_make_request()).count()
        })
      })
      .collect();

    let admitted: usize = handles
      .into_iter()
      .map(|h| h.join().expect("thread finished"))
      .sum();
    assert_eq!(admitted, 50);
    assert!(limiter.time_until_reset() > 0);
}

#[test]
fn next_slot_opens_when_oldest_leaves()
{   let clock = ManualClock::at(10_000);
    let limiter = RateLimiter::with_clock(2, 500, clock.clone());
    assert!(limiter.can_make_request());
    clock.advance(100);
    assert!(limiter.can_make_request());
    assert!(!limiter.can_make_request());

    clock.advance(399);
    assert_eq!(limiter.time_until_reset(), 1);
    assert!(!limiter.can_make_request());

    clock.advance(1);
    assert!(limiter.can_make_request());
    // the second admission is now the oldest
    assert_eq!(limiter.time_until_reset(), 100);
}
