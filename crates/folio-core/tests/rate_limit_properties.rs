//! Property tests for the attempt limiter.

use std::time::{Duration, Instant};

use folio_core::rate_limit::{RateDecision, RateLimitConfig, RateLimiter};
use proptest::prelude::*;

fn config(max_attempts: u32) -> RateLimitConfig {
    RateLimitConfig {
        max_attempts,
        ..RateLimitConfig::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Within one window, exactly `max_attempts` attempts pass.
    #[test]
    fn allows_exactly_max_attempts(max in 1u32..20, extra in 1usize..10, gaps in prop::collection::vec(0u64..1_000, 30)) {
        let limiter = RateLimiter::new(config(max));
        let start = Instant::now();
        let mut now = start;
        let mut allowed = 0u32;

        for gap in gaps.iter().take(max as usize + extra) {
            now += Duration::from_millis(*gap);
            if limiter.check_attempt_at("visitor", now).allowed() {
                allowed += 1;
            }
        }
        prop_assert_eq!(allowed, max);
        prop_assert!(limiter.is_penalized("visitor"));
    }

    /// `remaining` counts down to zero.
    #[test]
    fn remaining_counts_down(max in 1u32..20) {
        let limiter = RateLimiter::new(config(max));
        let now = Instant::now();
        for expected in (0..max).rev() {
            prop_assert_eq!(
                limiter.check_attempt_at("visitor", now),
                RateDecision::Allowed { remaining: expected }
            );
        }
    }

    /// One identifier's attempts never affect another's.
    #[test]
    fn identifiers_are_independent(a_attempts in 0u32..15, b_attempts in 0u32..15) {
        let limiter = RateLimiter::new(config(5));
        let now = Instant::now();
        for _ in 0..a_attempts {
            let _ = limiter.check_attempt_at("a", now);
        }
        for _ in 0..b_attempts {
            let _ = limiter.check_attempt_at("b", now);
        }
        prop_assert_eq!(limiter.is_penalized("a"), a_attempts > 5);
        prop_assert_eq!(limiter.is_penalized("b"), b_attempts > 5);
    }

    /// After the penalty expires an identifier starts from a clean slate.
    #[test]
    fn penalty_expires(attempts in 6u32..30) {
        let cfg = config(5);
        let limiter = RateLimiter::new(cfg);
        let start = Instant::now();
        for _ in 0..attempts {
            let _ = limiter.check_attempt_at("visitor", start);
        }
        let later = start + cfg.penalty + cfg.window;
        prop_assert!(limiter.check_attempt_at("visitor", later).allowed());
    }
}
