//! Backoff bounds

use proptest::prelude::*;
use socialsync::client::offline::BackoffStrategy;
use std::time::Duration;

proptest! {
    #[test]
    fn test_exponential_delay_is_monotonic_and_capped(
        base_ms in 1u64..10_000,
        extra_ms in 0u64..600_000,
        attempt in 1u32..200,
    ) {
        let max = Duration::from_millis(base_ms + extra_ms);
        let backoff = BackoffStrategy::Exponential {
            base: Duration::from_millis(base_ms),
            max,
        };

        let current = backoff.delay_for(attempt);
        let next = backoff.delay_for(attempt + 1);
        prop_assert!(current <= next);
        prop_assert!(next <= max);
        prop_assert!(backoff.delay_for(1) == Duration::from_millis(base_ms));
    }
}
