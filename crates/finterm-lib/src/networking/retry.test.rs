use super::*;

#[test]
fn test_exponential_backoff_without_jitter() {
    let backoff = BackoffConfig::fixed_jitterless(Duration::from_millis(250), Duration::from_millis(2_000));

    assert_eq!(backoff.delay(0), Duration::from_millis(250));
    assert_eq!(backoff.delay(1), Duration::from_millis(500));
    assert_eq!(backoff.delay(2), Duration::from_millis(1_000));
    assert_eq!(backoff.delay(3), Duration::from_millis(2_000));
    assert_eq!(backoff.delay(4), Duration::from_millis(2_000), "capped at max");
    assert_eq!(backoff.delay(40), Duration::from_millis(2_000), "no overflow");
}

#[test]
fn test_default_backoff_jitter_bounds() {
    let backoff = BackoffConfig::default();

    for _ in 0..50 {
        for attempt in 0..4 {
            let base = 250u64 * 2u64.pow(attempt);
            let delay = backoff.delay(attempt).as_millis() as u64;

            assert!(delay >= base.min(2_000), "attempt={attempt}, delay={delay}");
            assert!(delay < (base + 120).max(2_001), "attempt={attempt}, delay={delay}");
            assert!(delay <= 2_000, "attempt={attempt}, delay={delay}");
        }
    }
}

#[test]
fn test_retryable_statuses() {
    for status in [0, 429, 502, 503, 504] {
        assert!(is_retryable_status(status), "{status} should retry");
    }
    for status in [200, 400, 401, 404, 408, 500, 501] {
        assert!(!is_retryable_status(status), "{status} should not retry");
    }
}

#[test]
fn test_retry_count_clamping() {
    assert_eq!(clamp_retry_count(None), 2);
    assert_eq!(clamp_retry_count(Some(0)), 0);
    assert_eq!(clamp_retry_count(Some(3)), 3);
    assert_eq!(clamp_retry_count(Some(99)), 4);
}
