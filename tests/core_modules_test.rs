//! Integration tests for core modules (retry, rate limiter, metrics)
//!
//! Run with: cargo test --test core_modules_test

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Retry Module Tests
// ============================================================================

mod retry_tests {
    use super::*;
    use gostbot::core::retry::{retry, RetryConfig, Retryable};

    #[derive(Debug, Clone)]
    struct TestError {
        retryable: bool,
        retry_after: Option<Duration>,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "TestError(retryable={})", self.retryable)
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            self.retryable
        }

        fn retry_after(&self) -> Option<Duration> {
            self.retry_after
        }
    }

    #[tokio::test]
    async fn test_retry_immediate_success() {
        let result = retry(&RetryConfig::quick(), || async { Ok::<i32, TestError>(42) }).await;

        assert!(result.is_ok());
        assert_eq!(result.attempts, 1);
        assert_eq!(result.into_result().unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_second_attempt() {
        let config = RetryConfig::quick().initial_delay(Duration::from_millis(10));
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry(&config, || {
            let counter = counter_clone.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(TestError {
                        retryable: true,
                        retry_after: None,
                    })
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(result.attempts, 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_exhausts_all_attempts() {
        let config = RetryConfig::quick()
            .max_retries(3)
            .initial_delay(Duration::from_millis(10));

        let result = retry(&config, || async {
            Err::<i32, _>(TestError {
                retryable: true,
                retry_after: None,
            })
        })
        .await;

        assert!(result.is_exhausted());
        assert_eq!(result.attempts, 4); // 1 initial + 3 retries
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let config = RetryConfig::quick().max_retries(5);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry(&config, || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError {
                    retryable: false,
                    retry_after: None,
                })
            }
        })
        .await;

        assert!(result.is_exhausted());
        assert_eq!(result.attempts, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_respects_retry_after_hint() {
        let config = RetryConfig::quick()
            .max_retries(2)
            .initial_delay(Duration::from_secs(60)); // Long default delay
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let start = std::time::Instant::now();

        let result = retry(&config, || {
            let counter = counter_clone.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(TestError {
                        retryable: true,
                        retry_after: Some(Duration::from_millis(50)),
                    })
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert!(result.is_ok());
        // Should use the 50ms hint, not the 60s default
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_retry_config_presets() {
        let scraping = RetryConfig::scraping();
        assert_eq!(scraping.max_retries, 2);
        assert!(scraping.add_jitter);

        let quick = RetryConfig::quick();
        assert_eq!(quick.max_retries, 2);
        assert!(!quick.add_jitter);

        assert_eq!(RetryConfig::none().max_retries, 0);
    }
}

// ============================================================================
// Rate Limiter Tests
// ============================================================================

mod rate_limiter_tests {
    use gostbot::core::rate_limiter::RateLimiter;
    use std::time::Duration;
    use teloxide::types::ChatId;

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_per_chat() {
        let limiter = RateLimiter::with_cooldown(Duration::from_secs(2));

        assert_eq!(limiter.check(ChatId(1)).await, None);
        assert!(limiter.check(ChatId(1)).await.is_some());
        assert_eq!(limiter.check(ChatId(2)).await, None);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(limiter.check(ChatId(1)).await, None);
    }
}

// ============================================================================
// Metrics Module Tests
// ============================================================================

mod metrics_tests {
    use gostbot::core::metrics;

    #[test]
    fn test_gather_after_init() {
        metrics::init_metrics().unwrap();
        metrics::record_search("bot", false);

        let text = metrics::gather().unwrap();
        assert!(text.contains("gostbot_searches_total"));
        assert!(text.contains("outcome=\"empty\""));
    }
}
