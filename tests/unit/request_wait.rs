//! Unit tests for the rate-limit-aware request executor

use snapshot_harvester::fetcher::{send_with_wait, ApiResponse};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn response(status: u16, retry_after: Option<u64>) -> ApiResponse {
    ApiResponse {
        status,
        retry_after,
        body: "{}".to_string(),
    }
}

#[tokio::test]
async fn test_single_success_needs_one_call() {
    let calls = AtomicUsize::new(0);
    let result = send_with_wait(|| {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok(response(200, None)) }
    })
    .await
    .unwrap();

    assert!(result.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_is_honored() {
    let calls = AtomicUsize::new(0);
    let started = tokio::time::Instant::now();

    let result = send_with_wait(|| {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                Ok(response(429, Some(2)))
            } else {
                Ok(response(200, None))
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(result.status, 200);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(started.elapsed() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_consecutive_rate_limits_keep_waiting() {
    let calls = AtomicUsize::new(0);

    let result = send_with_wait(|| {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 3 {
                Ok(response(429, Some(1)))
            } else {
                Ok(response(200, None))
            }
        }
    })
    .await
    .unwrap();

    assert!(result.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_missing_retry_after_uses_default_wait() {
    let calls = AtomicUsize::new(0);
    let started = tokio::time::Instant::now();

    send_with_wait(|| {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                Ok(response(429, None))
            } else {
                Ok(response(200, None))
            }
        }
    })
    .await
    .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_non_success_statuses_are_not_retried() {
    let calls = AtomicUsize::new(0);
    let result = send_with_wait(|| {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok(response(503, None)) }
    })
    .await
    .unwrap();

    assert_eq!(result.status, 503);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
