//! Test utility functions for integration tests
//!
//! Logging setup, polling and bounded receive helpers.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tracing_subscriber::{fmt, EnvFilter};

/// Result type for integration tests
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Default timeout for test operations
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default poll interval for condition checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Initialize logging for tests
///
/// Uses RUST_LOG if set, otherwise logs the xApp crates at debug.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ricxapp_xapp=debug,ricxapp_rmr=debug,info"));

    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}

/// Wait for a condition to become true with timeout
///
/// # Returns
/// * `Ok(())` if the condition became true within `timeout_duration`
/// * `Err` if the timeout elapsed
pub async fn wait_for_condition<F, Fut>(
    mut condition: F,
    timeout_duration: Duration,
    poll_interval: Duration,
) -> TestResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let result = timeout(timeout_duration, async {
        loop {
            if condition().await {
                return;
            }
            sleep(poll_interval).await;
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => Err("Condition not met within timeout".into()),
    }
}

/// Receives the next item from `rx`, failing after [`DEFAULT_TEST_TIMEOUT`].
pub async fn recv_within<T>(rx: &mut mpsc::Receiver<T>) -> TestResult<T> {
    match timeout(DEFAULT_TEST_TIMEOUT, rx.recv()).await {
        Ok(Some(item)) => Ok(item),
        Ok(None) => Err("Channel closed".into()),
        Err(_) => Err("Nothing received within timeout".into()),
    }
}

/// Asserts that `rx` stays empty for `quiet`.
pub async fn assert_quiet<T: std::fmt::Debug>(rx: &mut mpsc::Receiver<T>, quiet: Duration) {
    if let Ok(Some(item)) = timeout(quiet, rx.recv()).await {
        panic!("Unexpected item: {item:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_wait_for_condition_success() {
        let flag = Arc::new(AtomicBool::new(false));
        let flag_clone = flag.clone();

        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            flag_clone.store(true, Ordering::SeqCst);
        });

        let result = wait_for_condition(
            || async { flag.load(Ordering::SeqCst) },
            Duration::from_secs(1),
            Duration::from_millis(10),
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_wait_for_condition_timeout() {
        let result = wait_for_condition(
            || async { false },
            Duration::from_millis(100),
            Duration::from_millis(10),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_recv_within() {
        let (tx, mut rx) = mpsc::channel(1);
        tx.send(7u8).await.unwrap();
        assert_eq!(recv_within(&mut rx).await.unwrap(), 7);
        drop(tx);
        assert!(recv_within(&mut rx).await.is_err());
    }
}
