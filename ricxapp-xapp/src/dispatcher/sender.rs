//! Outbound send with bounded retry

use std::sync::Arc;
use std::time::Duration;

use ricxapp_common::logging::{log_rmr_message, Direction};
use ricxapp_common::RmrConfig;
use ricxapp_rmr::{RmrMessage, RmrTransport, TransportError};
use tokio::time::Instant;
use tracing::{error, warn};

/// Sends requests, retrying transient failures
#[derive(Clone)]
pub struct RequestSender {
    transport: Arc<dyn RmrTransport>,
    attempts: u32,
    retry_interval: Duration,
}

impl RequestSender {
    /// Creates a sender making at most `attempts` tries (at least one).
    pub fn new(transport: Arc<dyn RmrTransport>, attempts: u32, retry_interval: Duration) -> Self {
        Self {
            transport,
            attempts: attempts.max(1),
            retry_interval,
        }
    }

    /// Creates a sender from the RMR configuration.
    pub fn from_config(transport: Arc<dyn RmrTransport>, config: &RmrConfig) -> Self {
        Self::new(transport, config.send_attempts, config.retry_interval())
    }

    /// Maximum number of tries per message.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Sends the request of a pending transaction. Returns the number of tries used.
    ///
    /// `Timeout` and `Transient` failures are retried after the retry
    /// interval; `Unreachable` is returned at once. No try is made at or
    /// after `deadline`, nor once `is_pending` reports that the transaction
    /// was resolved, expired or cancelled meanwhile.
    pub async fn send<F>(
        &self,
        message: RmrMessage,
        deadline: Instant,
        is_pending: F,
    ) -> Result<u32, TransportError>
    where
        F: Fn() -> bool,
    {
        log_rmr_message(Direction::Tx, &message.mtype.to_string(), &message.payload);

        let mut attempt = 1;
        loop {
            let e = match self.transport.send(message.clone()).await {
                Ok(()) => return Ok(attempt),
                Err(e) => e,
            };
            if !e.is_retryable() {
                warn!(mtype = message.mtype, "Send failed: {}", e);
                return Err(e);
            }
            if attempt >= self.attempts {
                error!(mtype = message.mtype, "Send failed after {} attempts: {}", attempt, e);
                return Err(e);
            }
            if Instant::now() + self.retry_interval >= deadline {
                error!(
                    mtype = message.mtype,
                    "Response deadline reached after {} attempt(s): {}",
                    attempt,
                    e
                );
                return Err(TransportError::Timeout(format!(
                    "response deadline reached after {attempt} attempt(s)"
                )));
            }

            warn!(
                mtype = message.mtype,
                "Send attempt {}/{} failed: {}",
                attempt,
                self.attempts,
                e
            );
            tokio::time::sleep(self.retry_interval).await;
            if !is_pending() {
                warn!(mtype = message.mtype, "Transaction ended during send retries, not sending");
                return Err(TransportError::Timeout("transaction no longer pending".to_string()));
            }
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricxapp_rmr::InProcRmr;

    fn message() -> RmrMessage {
        RmrMessage::new(12010, vec![0x01, 0x02])
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_then_succeeds() {
        let (xapp, node) = InProcRmr::pair();
        xapp.inject_send_failures([
            TransportError::Transient("EAGAIN".into()),
            TransportError::Timeout("1s".into()),
        ]);
        let sender = RequestSender::new(Arc::new(xapp.clone()), 5, Duration::from_millis(100));

        assert_eq!(sender.send(message(), far_deadline(), || true).await.unwrap(), 3);
        assert_eq!(xapp.sent_count(), 1);
        assert_eq!(node.recv().await.unwrap().mtype, 12010);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_attempts() {
        let (xapp, _node) = InProcRmr::pair();
        xapp.inject_send_failures((0..3).map(|_| TransportError::Transient("EAGAIN".into())));
        let sender = RequestSender::new(Arc::new(xapp.clone()), 3, Duration::from_millis(100));

        let err = sender.send(message(), far_deadline(), || true).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(xapp.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_is_not_retried() {
        let (xapp, _node) = InProcRmr::pair();
        xapp.inject_send_failures([
            TransportError::Unreachable("no route".into()),
            TransportError::Transient("EAGAIN".into()),
        ]);
        let sender = RequestSender::new(Arc::new(xapp.clone()), 5, Duration::from_secs(1));

        assert!(matches!(
            sender.send(message(), far_deadline(), || true).await,
            Err(TransportError::Unreachable(_))
        ));
        // The second injected failure is still queued
        assert!(sender.send(message(), far_deadline(), || true).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_stop_before_deadline() {
        let (xapp, _node) = InProcRmr::pair();
        xapp.inject_send_failures((0..5).map(|_| TransportError::Transient("EAGAIN".into())));
        let sender = RequestSender::new(Arc::new(xapp.clone()), 10, Duration::from_secs(1));

        let start = Instant::now();
        let deadline = start + Duration::from_secs(3);
        let err = sender.send(message(), deadline, || true).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
        assert!(Instant::now() < deadline);
        assert_eq!(xapp.sent_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_stop_once_transaction_ends() {
        let (xapp, _node) = InProcRmr::pair();
        xapp.inject_send_failures([TransportError::Transient("EAGAIN".into())]);
        let sender = RequestSender::new(Arc::new(xapp.clone()), 5, Duration::from_millis(100));

        // The transaction expired while the first retry was waiting
        let err = sender.send(message(), far_deadline(), || false).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
        assert_eq!(xapp.sent_count(), 0);
    }
}
