//! In-process RMR transport
//!
//! Two connected endpoints passing messages through channels: what one
//! sends, the other receives. Used to wire the xApp to a simulated E2 node
//! in tests. Send failures can be injected to exercise retry handling.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::message::RmrMessage;
use crate::transport::{RmrTransport, TransportError};

/// Channel capacity for the in-process transport.
const CHANNEL_CAPACITY: usize = 256;

/// One end of an in-process transport pair
#[derive(Clone)]
pub struct InProcRmr {
    inner: Arc<InProcInner>,
}

struct InProcInner {
    /// Channel to the peer's receiver
    tx: mpsc::Sender<RmrMessage>,
    /// Channel carrying the peer's messages
    rx: tokio::sync::Mutex<mpsc::Receiver<RmrMessage>>,
    closed: AtomicBool,
    injected_failures: Mutex<VecDeque<TransportError>>,
    sent: AtomicU64,
}

impl InProcInner {
    fn new(tx: mpsc::Sender<RmrMessage>, rx: mpsc::Receiver<RmrMessage>) -> Self {
        Self {
            tx,
            rx: tokio::sync::Mutex::new(rx),
            closed: AtomicBool::new(false),
            injected_failures: Mutex::new(VecDeque::new()),
            sent: AtomicU64::new(0),
        }
    }
}

impl InProcRmr {
    /// Creates a connected pair `(a, b)`: messages sent on `a` arrive on `b` and vice versa.
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_a) = mpsc::channel(CHANNEL_CAPACITY);
        let (tx_b, rx_b) = mpsc::channel(CHANNEL_CAPACITY);
        (
            Self {
                inner: Arc::new(InProcInner::new(tx_b, rx_a)),
            },
            Self {
                inner: Arc::new(InProcInner::new(tx_a, rx_b)),
            },
        )
    }

    /// Makes the next sends fail with the given errors, in order.
    pub fn inject_send_failures(&self, errors: impl IntoIterator<Item = TransportError>) {
        self.inner
            .injected_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(errors);
    }

    /// Number of messages successfully handed to the peer.
    pub fn sent_count(&self) -> u64 {
        self.inner.sent.load(Ordering::Relaxed)
    }

    /// Closes this end: sends fail and `recv` returns `None`.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
    }

    /// True once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

#[async_trait]
impl RmrTransport for InProcRmr {
    async fn send(&self, message: RmrMessage) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Unreachable("transport closed".to_string()));
        }
        let injected = self
            .inner
            .injected_failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(error) = injected {
            return Err(error);
        }
        match self.inner.tx.try_send(message) {
            Ok(()) => {
                self.inner.sent.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                Err(TransportError::Transient("peer queue full".to_string()))
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(TransportError::Unreachable("peer dropped".to_string()))
            }
        }
    }

    async fn recv(&self) -> Option<RmrMessage> {
        if self.is_closed() {
            return None;
        }
        let mut rx = self.inner.rx.lock().await;
        tokio::select! {
            message = rx.recv() => message,
            _ = wait_closed(&self.inner.closed) => None,
        }
    }
}

async fn wait_closed(closed: &AtomicBool) {
    while !closed.load(Ordering::Acquire) {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
}
