//! Indication processor
//!
//! The receive path filters indications against the subscription table and
//! pushes accepted ones onto a bounded drop-oldest queue. The indication task
//! is the single consumer and hands events to the sink in FIFO order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ricxapp_common::E2NodeId;
use ricxapp_e2ap::procedures::Indication;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::sink::{IndicationEvent, IndicationSink};
use crate::subscription::{SubscriptionId, SubscriptionManager};
use crate::tasks::{IndicationMessage, Task, TaskMessage};

// ============================================================================
// Queue
// ============================================================================

/// Bounded FIFO between the receive path and the indication task
///
/// A push never blocks: when the queue is full the oldest event is evicted.
#[derive(Debug)]
pub struct IndicationQueue {
    events: Mutex<VecDeque<IndicationEvent>>,
    capacity: usize,
    notify: Notify,
}

impl IndicationQueue {
    /// Creates a queue holding at most `capacity` events (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            notify: Notify::new(),
        }
    }

    /// Appends an event and wakes the consumer. Returns the evicted event, if any.
    pub fn push(&self, event: IndicationEvent) -> Option<IndicationEvent> {
        let evicted = {
            let mut events = self.lock();
            let evicted = if events.len() >= self.capacity {
                events.pop_front()
            } else {
                None
            };
            events.push_back(event);
            evicted
        };
        self.notify.notify_one();
        evicted
    }

    /// Removes the oldest event.
    pub fn pop(&self) -> Option<IndicationEvent> {
        self.lock().pop_front()
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Maximum number of queued events.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Waits until a push happens after the last wake-up.
    pub async fn notified(&self) {
        self.notify.notified().await;
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<IndicationEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Default)]
struct Counters {
    received: AtomicU64,
    enqueued: AtomicU64,
    delivered: AtomicU64,
    dropped_inactive: AtomicU64,
    dropped_overflow: AtomicU64,
    decode_failures: AtomicU64,
}

/// Indication counters at one point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndicationStats {
    /// Decoded indications seen by the receive path
    pub received: u64,
    /// Indications queued for delivery
    pub enqueued: u64,
    /// Indications handed to the sink
    pub delivered: u64,
    /// Indications for unknown or inactive subscriptions
    pub dropped_inactive: u64,
    /// Queued indications evicted by newer ones
    pub dropped_overflow: u64,
    /// Indication frames that failed to decode
    pub decode_failures: u64,
}

/// What happened to an indication on the receive path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicationDisposition {
    /// Queued for delivery
    Enqueued,
    /// Queued for delivery; the oldest queued event was evicted
    EnqueuedWithEviction,
    /// No active subscription matches
    DroppedInactive,
}

impl IndicationDisposition {
    /// True when the indication was queued.
    pub fn is_enqueued(self) -> bool {
        !matches!(self, IndicationDisposition::DroppedInactive)
    }
}

/// Subscription an indication from `e2_node` belongs to.
pub fn indication_subscription(indication: &Indication, e2_node: &E2NodeId) -> SubscriptionId {
    SubscriptionId::new(
        indication.request_id.requestor_id,
        indication.ran_function_id,
        e2_node.clone(),
    )
}

// ============================================================================
// Processor
// ============================================================================

/// Receive-path side of indication handling. Clones share queue and counters.
#[derive(Debug, Clone)]
pub struct IndicationProcessor {
    queue: Arc<IndicationQueue>,
    counters: Arc<Counters>,
}

impl IndicationProcessor {
    /// Creates a processor with a queue of `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Arc::new(IndicationQueue::new(capacity)),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Shared queue.
    pub fn queue(&self) -> &Arc<IndicationQueue> {
        &self.queue
    }

    /// Filters a decoded indication and queues it for delivery.
    pub fn on_indication(
        &self,
        manager: &SubscriptionManager,
        indication: Indication,
        e2_node: &E2NodeId,
        now: Instant,
    ) -> IndicationDisposition {
        self.counters.received.fetch_add(1, Ordering::Relaxed);

        let subscription = indication_subscription(&indication, e2_node);
        match manager.state(&subscription) {
            Some(state) if state.accepts_indications() => {}
            state => {
                self.counters.dropped_inactive.fetch_add(1, Ordering::Relaxed);
                debug!(
                    subscription = %subscription,
                    "Dropping indication, subscription is {}",
                    state.map_or_else(|| "unknown".to_string(), |s| s.to_string())
                );
                return IndicationDisposition::DroppedInactive;
            }
        }

        let event = IndicationEvent {
            subscription,
            action_id: indication.action_id,
            sequence_number: indication.sequence_number,
            indication_type: indication.indication_type,
            header: indication.header,
            message: indication.message,
            call_process_id: indication.call_process_id,
            received_at: now,
        };
        self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
        match self.queue.push(event) {
            Some(evicted) => {
                self.counters.dropped_overflow.fetch_add(1, Ordering::Relaxed);
                warn!(
                    subscription = %evicted.subscription,
                    "Indication queue full ({}), evicted oldest event",
                    self.queue.capacity()
                );
                IndicationDisposition::EnqueuedWithEviction
            }
            None => IndicationDisposition::Enqueued,
        }
    }

    /// Counts an indication frame that failed to decode.
    pub fn record_decode_failure(&self) {
        self.counters.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    fn record_delivered(&self) {
        self.counters.delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counters.
    pub fn stats(&self) -> IndicationStats {
        let c = &self.counters;
        IndicationStats {
            received: c.received.load(Ordering::Relaxed),
            enqueued: c.enqueued.load(Ordering::Relaxed),
            delivered: c.delivered.load(Ordering::Relaxed),
            dropped_inactive: c.dropped_inactive.load(Ordering::Relaxed),
            dropped_overflow: c.dropped_overflow.load(Ordering::Relaxed),
            decode_failures: c.decode_failures.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// Indication Task
// ============================================================================

/// Single consumer of the indication queue
pub struct IndicationTask {
    processor: IndicationProcessor,
    sink: Arc<dyn IndicationSink>,
}

impl IndicationTask {
    /// Creates the task.
    pub fn new(processor: IndicationProcessor, sink: Arc<dyn IndicationSink>) -> Self {
        Self { processor, sink }
    }

    async fn drain(&self) {
        while let Some(event) = self.processor.queue.pop() {
            self.sink.deliver(event).await;
            self.processor.record_delivered();
        }
    }
}

#[async_trait::async_trait]
impl Task for IndicationTask {
    type Message = IndicationMessage;

    async fn run(&mut self, mut rx: mpsc::Receiver<TaskMessage<IndicationMessage>>) {
        info!("Indication task started");
        let queue = Arc::clone(&self.processor.queue);

        loop {
            self.drain().await;
            tokio::select! {
                msg = rx.recv() => {
                    match msg {
                        Some(TaskMessage::Message(IndicationMessage::Flush(ack))) => {
                            self.drain().await;
                            let _ = ack.send(());
                        }
                        Some(TaskMessage::Shutdown) | None => {
                            self.drain().await;
                            break;
                        }
                    }
                }
                _ = queue.notified() => {}
            }
        }

        info!("Indication task stopped");
    }
}
