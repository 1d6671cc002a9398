//! Application handle
//!
//! [`Xapp`] starts the dispatcher and indication tasks and is how the
//! application issues intents and queries subscription state. Intents are
//! registered under the core lock, sent after it is released, and resolved
//! either by the dispatcher (responses, sweeps) or right here (send
//! failures, requests that expect no response).

use std::sync::Arc;
use std::time::Duration;

use ricxapp_common::{E2NodeId, XappConfig};
use ricxapp_e2ap::procedures::Cause;
use ricxapp_e2ap::E2apCodec;
use ricxapp_rmr::{RmrMessage, RmrTransport};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::dispatcher::{DispatcherTask, RequestSender};
use crate::error::XappError;
use crate::indication::{IndicationProcessor, IndicationSink, IndicationStats, IndicationTask};
use crate::shared::{lock_core, SharedCore, XappCore};
use crate::subscription::{
    ControlIntent, IntentOutcome, OutboundRequest, SubscribeIntent, Subscription, SubscriptionId,
    SubscriptionManager, SubscriptionState, SubscriptionStore, TransactionId,
};
use crate::tasks::{
    DispatcherMessage, IndicationMessage, TaskError, TaskId, TaskManager, TaskState,
    DEFAULT_CHANNEL_CAPACITY,
};

/// Running xApp
pub struct Xapp {
    config: Arc<XappConfig>,
    core: SharedCore,
    sender: RequestSender,
    indications: IndicationProcessor,
    task_manager: TaskManager,
}

impl Xapp {
    /// Builds the core and spawns the dispatcher and indication tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        config: XappConfig,
        transport: Arc<dyn RmrTransport>,
        sink: Arc<dyn IndicationSink>,
        store: Option<Box<dyn SubscriptionStore>>,
    ) -> Self {
        let codec = Arc::new(E2apCodec::with_buffer_sizes(
            config.codec.encode_buffer_size,
            config.rmr.max_message_size,
        ));
        let mut manager = SubscriptionManager::new(config.subscription.clone(), Arc::clone(&codec));
        if let Some(store) = store {
            manager = manager.with_store(store);
        }
        let core = XappCore::shared(manager);
        let indications = IndicationProcessor::new(config.indication.queue_capacity);
        let sender = RequestSender::from_config(Arc::clone(&transport), &config.rmr);

        let config = Arc::new(config);
        let (mut task_manager, dispatcher_rx, indication_rx) =
            TaskManager::new(DEFAULT_CHANNEL_CAPACITY);

        task_manager.spawn(
            TaskId::Indication,
            IndicationTask::new(indications.clone(), sink),
            indication_rx,
        );
        task_manager.spawn(
            TaskId::Dispatcher,
            DispatcherTask::new(
                Arc::clone(&core),
                transport,
                codec,
                indications.clone(),
                config.rmr.max_message_size,
                config.subscription.sweep_interval(),
            ),
            dispatcher_rx,
        );

        info!(
            xapp = %config.xapp_name,
            requestor_id = config.subscription.requestor_id,
            "xApp started"
        );
        Self {
            config,
            core,
            sender,
            indications,
            task_manager,
        }
    }

    /// Configuration the xApp runs with.
    pub fn config(&self) -> &XappConfig {
        &self.config
    }

    /// Reloads persisted subscriptions. Returns how many were restored.
    pub fn restore(&self) -> Result<usize, XappError> {
        let restored = lock_core(&self.core).manager.restore(Instant::now())?;
        Ok(restored)
    }

    // ========================================================================
    // Intents
    // ========================================================================

    /// Sends a subscription request. Returns once the request is sent.
    pub async fn subscribe(&self, intent: SubscribeIntent) -> Result<SubscriptionId, XappError> {
        let id = SubscriptionId::new(
            self.config.subscription.requestor_id,
            intent.ran_function_id,
            intent.e2_node.clone(),
        );
        self.submit(false, |manager, now| manager.begin_subscribe(intent, now))
            .await?;
        Ok(id)
    }

    /// Subscribes and waits for the outcome.
    pub async fn subscribe_and_wait(
        &self,
        intent: SubscribeIntent,
    ) -> Result<IntentOutcome, XappError> {
        let (_, waiter) = self
            .submit(true, |manager, now| manager.begin_subscribe(intent, now))
            .await?;
        wait(waiter).await
    }

    /// Sends a subscription delete request.
    pub async fn delete(&self, id: &SubscriptionId) -> Result<TransactionId, XappError> {
        let (request, _) = self
            .submit(false, |manager, now| manager.begin_delete(id, now))
            .await?;
        Ok(request.transaction)
    }

    /// Deletes a subscription and waits for the outcome.
    pub async fn delete_and_wait(&self, id: &SubscriptionId) -> Result<IntentOutcome, XappError> {
        let (_, waiter) = self
            .submit(true, |manager, now| manager.begin_delete(id, now))
            .await?;
        wait(waiter).await
    }

    /// Sends a control request.
    pub async fn control(&self, intent: ControlIntent) -> Result<TransactionId, XappError> {
        let (request, _) = self
            .submit(false, |manager, now| manager.begin_control(intent, now))
            .await?;
        Ok(request.transaction)
    }

    /// Sends a control request and waits for the outcome.
    pub async fn control_and_wait(
        &self,
        intent: ControlIntent,
    ) -> Result<IntentOutcome, XappError> {
        let (_, waiter) = self
            .submit(true, |manager, now| manager.begin_control(intent, now))
            .await?;
        wait(waiter).await
    }

    /// Sends a reset request to an E2 node.
    pub async fn reset(&self, e2_node: E2NodeId, cause: Cause) -> Result<TransactionId, XappError> {
        let (request, _) = self
            .submit(false, |manager, now| manager.begin_reset(e2_node, cause, now))
            .await?;
        Ok(request.transaction)
    }

    /// Resets an E2 node and waits for the outcome.
    pub async fn reset_and_wait(
        &self,
        e2_node: E2NodeId,
        cause: Cause,
    ) -> Result<IntentOutcome, XappError> {
        let (_, waiter) = self
            .submit(true, |manager, now| manager.begin_reset(e2_node, cause, now))
            .await?;
        wait(waiter).await
    }

    async fn submit<F>(
        &self,
        with_waiter: bool,
        begin: F,
    ) -> Result<(OutboundRequest, Option<oneshot::Receiver<IntentOutcome>>), XappError>
    where
        F: FnOnce(&mut SubscriptionManager, Instant) -> Result<OutboundRequest, XappError>,
    {
        let (request, waiter) = {
            let mut core = lock_core(&self.core);
            let request = begin(&mut core.manager, Instant::now())?;
            let waiter = with_waiter.then(|| core.register_waiter(request.transaction));
            (request, waiter)
        };

        let is_pending = || {
            lock_core(&self.core)
                .manager
                .tracker()
                .pending_for(&request.owner)
                .is_some_and(|txn| txn.id == request.transaction)
        };
        match self
            .sender
            .send(request.message.clone(), request.deadline, is_pending)
            .await
        {
            Ok(attempts) => {
                let mut core = lock_core(&self.core);
                core.manager.record_retries(request.transaction, attempts.saturating_sub(1));
                if !request.expects_response {
                    let completions =
                        core.manager.on_request_sent(request.transaction, Instant::now());
                    core.complete(completions);
                }
                Ok((request, waiter))
            }
            Err(e) => {
                let mut core = lock_core(&self.core);
                let completions = core
                    .manager
                    .abort_transaction(request.transaction, e.to_string(), Instant::now());
                core.complete(completions);
                Err(e.into())
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Current state of a subscription.
    pub fn subscription_state(&self, id: &SubscriptionId) -> Option<SubscriptionState> {
        lock_core(&self.core).manager.state(id)
    }

    /// Snapshot of a subscription entry.
    pub fn subscription(&self, id: &SubscriptionId) -> Option<Subscription> {
        lock_core(&self.core).manager.get(id).cloned()
    }

    /// Snapshot of every subscription entry, ordered by identity.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        let mut subs: Vec<_> = lock_core(&self.core).manager.subscriptions().cloned().collect();
        subs.sort_by(|a, b| a.id.cmp(&b.id));
        subs
    }

    /// Indication counters.
    pub fn indication_stats(&self) -> IndicationStats {
        self.indications.stats()
    }

    /// True once a store failure switched the xApp to memory-only mode.
    pub fn is_store_degraded(&self) -> bool {
        lock_core(&self.core).manager.is_store_degraded()
    }

    /// Number of pending transactions.
    pub fn pending_transactions(&self) -> usize {
        lock_core(&self.core).manager.tracker().len()
    }

    /// State of each task.
    pub fn task_status(&self) -> Vec<(TaskId, TaskState)> {
        self.task_manager.status_summary()
    }

    // ========================================================================
    // Task control
    // ========================================================================

    /// Hands a frame to the dispatcher as if it had been received.
    pub async fn inject(&self, frame: RmrMessage) -> Result<(), XappError> {
        self.task_manager
            .handles()
            .dispatcher
            .send(DispatcherMessage::Inbound(frame))
            .await
            .map_err(|_| XappError::Closed)
    }

    /// Runs the transaction sweep now.
    pub async fn sweep(&self) -> Result<(), XappError> {
        self.task_manager
            .handles()
            .dispatcher
            .send(DispatcherMessage::Sweep)
            .await
            .map_err(|_| XappError::Closed)
    }

    /// Waits until every queued indication has been handed to the sink.
    pub async fn flush_indications(&self) -> Result<(), XappError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.task_manager
            .handles()
            .indication
            .send(IndicationMessage::Flush(ack_tx))
            .await
            .map_err(|_| XappError::Closed)?;
        ack_rx.await.map_err(|_| XappError::Closed)
    }

    /// Stops the xApp.
    ///
    /// With `delete_on_shutdown` set, active subscriptions are deleted first
    /// on a best-effort basis, bounded by the delete timeout.
    pub async fn shutdown(mut self) -> Result<(), TaskError> {
        if self.config.subscription.delete_on_shutdown {
            self.delete_all(self.config.subscription.delete_timeout()).await;
        }
        let result = self.task_manager.shutdown().await;
        info!("xApp stopped");
        result
    }

    async fn delete_all(&self, timeout: Duration) {
        let ids = lock_core(&self.core).manager.idle_active_subscriptions();
        if ids.is_empty() {
            return;
        }
        info!("Deleting {} active subscription(s)", ids.len());

        let mut waiters = Vec::with_capacity(ids.len());
        for id in &ids {
            match self
                .submit(true, |manager, now| manager.begin_delete(id, now))
                .await
            {
                Ok((_, Some(waiter))) => waiters.push(waiter),
                Ok((_, None)) => {}
                Err(e) => warn!(subscription = %id, "Delete on shutdown failed: {}", e),
            }
        }

        let deadline = Instant::now() + timeout;
        for waiter in waiters {
            if tokio::time::timeout_at(deadline, waiter).await.is_err() {
                warn!("Delete on shutdown did not complete in time");
                break;
            }
        }
    }
}

async fn wait(
    waiter: Option<oneshot::Receiver<IntentOutcome>>,
) -> Result<IntentOutcome, XappError> {
    match waiter {
        Some(waiter) => waiter.await.map_err(|_| XappError::Closed),
        None => Err(XappError::Closed),
    }
}
