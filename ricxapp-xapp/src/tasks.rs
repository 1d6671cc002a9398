//! xApp task framework
//!
//! The xApp runs two long-lived tasks, each an async actor fed by a typed
//! channel:
//! - **Dispatcher Task**: RMR receive loop, response demultiplexing,
//!   transaction sweep
//! - **Indication Task**: drains the indication queue into the sink
//!
//! Application callers do not run as tasks; they use the [`crate::Xapp`]
//! handle, which shares the subscription core with the dispatcher.
//!
//! Shutdown is ordered. The dispatcher stops first so no new indications
//! are queued, then the indication task drains what is left and stops.

use std::collections::HashMap;

use ricxapp_rmr::RmrMessage;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Default channel capacity for task message queues.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Time each task gets to stop after its shutdown signal.
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5000;

/// Envelope for task messages.
#[derive(Debug)]
pub enum TaskMessage<T> {
    /// Regular message payload
    Message(T),
    /// Stop after finishing the current work
    Shutdown,
}

impl<T> TaskMessage<T> {
    pub fn message(msg: T) -> Self {
        TaskMessage::Message(msg)
    }

    pub fn shutdown() -> Self {
        TaskMessage::Shutdown
    }
}

/// Messages for the dispatcher task.
#[derive(Debug)]
pub enum DispatcherMessage {
    /// Frame handed in from outside the transport (replay, tests)
    Inbound(RmrMessage),
    /// Run the transaction sweep now
    Sweep,
}

/// Messages for the indication task.
#[derive(Debug)]
pub enum IndicationMessage {
    /// Deliver everything queued, then acknowledge
    Flush(oneshot::Sender<()>),
}

/// An async actor run by the [`TaskManager`].
///
/// `run` returns once it sees [`TaskMessage::Shutdown`] or its channel
/// closes.
#[async_trait::async_trait]
pub trait Task: Send + 'static {
    type Message: Send;

    async fn run(&mut self, rx: mpsc::Receiver<TaskMessage<Self::Message>>);
}

/// The two xApp tasks, in shutdown order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskId {
    Dispatcher,
    Indication,
}

impl TaskId {
    const SHUTDOWN_ORDER: [TaskId; 2] = [TaskId::Dispatcher, TaskId::Indication];
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskId::Dispatcher => write!(f, "Dispatcher"),
            TaskId::Indication => write!(f, "Indication"),
        }
    }
}

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    /// Not spawned yet
    #[default]
    Created,
    Running,
    /// Returned from `run` after a shutdown signal
    Stopped,
    /// Panicked, or did not stop within the shutdown timeout
    Failed,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Created => write!(f, "Created"),
            TaskState::Running => write!(f, "Running"),
            TaskState::Stopped => write!(f, "Stopped"),
            TaskState::Failed => write!(f, "Failed"),
        }
    }
}

/// A task that did not stop cleanly.
#[derive(Debug, Clone, Error)]
#[error("task {task_id} failed: {message}")]
pub struct TaskError {
    pub task_id: TaskId,
    pub message: String,
}

/// Sending side of a task channel.
#[derive(Debug)]
pub struct TaskHandle<T> {
    tx: mpsc::Sender<TaskMessage<T>>,
}

impl<T> Clone for TaskHandle<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> TaskHandle<T> {
    pub fn new(tx: mpsc::Sender<TaskMessage<T>>) -> Self {
        Self { tx }
    }

    /// Sends a message, failing if the task is gone.
    pub async fn send(&self, msg: T) -> Result<(), mpsc::error::SendError<TaskMessage<T>>> {
        self.tx.send(TaskMessage::Message(msg)).await
    }

    pub async fn shutdown(&self) -> Result<(), mpsc::error::SendError<TaskMessage<T>>> {
        self.tx.send(TaskMessage::Shutdown).await
    }
}

/// Handles to both xApp tasks.
#[derive(Debug, Clone)]
pub struct TaskHandles {
    pub dispatcher: TaskHandle<DispatcherMessage>,
    pub indication: TaskHandle<IndicationMessage>,
}

impl TaskHandles {
    async fn shutdown(&self, task_id: TaskId) {
        // The task may already be gone
        match task_id {
            TaskId::Dispatcher => {
                let _ = self.dispatcher.shutdown().await;
            }
            TaskId::Indication => {
                let _ = self.indication.shutdown().await;
            }
        }
    }
}

/// Owns the join handles of the xApp tasks and stops them in order.
pub struct TaskManager {
    handles: TaskHandles,
    states: HashMap<TaskId, TaskState>,
    joins: HashMap<TaskId, JoinHandle<()>>,
    shutdown_timeout: tokio::time::Duration,
}

impl TaskManager {
    /// Creates the manager along with the receivers for each task.
    #[allow(clippy::type_complexity)]
    pub fn new(
        channel_capacity: usize,
    ) -> (
        Self,
        mpsc::Receiver<TaskMessage<DispatcherMessage>>,
        mpsc::Receiver<TaskMessage<IndicationMessage>>,
    ) {
        let (dispatcher_tx, dispatcher_rx) = mpsc::channel(channel_capacity);
        let (indication_tx, indication_rx) = mpsc::channel(channel_capacity);

        let manager = Self {
            handles: TaskHandles {
                dispatcher: TaskHandle::new(dispatcher_tx),
                indication: TaskHandle::new(indication_tx),
            },
            states: TaskId::SHUTDOWN_ORDER
                .into_iter()
                .map(|id| (id, TaskState::Created))
                .collect(),
            joins: HashMap::new(),
            shutdown_timeout: tokio::time::Duration::from_millis(DEFAULT_SHUTDOWN_TIMEOUT_MS),
        };
        (manager, dispatcher_rx, indication_rx)
    }

    pub fn handles(&self) -> &TaskHandles {
        &self.handles
    }

    pub fn state(&self, task_id: TaskId) -> TaskState {
        self.states.get(&task_id).copied().unwrap_or_default()
    }

    /// State of each task, in shutdown order.
    pub fn status_summary(&self) -> Vec<(TaskId, TaskState)> {
        TaskId::SHUTDOWN_ORDER
            .into_iter()
            .map(|id| (id, self.state(id)))
            .collect()
    }

    /// Spawns a task and marks it running.
    pub fn spawn<T: Task>(
        &mut self,
        task_id: TaskId,
        mut task: T,
        rx: mpsc::Receiver<TaskMessage<T::Message>>,
    ) {
        let handle = tokio::spawn(async move { task.run(rx).await });
        self.joins.insert(task_id, handle);
        self.states.insert(task_id, TaskState::Running);
    }

    /// Stops the dispatcher, then the indication task.
    ///
    /// Each task gets the shutdown timeout to return from `run`. Returns the
    /// first task that panicked or overran.
    pub async fn shutdown(&mut self) -> Result<(), TaskError> {
        let mut first_error = None;

        for task_id in TaskId::SHUTDOWN_ORDER {
            let Some(handle) = self.joins.remove(&task_id) else {
                continue;
            };
            self.handles.shutdown(task_id).await;

            let result = match tokio::time::timeout(self.shutdown_timeout, handle).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) if e.is_panic() => Err("task panicked".to_string()),
                Ok(Err(e)) => Err(e.to_string()),
                Err(_) => Err("shutdown timeout".to_string()),
            };
            match result {
                Ok(()) => {
                    debug!(task = %task_id, "Task stopped");
                    self.states.insert(task_id, TaskState::Stopped);
                }
                Err(message) => {
                    warn!(task = %task_id, "Task did not stop cleanly: {}", message);
                    self.states.insert(task_id, TaskState::Failed);
                    first_error.get_or_insert(TaskError { task_id, message });
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}
