//! Caller-side task tracking for the worker backend.
//!
//! Every submitted operation becomes a pending task keyed by a fresh
//! correlation ID. A task leaves the pending set exactly once: through its
//! response, its timeout timer, or a backend fault. Whichever path removes it
//! from the map fulfils its completion slot; the others find nothing to do.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{ProcessingError, ProcessingResult};
use crate::pipeline::{DecodedImage, Operation, OperationHandler, OperationKind};
use crate::types::OperationOutput;

use super::protocol::{BackendRequest, BackendResponse, TaskId};
use super::worker::spawn_worker;

/// Default per-task timeout.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(30);

type Completion = oneshot::Sender<ProcessingResult<OperationOutput>>;

/// A dispatched operation awaiting its outcome.
struct Task {
    kind: OperationKind,
    requested_at: Instant,
    completion: Completion,
    timer: Option<JoinHandle<()>>,
}

impl Task {
    fn finish(self, result: ProcessingResult<OperationOutput>) {
        if let Some(timer) = self.timer {
            timer.abort();
        }
        // The handle may have been dropped; nobody to tell
        let _ = self.completion.send(result);
    }
}

#[derive(Default)]
struct State {
    pending: HashMap<TaskId, Task>,
    fault: Option<String>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take(&self, id: TaskId) -> Option<Task> {
        self.lock().pending.remove(&id)
    }

    /// Resolve a task from a worker response, checking the result fits the request.
    fn resolve(&self, id: TaskId, outcome: ProcessingResult<(OperationKind, OperationOutput)>) {
        let Some(task) = self.take(id) else {
            tracing::debug!("Ignoring response for retired task {id}");
            return;
        };

        let result = outcome.and_then(|(kind, output)| {
            if kind == task.kind && output.matches(kind) {
                Ok(output)
            } else {
                Err(ProcessingError::BackendFault(format!(
                    "task {id} expected a {} result, got {kind}",
                    task.kind
                )))
            }
        });
        tracing::debug!(
            "Task {id} ({}) resolved after {:?}",
            task.kind,
            task.requested_at.elapsed()
        );
        task.finish(result);
    }

    fn expire(&self, id: TaskId, timeout: Duration) {
        if let Some(task) = self.take(id) {
            tracing::warn!("Task {id} ({}) timed out after {timeout:?}", task.kind);
            let _ = task.completion.send(Err(ProcessingError::Timeout {
                stage: format!("task {id}"),
                timeout_ms: timeout.as_millis() as u64,
            }));
        }
    }

    /// Reject every pending task and refuse new ones.
    fn fail_all(&self, message: &str) {
        let drained: Vec<Task> = {
            let mut state = self.lock();
            state.fault.get_or_insert_with(|| message.to_string());
            state.pending.drain().map(|(_, task)| task).collect()
        };
        if !drained.is_empty() {
            tracing::error!(
                "Backend fault, failing {} pending task(s): {message}",
                drained.len()
            );
        }
        for task in drained {
            task.finish(Err(ProcessingError::BackendFault(message.to_string())));
        }
    }
}

/// Handle to one submitted task.
///
/// Awaiting [`TaskHandle::wait`] yields the single outcome of the task.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    kind: OperationKind,
    completion: oneshot::Receiver<ProcessingResult<OperationOutput>>,
}

impl TaskHandle {
    /// Correlation ID of the task.
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Wait for the task's result, error, or timeout.
    pub async fn wait(self) -> ProcessingResult<OperationOutput> {
        self.completion.await.unwrap_or_else(|_| {
            Err(ProcessingError::BackendFault(
                "task dropped without an outcome".to_string(),
            ))
        })
    }
}

/// Sends operations to the worker backend and correlates its responses.
///
/// Must be created and used from within a Tokio runtime: it runs a response
/// listener task and one timer task per pending request.
pub struct TaskDispatcher {
    requests: Option<mpsc::UnboundedSender<BackendRequest>>,
    shared: Arc<Shared>,
    next_id: AtomicU64,
    default_timeout: Duration,
    listener: Option<JoinHandle<()>>,
}

impl TaskDispatcher {
    /// Start a worker thread running `handler` and connect to it.
    pub fn spawn<H: OperationHandler>(
        handler: H,
        default_timeout: Duration,
    ) -> std::io::Result<Self> {
        let (requests, responses) = spawn_worker(handler)?;
        Ok(Self::connect(requests, responses, default_timeout))
    }

    /// Connect to a backend through an existing channel pair.
    pub fn connect(
        requests: mpsc::UnboundedSender<BackendRequest>,
        responses: mpsc::UnboundedReceiver<BackendResponse>,
        default_timeout: Duration,
    ) -> Self {
        let shared = Arc::new(Shared::default());
        let listener = tokio::spawn(listen(responses, Arc::clone(&shared)));
        Self {
            requests: Some(requests),
            shared,
            next_id: AtomicU64::new(1),
            default_timeout,
            listener: Some(listener),
        }
    }

    /// A dispatcher for environments without a backend; every submit fails.
    pub fn unavailable(default_timeout: Duration) -> Self {
        Self {
            requests: None,
            shared: Arc::new(Shared::default()),
            next_id: AtomicU64::new(1),
            default_timeout,
            listener: None,
        }
    }

    /// Whether submissions can currently reach a backend.
    pub fn is_available(&self) -> bool {
        self.requests.is_some() && self.shared.lock().fault.is_none()
    }

    /// Number of tasks awaiting an outcome.
    pub fn pending_count(&self) -> usize {
        self.shared.lock().pending.len()
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Submit an operation; `timeout` defaults to the dispatcher's default.
    ///
    /// Fails immediately with `UnsupportedBackend` when there is no backend and
    /// with `BackendFault` once the backend has failed. Otherwise the payload
    /// is handed to the worker and a handle to the eventual outcome returned.
    pub fn submit(
        &self,
        operation: Operation,
        payload: DecodedImage,
        timeout: Option<Duration>,
    ) -> ProcessingResult<TaskHandle> {
        let requests = self
            .requests
            .as_ref()
            .ok_or(ProcessingError::UnsupportedBackend)?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let kind = operation.kind();
        let timeout = timeout.unwrap_or(self.default_timeout);
        let (completion, receiver) = oneshot::channel();

        {
            let mut state = self.shared.lock();
            if let Some(reason) = &state.fault {
                return Err(ProcessingError::BackendFault(reason.clone()));
            }
            state.pending.insert(
                id,
                Task {
                    kind,
                    requested_at: Instant::now(),
                    completion,
                    timer: None,
                },
            );
        }

        let request = BackendRequest {
            correlation_id: id,
            operation_kind: kind.as_str().to_string(),
            payload,
            parameters: operation.parameters(),
        };
        if requests.send(request).is_err() {
            self.shared.take(id);
            return Err(ProcessingError::BackendFault(
                "backend is no longer running".to_string(),
            ));
        }
        tracing::debug!("Dispatched task {id} ({kind})");

        let shared = Arc::clone(&self.shared);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            shared.expire(id, timeout);
        });
        match self.shared.lock().pending.get_mut(&id) {
            Some(task) => task.timer = Some(timer),
            // Already answered
            None => timer.abort(),
        }

        Ok(TaskHandle {
            id,
            kind,
            completion: receiver,
        })
    }

    /// Submit with the default timeout and wait for the outcome.
    pub async fn run(
        &self,
        operation: Operation,
        payload: DecodedImage,
    ) -> ProcessingResult<OperationOutput> {
        self.submit(operation, payload, None)?.wait().await
    }
}

impl Drop for TaskDispatcher {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        self.shared.fail_all("dispatcher dropped");
    }
}

/// Drain worker responses until the worker faults or goes away.
async fn listen(mut responses: mpsc::UnboundedReceiver<BackendResponse>, shared: Arc<Shared>) {
    while let Some(response) = responses.recv().await {
        match response {
            BackendResponse::Completed {
                correlation_id,
                operation_kind,
                result,
            } => shared.resolve(correlation_id, Ok((operation_kind, result))),
            BackendResponse::Failed {
                correlation_id,
                error,
            } => shared.resolve(correlation_id, Err(error)),
            BackendResponse::Fault { message } => {
                shared.fail_all(&message);
                return;
            }
        }
    }
    shared.fail_all("worker exited");
}
