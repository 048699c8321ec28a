//! The execution backend: a dedicated thread that owns an operation handler.
//!
//! Requests are processed strictly one at a time in receipt order. The only
//! link to the rest of the process is the pair of channels returned by
//! [`spawn_worker`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tokio::sync::mpsc;

use crate::pipeline::{Operation, OperationHandler};

use super::protocol::{BackendRequest, BackendResponse};

/// Name given to the worker thread.
pub const WORKER_THREAD_NAME: &str = "darkroom-worker";

/// Start a worker thread running `handler`.
///
/// Returns the request sender and response receiver. Dropping the sender
/// stops the worker after it drains queued requests.
pub fn spawn_worker<H: OperationHandler>(
    handler: H,
) -> std::io::Result<(
    mpsc::UnboundedSender<BackendRequest>,
    mpsc::UnboundedReceiver<BackendResponse>,
)> {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (response_tx, response_rx) = mpsc::unbounded_channel();

    std::thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || run(handler, request_rx, response_tx))?;

    Ok((request_tx, response_rx))
}

fn run<H: OperationHandler>(
    handler: H,
    mut requests: mpsc::UnboundedReceiver<BackendRequest>,
    responses: mpsc::UnboundedSender<BackendResponse>,
) {
    tracing::debug!("Worker started");

    while let Some(request) = requests.blocking_recv() {
        let correlation_id = request.correlation_id;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| execute(&handler, request)));

        let response = match outcome {
            Ok(response) => response,
            Err(panic) => {
                let message = format!(
                    "handler panicked on task {correlation_id}: {}",
                    panic_message(panic.as_ref())
                );
                tracing::error!("Worker fault: {message}");
                let _ = responses.send(BackendResponse::Fault { message });
                return;
            }
        };

        if responses.send(response).is_err() {
            // Dispatcher gone, nobody to answer
            break;
        }
    }

    tracing::debug!("Worker stopped");
}

fn execute<H: OperationHandler>(handler: &H, request: BackendRequest) -> BackendResponse {
    let BackendRequest {
        correlation_id,
        operation_kind,
        payload,
        parameters,
    } = request;

    let result = Operation::from_wire(&operation_kind, parameters).and_then(|operation| {
        tracing::trace!("Task {correlation_id}: {operation_kind}");
        handler
            .handle(&operation, payload)
            .map(|output| (operation.kind(), output))
    });

    match result {
        Ok((operation_kind, result)) => BackendResponse::Completed {
            correlation_id,
            operation_kind,
            result,
        },
        Err(error) => BackendResponse::Failed {
            correlation_id,
            error,
        },
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
