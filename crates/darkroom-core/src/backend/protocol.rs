//! Messages exchanged between the dispatcher and the worker thread.

use serde_json::Value;

use crate::error::ProcessingError;
use crate::pipeline::{DecodedImage, OperationKind};
use crate::types::OperationOutput;

/// Correlation ID linking a request to its response.
pub type TaskId = u64;

/// One operation request. The decoded payload moves with the message.
#[derive(Debug)]
pub struct BackendRequest {
    pub correlation_id: TaskId,
    /// Wire name of the operation (`compress`, `thumbnail`, `metadata`)
    pub operation_kind: String,
    pub payload: DecodedImage,
    /// Operation parameters as a JSON object
    pub parameters: Value,
}

/// Everything the worker can send back.
#[derive(Debug)]
pub enum BackendResponse {
    /// The handler produced a result
    Completed {
        correlation_id: TaskId,
        operation_kind: OperationKind,
        result: OperationOutput,
    },
    /// The handler (or request parsing) failed for this task only
    Failed {
        correlation_id: TaskId,
        error: ProcessingError,
    },
    /// The worker itself broke; not tied to any task
    Fault { message: String },
}

impl BackendResponse {
    /// The task this response resolves, if any.
    pub fn correlation_id(&self) -> Option<TaskId> {
        match self {
            BackendResponse::Completed { correlation_id, .. }
            | BackendResponse::Failed { correlation_id, .. } => Some(*correlation_id),
            BackendResponse::Fault { .. } => None,
        }
    }
}
