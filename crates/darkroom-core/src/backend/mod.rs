//! Offloaded execution: a worker thread reached only through message passing.
//!
//! - **protocol**: request/response/fault messages
//! - **worker**: the dedicated thread that runs operation handlers, FIFO
//! - **dispatcher**: correlation IDs, pending tasks, timeouts, fault handling

pub mod dispatcher;
pub mod protocol;
pub mod worker;

pub use dispatcher::{TaskDispatcher, TaskHandle, DEFAULT_TASK_TIMEOUT};
pub use protocol::{BackendRequest, BackendResponse, TaskId};
pub use worker::spawn_worker;
