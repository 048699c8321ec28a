//! Coarse progress checkpoints for `process_image`.

use serde::Serialize;

/// Fixed checkpoints, emitted in order whichever executor runs the work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Input accepted, decoding about to start
    Started,
    /// Input decoded into a raster
    Decoded,
    /// Operation handed to an executor
    Dispatched,
    /// Executor returned a result
    BackendComplete,
    /// Caller-facing artifact built
    Assembled,
}

impl ProgressEvent {
    /// Completion percentage at this checkpoint.
    pub fn percent(&self) -> u8 {
        match self {
            ProgressEvent::Started => 10,
            ProgressEvent::Decoded => 30,
            ProgressEvent::Dispatched => 50,
            ProgressEvent::BackendComplete => 80,
            ProgressEvent::Assembled => 100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProgressEvent::Started => "decoding",
            ProgressEvent::Decoded => "decoded",
            ProgressEvent::Dispatched => "processing",
            ProgressEvent::BackendComplete => "encoding done",
            ProgressEvent::Assembled => "done",
        }
    }
}
