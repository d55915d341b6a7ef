//! Error types for the data runloop.

use std::fmt;
use std::io;

/// Errors produced while driving a task lane.
///
/// These never unwind across a `tick`: a lane that observes one of these
/// transitions directly to its abort/free path (see `file_lane`, `http_lane`).
#[derive(Debug)]
pub enum DataRunloopError {
    /// Allocating an external handle (file reader, connection, decoder) failed.
    ResourceCreateFailed(String),
    /// An I/O step on an already-open handle failed.
    TransportFailed(String),
    /// A PNG buffer was missing a required chunk (IHDR/IDAT/IEND) when parsing finished.
    DecodeIncomplete,
    /// The PNG decoder reached a terminal error state.
    DecodeFailed(String),
    /// A message was dropped because its lane's queue was full.
    ///
    /// This is never returned from a lane's tick dispatch (queue overflow is
    /// silent by design, see `MessageQueue::dropped_count`); it exists so
    /// callers that want to treat overflow as an error can do so explicitly.
    QueueOverflow,
}

impl fmt::Display for DataRunloopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceCreateFailed(msg) => write!(f, "failed to create handle: {msg}"),
            Self::TransportFailed(msg) => write!(f, "transport error: {msg}"),
            Self::DecodeIncomplete => write!(f, "png buffer missing required chunks"),
            Self::DecodeFailed(msg) => write!(f, "png decode failed: {msg}"),
            Self::QueueOverflow => write!(f, "message queue is full"),
        }
    }
}

impl std::error::Error for DataRunloopError {}

impl From<io::Error> for DataRunloopError {
    fn from(err: io::Error) -> Self {
        Self::TransportFailed(err.to_string())
    }
}

/// A specialized `Result` for data runloop operations.
pub type Result<T> = std::result::Result<T, DataRunloopError>;
