use thiserror::Error;

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur when handing a message to the transport
///
/// `send_async` only validates locally; the broker's accept/reject verdict
/// arrives later on the session event stream.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Transport buffers are full, message was not enqueued
    #[error("Send failed - transport buffer full, back pressure applied")]
    Backpressure,

    /// Transport has no established session
    #[error("Transport not connected")]
    NotConnected,

    /// Local validation or enqueue failure for this one message
    #[error("Failed to enqueue message: {0}")]
    SendFailed(String),

    /// The session is gone and no further sends can succeed
    #[error("Session down: {0}")]
    SessionDown(String),
}

impl TransportError {
    /// Whether the publishing loop should stop rather than move on to the
    /// next message
    pub fn is_fatal(&self) -> bool {
        matches!(self, TransportError::SessionDown(_))
    }
}
