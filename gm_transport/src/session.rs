use bytes::Bytes;
use gm_ledger::CorrelationToken;

use crate::error::Result;

/// Asynchronous notification from the transport's session
///
/// Delivered on a transport-owned thread, out-of-band with respect to the
/// publishing loop. Under normal operation each token is acknowledged at
/// most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Broker verdict for one guaranteed message
    Acknowledgement { token: CorrelationToken, accepted: bool, diagnostic: Option<String> },

    /// The session is gone; the publisher should stop
    SessionDown { reason: String },
}

/// The seam to the external messaging transport
///
/// `send_async` enqueues a message for transmission and returns only local
/// validation errors; final accept/reject arrives later as a
/// [`SessionEvent::Acknowledgement`] carrying the same token.
pub trait Transport: Send {
    /// Hands a message to the transport for asynchronous delivery
    fn send_async(&mut self, payload: Bytes, token: CorrelationToken) -> Result<()>;

    /// Whether the transport currently has a usable session
    fn is_connected(&self) -> bool;
}
