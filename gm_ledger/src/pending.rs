use std::fmt;

use bytes::Bytes;

/// Opaque identifier linking a sent message to its later acknowledgement
///
/// Tokens are assigned by the ledger at registration time, monotonically
/// increasing from 1, and are never reused while the entry they name is
/// still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorrelationToken(pub u64);

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final state of a drained entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// Never acknowledged before it was drained (shutdown path only)
    Pending,

    /// Broker accepted the message
    Accepted,

    /// Broker rejected the message
    Rejected,
}

/// Per-entry diagnostic produced when entries are released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub token: CorrelationToken,
    pub outcome: AckOutcome,
}

/// A message sent but not yet released
///
/// The payload is owned exclusively by this entry from registration until
/// the entry is drained; dropping the entry releases it.
#[derive(Debug)]
pub(crate) struct PendingMessage {
    pub(crate) token: CorrelationToken,
    pub(crate) payload: Bytes,
    pub(crate) acknowledged: bool,
    pub(crate) accepted: bool,
}

impl PendingMessage {
    pub(crate) fn new(token: CorrelationToken, payload: Bytes) -> Self {
        Self { token, payload, acknowledged: false, accepted: false }
    }

    pub(crate) fn outcome(&self) -> AckOutcome {
        if !self.acknowledged {
            AckOutcome::Pending
        } else if self.accepted {
            AckOutcome::Accepted
        } else {
            AckOutcome::Rejected
        }
    }

    pub(crate) fn report(&self) -> DrainReport {
        DrainReport { token: self.token, outcome: self.outcome() }
    }
}
