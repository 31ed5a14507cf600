use thiserror::Error;

use crate::pending::CorrelationToken;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors raised while reconciling broker acknowledgements
///
/// Both variants are diagnostics, not stop conditions: the notifier thread
/// reports them and keeps consuming events.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    /// The token was never registered, or its entry was already drained
    #[error("No in-flight message for correlation token {0}")]
    UnknownCorrelation(CorrelationToken),

    /// A second acknowledgement arrived for a token that is already resolved
    #[error("Duplicate acknowledgement for correlation token {0}")]
    DuplicateAcknowledgement(CorrelationToken),
}
