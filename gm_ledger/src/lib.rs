pub mod error;
pub mod ledger;
pub mod pending;

pub use error::LedgerError;
pub use error::Result;
pub use ledger::CorrelationLedger;
pub use pending::AckOutcome;
pub use pending::CorrelationToken;
pub use pending::DrainReport;
