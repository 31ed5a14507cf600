use std::collections::VecDeque;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;
use tracing::warn;

use crate::error::LedgerError;
use crate::error::Result;
use crate::pending::CorrelationToken;
use crate::pending::DrainReport;
use crate::pending::PendingMessage;

/// Ordered ledger of in-flight guaranteed messages
///
/// The publisher registers each message before handing it to the transport;
/// the transport's notification thread reconciles acknowledgements back by
/// token. Entries are released strictly in send order (head-of-line
/// draining), so a slow acknowledgement at the head delays release of
/// already-resolved entries behind it. That trade-off keeps draining a
/// simple bounded walk from the front.
///
/// A single mutex guards the list and the token counter. Acknowledgement
/// rates are far below send rates in practice, so contention on the lock is
/// not a concern and nothing lock-free is needed here.
pub struct CorrelationLedger {
    inner: Mutex<LedgerInner>,
}

struct LedgerInner {
    /// Send-ordered entries; tokens are monotonic, so the queue is always
    /// sorted by token and reconcile can binary-search it.
    entries: VecDeque<PendingMessage>,
    next_token: u64,
}

impl CorrelationLedger {
    pub fn new() -> Self {
        Self { inner: Mutex::new(LedgerInner { entries: VecDeque::new(), next_token: 1 }) }
    }

    /// Registers a message about to be sent, taking ownership of its payload
    ///
    /// Returns the correlation token to attach to the outgoing message. The
    /// payload stays owned by the ledger entry until the entry is drained.
    pub fn register(&self, payload: Bytes) -> CorrelationToken {
        let mut inner = self.inner.lock();
        let token = CorrelationToken(inner.next_token);
        inner.next_token += 1;
        inner.entries.push_back(PendingMessage::new(token, payload));
        token
    }

    /// Records the broker's verdict for one in-flight message
    ///
    /// Called from the transport's notification thread. Each token resolves
    /// exactly once: a token that is absent (never registered, or already
    /// drained) yields `UnknownCorrelation`; a token that already resolved
    /// yields `DuplicateAcknowledgement` and the first verdict stands.
    pub fn reconcile(&self, token: CorrelationToken, accepted: bool) -> Result<()> {
        let mut inner = self.inner.lock();

        let idx = inner
            .entries
            .binary_search_by_key(&token, |entry| entry.token)
            .map_err(|_| LedgerError::UnknownCorrelation(token))?;

        let entry = &mut inner.entries[idx];
        if entry.acknowledged {
            return Err(LedgerError::DuplicateAcknowledgement(token));
        }

        entry.acknowledged = true;
        entry.accepted = accepted;
        debug!("Reconciled token {token}: accepted={accepted}");

        Ok(())
    }

    /// Releases acknowledged entries from the head of the list
    ///
    /// Stops at the first unacknowledged entry, so the released set is
    /// always a prefix of send order even when the broker acknowledges out
    /// of order. Returns the number of entries released.
    pub fn drain_acknowledged(&self) -> usize {
        let mut inner = self.inner.lock();
        let mut released = 0;

        while let Some(head) = inner.entries.front() {
            if !head.acknowledged {
                break;
            }
            if !head.accepted {
                warn!("Releasing rejected message, token {}", head.token);
            }
            inner.entries.pop_front();
            released += 1;
        }

        released
    }

    /// Releases every remaining entry, acknowledged or not
    ///
    /// Shutdown path. Returns one report per released entry so the caller
    /// can log messages that never resolved or were rejected. The ledger is
    /// empty afterwards.
    pub fn drain_all(&self) -> Vec<DrainReport> {
        let mut inner = self.inner.lock();
        inner.entries.drain(..).map(|entry| entry.report()).collect()
    }

    /// Number of in-flight entries
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl Default for CorrelationLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::*;
    use crate::pending::AckOutcome;

    fn payload() -> Bytes {
        Bytes::from_static(b"test payload")
    }

    #[test]
    fn test_register_assigns_monotonic_tokens() {
        let ledger = CorrelationLedger::new();
        assert_eq!(ledger.register(payload()), CorrelationToken(1));
        assert_eq!(ledger.register(payload()), CorrelationToken(2));
        assert_eq!(ledger.register(payload()), CorrelationToken(3));
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_drain_releases_acknowledged_prefix() {
        let ledger = CorrelationLedger::new();
        let t1 = ledger.register(payload());
        let t2 = ledger.register(payload());
        let t3 = ledger.register(payload());

        // Acknowledgements arrive out of order
        ledger.reconcile(t2, true).unwrap();
        ledger.reconcile(t1, true).unwrap();

        // 1 and 2 are both resolved and contiguous from the head; 3 is not
        assert_eq!(ledger.drain_acknowledged(), 2);
        assert_eq!(ledger.len(), 1);

        ledger.reconcile(t3, true).unwrap();
        assert_eq!(ledger.drain_acknowledged(), 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_unacknowledged_head_blocks_drain() {
        let ledger = CorrelationLedger::new();
        let _t1 = ledger.register(payload());
        let t2 = ledger.register(payload());

        ledger.reconcile(t2, false).unwrap();

        // Token 1 is still pending at the head, so nothing can be released
        assert_eq!(ledger.drain_acknowledged(), 0);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_drain_all_reports_final_states() {
        let ledger = CorrelationLedger::new();
        let t1 = ledger.register(payload());
        let t2 = ledger.register(payload());

        ledger.reconcile(t2, false).unwrap();

        let reports = ledger.drain_all();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0], DrainReport { token: t1, outcome: AckOutcome::Pending });
        assert_eq!(reports[1], DrainReport { token: t2, outcome: AckOutcome::Rejected });
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_reconcile_unknown_token() {
        let ledger = CorrelationLedger::new();
        let err = ledger.reconcile(CorrelationToken(7), true).unwrap_err();
        assert_eq!(err, LedgerError::UnknownCorrelation(CorrelationToken(7)));
    }

    #[test]
    fn test_reconcile_drained_token_is_unknown() {
        let ledger = CorrelationLedger::new();
        let t1 = ledger.register(payload());

        ledger.reconcile(t1, true).unwrap();
        assert_eq!(ledger.drain_acknowledged(), 1);

        let err = ledger.reconcile(t1, true).unwrap_err();
        assert_eq!(err, LedgerError::UnknownCorrelation(t1));
    }

    #[test]
    fn test_duplicate_acknowledgement_keeps_first_verdict() {
        let ledger = CorrelationLedger::new();
        let t1 = ledger.register(payload());

        ledger.reconcile(t1, false).unwrap();
        let err = ledger.reconcile(t1, true).unwrap_err();
        assert_eq!(err, LedgerError::DuplicateAcknowledgement(t1));

        // The rejection recorded first must survive the duplicate
        let reports = ledger.drain_all();
        assert_eq!(reports[0].outcome, AckOutcome::Rejected);
    }

    #[test]
    fn test_reconcile_from_notification_thread() {
        let ledger = Arc::new(CorrelationLedger::new());
        let tokens: Vec<_> = (0..100).map(|_| ledger.register(payload())).collect();

        // Resolve everything from a separate thread, as the transport's
        // notification thread would, in reverse order for good measure.
        let notifier = {
            let ledger = Arc::clone(&ledger);
            std::thread::spawn(move || {
                for token in tokens.into_iter().rev() {
                    ledger.reconcile(token, true).unwrap();
                }
            })
        };
        notifier.join().unwrap();

        assert_eq!(ledger.drain_acknowledged(), 100);
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_concurrent_register_and_reconcile() {
        let ledger = Arc::new(CorrelationLedger::new());
        let mut released = 0;

        let notifier = {
            let ledger = Arc::clone(&ledger);
            std::thread::spawn(move || {
                let mut resolved = 0u64;
                // Keep acknowledging the oldest in-flight entry until all
                // 500 have been resolved
                while resolved < 500 {
                    let token = CorrelationToken(resolved + 1);
                    if ledger.reconcile(token, true).is_ok() {
                        resolved += 1;
                    } else {
                        std::thread::yield_now();
                    }
                }
            })
        };

        for _ in 0..500 {
            ledger.register(payload());
            released += ledger.drain_acknowledged();
        }

        notifier.join().unwrap();
        released += ledger.drain_acknowledged();

        assert_eq!(released, 500);
        assert!(ledger.is_empty());
    }

    proptest! {
        /// Whatever subset of tokens resolves, in whatever order, the
        /// released set is a strict prefix of send order and never skips an
        /// unacknowledged entry.
        #[test]
        fn prop_drain_releases_strict_prefix(acked in proptest::collection::vec(any::<bool>(), 1..64)) {
            let ledger = CorrelationLedger::new();
            let tokens: Vec<_> = acked.iter().map(|_| ledger.register(payload())).collect();

            // Acknowledge the flagged tokens back-to-front so arrival order
            // never matches send order
            for (token, flag) in tokens.iter().zip(&acked).rev() {
                if *flag {
                    ledger.reconcile(*token, true).unwrap();
                }
            }

            let expected_prefix = acked.iter().take_while(|flag| **flag).count();
            prop_assert_eq!(ledger.drain_acknowledged(), expected_prefix);
            prop_assert_eq!(ledger.len(), acked.len() - expected_prefix);

            // Everything left is drainable at shutdown and the first
            // remaining entry, if any, is unacknowledged
            let reports = ledger.drain_all();
            prop_assert_eq!(reports.len(), acked.len() - expected_prefix);
            if let Some(first) = reports.first() {
                prop_assert_eq!(first.outcome, AckOutcome::Pending);
            }
        }
    }
}
