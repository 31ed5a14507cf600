use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use bytes::Bytes;
use gm_ledger::CorrelationLedger;
use gm_transport::Transport;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::clock::PacingClock;
use crate::config::PacerConfig;

/// Outcome of a publishing run
#[derive(Debug, Clone, Copy)]
pub struct PublishStats {
    /// Messages accepted by the transport for delivery
    pub sent: u64,

    /// Transient send failures (the message was skipped, not retried)
    pub send_failures: u64,

    /// Ledger entries released by head-of-line draining
    pub released: u64,

    /// Wall-clock duration of the run including the acknowledgement grace
    /// window
    pub elapsed: Duration,

    /// Whether the run was cut short by the cancellation flag
    pub cancelled: bool,
}

impl PublishStats {
    /// Achieved send rate in messages/second
    pub fn achieved_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.sent as f64 / secs } else { 0.0 }
    }
}

/// Rate-paced guaranteed-message publishing loop
///
/// Each message is registered with the shared ledger before it is handed to
/// the transport, so the broker's later verdict can be reconciled back to
/// the entry from the notification thread. Pacing and acknowledgement
/// draining both happen at batch boundaries; the running flag is checked
/// once per message so cancellation latency is bounded by a single send,
/// not a batch.
pub struct PacedPublisher<T> {
    transport: T,
    ledger: Arc<CorrelationLedger>,
    running: Arc<AtomicBool>,
    config: PacerConfig,
}

impl<T: Transport> PacedPublisher<T> {
    pub fn new(transport: T, ledger: Arc<CorrelationLedger>, running: Arc<AtomicBool>, config: PacerConfig) -> Self {
        Self { transport, ledger, running, config }
    }

    /// Runs the publishing loop to completion
    ///
    /// Returns once the configured message count has been sent, the running
    /// flag is cleared, or the transport reports a session-fatal error. In
    /// all cases a bounded grace window lets outstanding acknowledgements
    /// arrive before the caller drains the ledger for shutdown.
    pub fn run(&mut self) -> PublishStats {
        // One shared buffer for every send; the ledger entry and the
        // transport each hold a cheap reference to it
        let payload = Bytes::from(vec![0u8; self.config.payload_size]);

        let mut clock = PacingClock::new(&self.config);
        let start = Instant::now();
        let mut sent = 0u64;
        let mut send_failures = 0u64;
        let mut released = 0u64;
        let mut in_batch = 0u32;
        let mut cancelled = false;

        info!("Publishing {} messages at {} msgs/sec, batch size {}", self.config.message_count, self.config.target_rate, self.config.batch_size);

        while sent < self.config.message_count {
            if !self.running.load(Ordering::Relaxed) {
                info!("Cancellation observed after {sent} messages");
                cancelled = true;
                break;
            }

            let token = self.ledger.register(payload.clone());
            match self.transport.send_async(payload.clone(), token) {
                Ok(()) => {
                    sent += 1;
                    in_batch += 1;
                }
                Err(err) if err.is_fatal() => {
                    error!("Stopping publish loop, token {token}: {err}");
                    break;
                }
                Err(err) => {
                    // Skipped, not retried; redelivery is the transport's
                    // concern. The ledger entry stays until shutdown drain.
                    warn!("Send failed for token {token}: {err}");
                    send_failures += 1;
                }
            }

            if in_batch >= self.config.batch_size {
                in_batch = 0;
                released += self.ledger.drain_acknowledged() as u64;
                clock.batch_complete();
            }
        }

        // Let in-flight verdicts arrive before shutdown, as the last sends
        // may not have been acknowledged yet
        let grace_deadline = Instant::now() + Duration::from_millis(self.config.ack_grace_ms);
        loop {
            released += self.ledger.drain_acknowledged() as u64;
            if self.ledger.is_empty() || Instant::now() >= grace_deadline {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }

        let stats = PublishStats { sent, send_failures, released, elapsed: start.elapsed(), cancelled };
        info!("Sent {} msgs in {:?}; rate of {:.0} msgs/sec", stats.sent, stats.elapsed, stats.achieved_rate());
        stats
    }
}
