use std::thread::JoinHandle;
use std::time::Duration;
use std::time::Instant;

use bytes::Bytes;
use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::unbounded;
use gm_ledger::CorrelationToken;
use tracing::debug;
use tracing::info;

use crate::error::Result;
use crate::error::TransportError;
use crate::session::SessionEvent;
use crate::session::Transport;

/// Configuration for the simulated broker
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SimConfig {
    /// Delay between send and acknowledgement (microseconds)
    pub ack_latency_us: u64,

    /// Reject every Nth message instead of accepting it
    pub reject_every: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ack_latency_us: 500, // Half a millisecond round trip
            reject_every: None,
        }
    }
}

/// One message handed to the simulated broker
struct InFlight {
    token: CorrelationToken,
    accepted: bool,
    deliver_at: Instant,
}

/// In-process stand-in for the external messaging transport
///
/// Sends are enqueued to a broker thread which acknowledges each token after
/// a configurable latency, in send order. The session event stream is handed
/// back from [`SimTransport::connect`] exactly as a real transport would
/// deliver events from its own notification thread.
pub struct SimTransport {
    tx: Option<Sender<InFlight>>,
    broker: Option<JoinHandle<()>>,
    config: SimConfig,
    sent: u64,
}

impl SimTransport {
    /// Starts the broker thread and returns the transport plus its session
    /// event stream
    pub fn connect(config: SimConfig) -> (Self, Receiver<SessionEvent>) {
        let (tx, rx) = unbounded::<InFlight>();
        let (event_tx, event_rx) = unbounded::<SessionEvent>();

        let broker = std::thread::spawn(move || {
            // Messages arrive in send order with non-decreasing deliver_at,
            // so a single sleep-until per message preserves ordering
            while let Ok(msg) = rx.recv() {
                let now = Instant::now();
                if msg.deliver_at > now {
                    std::thread::sleep(msg.deliver_at - now);
                }

                let diagnostic = (!msg.accepted).then(|| "rejected by simulated broker".to_string());
                let event = SessionEvent::Acknowledgement { token: msg.token, accepted: msg.accepted, diagnostic };
                if event_tx.send(event).is_err() {
                    // Nobody is listening any more
                    break;
                }
            }
            debug!("Simulated broker thread exiting");
        });

        info!("Simulated transport connected, ack latency {}us", config.ack_latency_us);

        (Self { tx: Some(tx), broker: Some(broker), config, sent: 0 }, event_rx)
    }

    /// Number of messages accepted for delivery so far
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl Transport for SimTransport {
    // The payload stays with the ledger entry; the simulated broker only
    // needs the token and a verdict.
    fn send_async(&mut self, _payload: Bytes, token: CorrelationToken) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(TransportError::NotConnected)?;

        self.sent += 1;
        let accepted = match self.config.reject_every {
            Some(n) if n > 0 => self.sent % n != 0,
            _ => true,
        };

        let deliver_at = Instant::now() + Duration::from_micros(self.config.ack_latency_us);
        tx.send(InFlight { token, accepted, deliver_at })
            .map_err(|_| TransportError::SessionDown("simulated broker thread gone".to_string()))?;

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.tx.is_some()
    }
}

impl Drop for SimTransport {
    fn drop(&mut self) {
        // Close the send side so the broker drains what is queued and exits
        self.tx.take();
        if let Some(broker) = self.broker.take() {
            let _ = broker.join();
        }
    }
}
