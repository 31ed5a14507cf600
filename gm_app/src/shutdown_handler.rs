use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

/// Installs a Ctrl+C handler that clears the running flag
///
/// The publishing loop polls the flag between message sends, so shutdown
/// latency is bounded by a single send rather than a pacing batch.
pub fn setup(running: Arc<AtomicBool>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        tracing::info!("Interrupt received, finishing up");
        running.store(false, Ordering::Relaxed);
    })
}
