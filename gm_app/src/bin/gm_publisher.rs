use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use gm_app::cli;
use gm_app::config_loader;
use gm_app::shutdown_handler;
use gm_ledger::CorrelationLedger;
use gm_pacer::PacedPublisher;
use gm_transport::SessionEvent;
use gm_transport::SimTransport;
use tracing::error;
use tracing::info;
use tracing::warn;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // CRITICAL: Keep guard alive for entire application lifetime
    let _guard = gm_app::tracing_setup::init_with_stdout("gm_publisher", "./logs", tracing::Level::INFO);

    let config_path = cli::get_config_path("config/publisher.toml");
    let config = config_loader::load_publisher_config_or_default(&config_path);
    info!("Starting guaranteed-message publisher: {} msgs at {} msgs/sec", config.pacer.message_count, config.pacer.target_rate);

    // Set up running flag and Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    shutdown_handler::setup(Arc::clone(&running))?;

    // Shared ledger: written by the publish loop, reconciled by the
    // notification thread
    let ledger = Arc::new(CorrelationLedger::new());

    // Connect the simulated transport; it owns the broker thread and hands
    // back the session event stream
    let (transport, events) = SimTransport::connect(config.sim);

    // Notification thread: reconcile each broker verdict back to the ledger
    let notifier_handle = {
        let ledger = Arc::clone(&ledger);
        let running = Arc::clone(&running);
        std::thread::spawn(move || {
            for event in events.iter() {
                match event {
                    SessionEvent::Acknowledgement { token, accepted, diagnostic } => {
                        if let Some(reason) = diagnostic {
                            warn!("Broker rejected token {token}: {reason}");
                        }
                        if let Err(err) = ledger.reconcile(token, accepted) {
                            // Duplicate or stale verdicts are anomalies
                            // worth surfacing, not stop conditions
                            warn!("Reconcile failed: {err}");
                        }
                    }
                    SessionEvent::SessionDown { reason } => {
                        error!("Session down: {reason}");
                        running.store(false, Ordering::Relaxed);
                    }
                }
            }
            info!("Notification thread exiting");
        })
    };

    // Run the paced publish loop on the main thread
    let mut publisher = PacedPublisher::new(transport, Arc::clone(&ledger), Arc::clone(&running), config.pacer);
    let stats = publisher.run();

    info!(
        "Run complete: sent={}, failures={}, released={}, cancelled={}, rate={:.0} msgs/sec",
        stats.sent,
        stats.send_failures,
        stats.released,
        stats.cancelled,
        stats.achieved_rate()
    );

    // Dropping the publisher drops the transport, which flushes the broker
    // thread and closes the event stream; the notifier then drains out
    drop(publisher);
    let _ = notifier_handle.join();

    // Release anything still unresolved so nothing leaks on exit
    for report in ledger.drain_all() {
        warn!("Releasing message {} at shutdown, final state: {:?}", report.token, report.outcome);
    }

    info!("Shutdown complete");
    Ok(())
}
