/// Configuration for the paced publisher
///
/// The drift thresholds and batch size are tuning parameters, not protocol
/// requirements; the defaults match values that have worked well in
/// practice for high-rate guaranteed publishing.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PacerConfig {
    /// Target publish rate (messages/second)
    pub target_rate: u64,

    /// Messages per pacing batch; drift is corrected at batch boundaries
    pub batch_size: u32,

    /// Total number of messages to publish
    pub message_count: u64,

    /// Payload size in bytes
    pub payload_size: usize,

    /// Sleep off positive drift larger than this (microseconds)
    pub catch_up_threshold_us: u64,

    /// Falling behind by more than this resets the time base instead of
    /// bursting to catch up (microseconds)
    pub resync_threshold_us: u64,

    /// How long to wait for outstanding acknowledgements after the last
    /// send (milliseconds)
    pub ack_grace_ms: u64,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            target_rate: 10_000,
            batch_size: 10,
            message_count: 100_000,
            payload_size: 1024,
            catch_up_threshold_us: 1_000,   // 1ms ahead: worth sleeping off
            resync_threshold_us: 10_000,    // 10ms behind: resync, don't burst
            ack_grace_ms: 1_000,
        }
    }
}
