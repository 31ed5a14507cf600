use std::time::Duration;
use std::time::Instant;

use crate::config::PacerConfig;

/// Margin added to a catch-up sleep to absorb timer granularity (microseconds)
const SLEEP_GUARD_US: i64 = 500;

/// What the clock decided at a batch boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceOutcome {
    /// Within tolerance of the target; keep sending
    OnSchedule,

    /// Ahead of the target rate; sleep this long before the next batch
    Sleep(Duration),

    /// Fell too far behind; the time base was reset to now so the loop does
    /// not burst to catch up
    Resynced,
}

/// Batch-level drift-corrected pacing clock
///
/// Per-message sleeps are useless at high rates because timer granularity
/// dominates, so drift is measured and corrected once per batch. The policy
/// is two-sided: small positive drift is slept off, but falling behind by
/// more than the resync threshold abandons the old time base entirely.
/// Catching up from a long stall would otherwise mean an unbounded burst;
/// this caps the post-stall burst at a single batch.
pub struct PacingClock {
    epoch: Instant,
    target_us: i64,
    us_per_batch: i64,
    catch_up_threshold_us: i64,
    resync_threshold_us: i64,
}

impl PacingClock {
    pub fn new(config: &PacerConfig) -> Self {
        assert!(config.target_rate > 0, "Target rate must be greater than 0");
        assert!(config.batch_size > 0, "Batch size must be greater than 0");

        let us_per_batch = (config.batch_size as i64 * 1_000_000) / config.target_rate as i64;

        Self {
            epoch: Instant::now(),
            target_us: us_per_batch,
            us_per_batch,
            catch_up_threshold_us: config.catch_up_threshold_us as i64,
            resync_threshold_us: config.resync_threshold_us as i64,
        }
    }

    /// Microseconds since the clock was created
    #[inline]
    pub fn now_us(&self) -> i64 {
        self.epoch.elapsed().as_micros() as i64
    }

    /// Microseconds per batch at the configured rate
    pub fn us_per_batch(&self) -> i64 {
        self.us_per_batch
    }

    /// Drift decision for a batch that completed at `now_us`
    ///
    /// Pure so the policy can be tested with synthetic timestamps; it does
    /// not sleep. The target always advances by one batch interval.
    pub fn plan(&mut self, now_us: i64) -> PaceOutcome {
        let drift = self.target_us - now_us;

        let outcome = if drift > self.catch_up_threshold_us {
            PaceOutcome::Sleep(Duration::from_micros((drift + SLEEP_GUARD_US) as u64))
        } else if drift < -self.resync_threshold_us {
            self.target_us = now_us;
            PaceOutcome::Resynced
        } else {
            PaceOutcome::OnSchedule
        };

        self.target_us += self.us_per_batch;
        outcome
    }

    /// Applies the drift decision for a batch that just completed, sleeping
    /// if ahead of schedule
    pub fn batch_complete(&mut self) -> PaceOutcome {
        let outcome = self.plan(self.now_us());
        if let PaceOutcome::Sleep(duration) = outcome {
            std::thread::sleep(duration);
        }
        outcome
    }
}
