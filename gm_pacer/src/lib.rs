pub mod clock;
pub mod config;
pub mod publisher;

pub use clock::PaceOutcome;
pub use clock::PacingClock;
pub use config::PacerConfig;
pub use publisher::PacedPublisher;
pub use publisher::PublishStats;
