use std::path::Path;

use config::Config;
use config::ConfigError;
use config::File;
use gm_pacer::PacerConfig;
use gm_transport::SimConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct PublisherConfigFile {
    pub pacer: PacerConfig,
    pub sim: SimConfig,
}

pub fn load_publisher_config<P: AsRef<Path>>(path: P) -> Result<PublisherConfigFile, ConfigError> {
    let config = Config::builder().add_source(File::from(path.as_ref())).build()?;

    config.try_deserialize()
}

/// Load publisher config with fallback to default
pub fn load_publisher_config_or_default(path: &str) -> PublisherConfigFile {
    match load_publisher_config(path) {
        Ok(config) => {
            tracing::info!("Loaded publisher config from {path}");
            config
        }
        Err(err) => {
            tracing::warn!("Failed to load publisher config from {}: {}. Using defaults.", path, err);
            PublisherConfigFile { pacer: PacerConfig::default(), sim: SimConfig::default() }
        }
    }
}
