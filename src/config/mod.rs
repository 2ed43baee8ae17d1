//! Layered configuration: embedded defaults, an optional TOML file, then
//! `AID__<SECTION>__<KEY>` environment variables take highest priority.
//!
//! ```no_run
//! use aid_dispatch::config::Config;
//!
//! let config = Config::load().expect("failed to load configuration");
//! println!("binding to {}", config.server.bind_addr);
//! ```

mod models;
mod sources;
mod validation;

pub use models::{
    AlertingConfig, Config, EncoderCacheConfig, HealerConfig, RegistryConfig, ServerConfig,
    StoreConfig, TimeoutMonitorConfig, VideoClientConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("configuration validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn load_from_path_validates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aid.toml");
        fs::write(
            &path,
            r#"
[timeout_monitor]
ttl_secs = 10
tick_interval_secs = 300
            "#,
        )
        .unwrap();

        let result = Config::load_from_path(path);
        assert!(matches!(
            result,
            Err(ConfigError::Validation(ValidationError::TtlShorterThanTick { .. }))
        ));
    }
}
