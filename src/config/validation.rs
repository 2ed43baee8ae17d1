use thiserror::Error;

use super::models::Config;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} must be positive, got {value}")]
    NonPositiveInterval { field: &'static str, value: i64 },

    #[error(
        "timeout_monitor.ttl_secs ({ttl}) must exceed timeout_monitor.tick_interval_secs ({tick}), \
         otherwise a claim can be released before a second tick even observes it"
    )]
    TtlShorterThanTick { ttl: i64, tick: i64 },
}

pub fn validate(config: &Config) -> Result<(), ValidationError> {
    check_positive("server.request_timeout_secs", config.server.request_timeout_secs as i64)?;
    check_positive("store.connect_timeout_secs", config.store.connect_timeout_secs as i64)?;
    check_positive("healer.tick_interval_secs", config.healer.tick_interval_secs as i64)?;
    check_positive("healer.job_window_secs", config.healer.job_window_secs)?;
    check_positive("healer.record_window_secs", config.healer.record_window_secs)?;
    check_positive("timeout_monitor.ttl_secs", config.timeout_monitor.ttl_secs)?;
    check_positive(
        "timeout_monitor.tick_interval_secs",
        config.timeout_monitor.tick_interval_secs as i64,
    )?;

    let ttl = config.timeout_monitor.ttl_secs;
    let tick = config.timeout_monitor.tick_interval_secs as i64;
    if ttl <= tick {
        return Err(ValidationError::TtlShorterThanTick { ttl, tick });
    }

    Ok(())
}

fn check_positive(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::NonPositiveInterval { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::{
        AlertingConfig, EncoderCacheConfig, HealerConfig, RegistryConfig, ServerConfig,
        StoreConfig, TimeoutMonitorConfig, VideoClientConfig,
    };

    fn base_config() -> Config {
        Config {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            registry: RegistryConfig::default(),
            healer: HealerConfig::default(),
            timeout_monitor: TimeoutMonitorConfig::default(),
            alerting: AlertingConfig::default(),
            video_client: VideoClientConfig::default(),
            encoder_cache: EncoderCacheConfig::default(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn rejects_ttl_not_exceeding_tick() {
        let mut config = base_config();
        config.timeout_monitor.ttl_secs = 60;
        config.timeout_monitor.tick_interval_secs = 300;

        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ValidationError::TtlShorterThanTick { .. }));
    }

    #[test]
    fn rejects_zero_tick_interval() {
        let mut config = base_config();
        config.healer.tick_interval_secs = 0;

        let err = validate(&config).unwrap_err();
        assert!(matches!(err, ValidationError::NonPositiveInterval { .. }));
    }
}
