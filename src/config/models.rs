use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the Aid fallback dispatch service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub healer: HealerConfig,
    #[serde(default)]
    pub timeout_monitor: TimeoutMonitorConfig,
    #[serde(default)]
    pub alerting: AlertingConfig,
    #[serde(default)]
    pub video_client: VideoClientConfig,
    #[serde(default)]
    pub encoder_cache: EncoderCacheConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_list_jobs_cap")]
    pub list_jobs_cap: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            request_timeout_secs: default_request_timeout_secs(),
            list_jobs_cap: default_list_jobs_cap(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_list_jobs_cap() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_store_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            connect_timeout_secs: default_store_connect_timeout_secs(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/aid-jobs")
}

fn default_store_connect_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { path: default_registry_path() }
    }
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("data/aid-encoders")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealerConfig {
    #[serde(default = "default_healer_tick_secs")]
    pub tick_interval_secs: u64,
    #[serde(default = "default_healer_job_window_secs")]
    pub job_window_secs: i64,
    #[serde(default = "default_healer_record_window_secs")]
    pub record_window_secs: i64,
}

impl Default for HealerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_healer_tick_secs(),
            job_window_secs: default_healer_job_window_secs(),
            record_window_secs: default_healer_record_window_secs(),
        }
    }
}

fn default_healer_tick_secs() -> u64 {
    60 * 60
}

fn default_healer_job_window_secs() -> i64 {
    60 * 60
}

fn default_healer_record_window_secs() -> i64 {
    24 * 60 * 60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutMonitorConfig {
    #[serde(default = "default_timeout_ttl_secs")]
    pub ttl_secs: i64,
    #[serde(default = "default_timeout_tick_secs")]
    pub tick_interval_secs: u64,
}

impl Default for TimeoutMonitorConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_timeout_ttl_secs(),
            tick_interval_secs: default_timeout_tick_secs(),
        }
    }
}

fn default_timeout_ttl_secs() -> i64 {
    60 * 60
}

fn default_timeout_tick_secs() -> u64 {
    5 * 60
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AlertingConfig {
    /// Absence disables all notifications silently.
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoClientConfig {
    pub base_url: Option<String>,
    #[serde(default = "default_video_client_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for VideoClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            request_timeout_secs: default_video_client_timeout_secs(),
        }
    }
}

fn default_video_client_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncoderCacheConfig {
    pub directory_base_url: Option<String>,
    #[serde(default = "default_directory_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for EncoderCacheConfig {
    fn default() -> Self {
        Self {
            directory_base_url: None,
            request_timeout_secs: default_directory_timeout_secs(),
        }
    }
}

fn default_directory_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_expected_values() {
        let config = Config {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            registry: RegistryConfig::default(),
            healer: HealerConfig::default(),
            timeout_monitor: TimeoutMonitorConfig::default(),
            alerting: AlertingConfig::default(),
            video_client: VideoClientConfig::default(),
            encoder_cache: EncoderCacheConfig::default(),
        };

        assert_eq!(config.timeout_monitor.ttl_secs, 3600);
        assert_eq!(config.timeout_monitor.tick_interval_secs, 300);
        assert_eq!(config.healer.tick_interval_secs, 3600);
        assert!(config.alerting.webhook_url.is_none());
    }
}
