use std::env;
use std::path::PathBuf;

use config::{ConfigError, Environment, File};

use super::models::Config;

const CONFIG_ENV_VAR: &str = "AID_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/aid.toml";
const ENV_PREFIX: &str = "AID";
const ENV_SEPARATOR: &str = "__";

/// Load configuration with priority (lowest to highest):
/// 1. Defaults (struct `Default` impls)
/// 2. TOML file
/// 3. `AID__<SECTION>__<KEY>` environment variables
pub fn load() -> Result<Config, ConfigError> {
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    load_from_sources(config_path)
}

pub fn load_from_sources(config_path: PathBuf) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!(path = %config_path.display(), "loading configuration file");
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(path = %config_path.display(), "no configuration file found, using defaults");
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn load_defaults_only() {
        let dir = TempDir::new().unwrap();
        let config = load_from_sources(dir.path().join("nonexistent.toml")).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn load_overrides_from_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aid.toml");
        fs::write(
            &path,
            r#"
[server]
bind_addr = "127.0.0.1:9000"

[timeout_monitor]
ttl_secs = 120
            "#,
        )
        .unwrap();

        let config = load_from_sources(path).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.timeout_monitor.ttl_secs, 120);
    }
}
