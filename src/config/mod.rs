//! Application configuration.
//!
//! Aggregates configuration into a single Config struct that can be loaded
//! from YAML files or environment variables.

mod index;

pub use index::{
    IndexNemesisConfig, NodetoolConfig, SuppressionPatterns, BUILD_WAIT_PATTERN,
    DROP_INDEX_PATTERN, DROP_VIEW_PATTERN,
};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "nemesis.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "NEMESIS_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "NEMESIS";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "NEMESIS_LOG";

use serde::Deserialize;

/// Main configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Index/view lifecycle settings.
    pub index: IndexNemesisConfig,
    /// Admin command settings for the process-backed node.
    pub nodetool: NodetoolConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `nemesis.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ::config::ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.index.build_timeout_secs, 300);
        assert_eq!(config.nodetool.command, vec!["nodetool"]);
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "index:\n  build_timeout_secs: 42\n  filter_grace_secs: 5\nnodetool:\n  command: [ssh, node1, nodetool]"
        )
        .unwrap();

        let config = Config::load(Some(file.path().to_str().unwrap())).unwrap();

        assert_eq!(config.index.build_timeout_secs, 42);
        assert_eq!(config.index.filter_grace_secs, 5);
        assert_eq!(config.index.poll_interval_secs, 30);
        assert_eq!(config.nodetool.command, vec!["ssh", "node1", "nodetool"]);
    }

    #[test]
    #[serial]
    fn test_env_overrides_defaults() {
        std::env::set_var("NEMESIS__INDEX__POLL_INTERVAL_SECS", "7");
        let config = Config::load(None);
        std::env::remove_var("NEMESIS__INDEX__POLL_INTERVAL_SECS");

        assert_eq!(config.unwrap().index.poll_interval_secs, 7);
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_error() {
        assert!(Config::load(Some("/nonexistent/nemesis-config.yaml")).is_err());
    }
}
