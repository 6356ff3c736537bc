// Copyright 2024 Vulcanize Storage Diff Maintainers
// This file is licensed under the Apache-2.0 license.
// see LICENSE for license details.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Layered application configuration: defaults, overridden by an optional
/// TOML file, overridden by `STORAGEDIFF_`-prefixed environment variables
/// (`STORAGEDIFF_DATABASE_URL`, `STORAGEDIFF_VALIDATOR__WINDOW`, and so on,
/// double-underscore separating nested keys, the `config` crate's own
/// convention for env overrides of nested tables).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Postgres connection string.
    pub database_url: String,
    /// WebSocket URL of the execution node's JSON-RPC endpoint.
    pub node_url: String,
    /// Default CSV path for `extract-diffs --source csv` when `--path` is
    /// not given on the command line.
    pub csv_path: Option<PathBuf>,
    #[serde(default)]
    pub validator: ValidatorSettings,
    #[serde(default)]
    pub watcher: WatcherSettings,
    #[serde(default)]
    pub liveness: LivenessSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorSettings {
    pub window: u64,
    #[serde(with = "duration_secs")]
    pub tick_secs: Duration,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        let defaults = diff_pipeline::ValidatorConfig::default();
        Self {
            window: defaults.window,
            tick_secs: defaults.tick,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatcherSettings {
    pub max_consecutive_unexpected_errors: u32,
    #[serde(with = "duration_secs")]
    pub retry_interval_secs: Duration,
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            max_consecutive_unexpected_errors: 5,
            retry_interval_secs: Duration::from_secs(2),
        }
    }
}

/// Where each long-running subsystem writes its one-time liveness marker.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LivenessSettings {
    pub fetcher_path: Option<PathBuf>,
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Config {
    /// Load configuration from (in increasing precedence) built-in
    /// defaults, `path` if it exists, and `STORAGEDIFF_`-prefixed
    /// environment variables.
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("validator.window", diff_pipeline::ValidatorConfig::default().window as i64)?
            .set_default(
                "validator.tick_secs",
                diff_pipeline::ValidatorConfig::default().tick.as_secs() as i64,
            )?
            .set_default("watcher.max_consecutive_unexpected_errors", 5)?
            .set_default("watcher.retry_interval_secs", 2)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("STORAGEDIFF")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
