// Copyright (C) 2024, 2025 Roundkeeper Developers (see AUTHORS)
//
// This file is part of Roundkeeper
//
// Roundkeeper is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Roundkeeper is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// Roundkeeper. If not, see <https://www.gnu.org/licenses/>.

use roundkeeper_accounting::RoundAccounting;
use roundkeeper_accounting::rounds::DEFAULT_MAX_SUBMISSION_GAP_MS;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct PoolConfig {
    /// Prefix of every key written for the pool
    pub identifier: String,
    /// Account shares on the merge mined auxiliary chain too
    #[serde(default)]
    pub auxiliary_enabled: bool,
    /// Longest idle time between two shares that is still credited as mining time
    #[serde(default = "default_max_submission_gap_secs")]
    pub max_submission_gap_secs: u64,
}

fn default_max_submission_gap_secs() -> u64 {
    DEFAULT_MAX_SUBMISSION_GAP_MS / 1000
}

impl PoolConfig {
    /// Accounting rules for this pool.
    pub fn accounting(&self) -> RoundAccounting {
        RoundAccounting::new(self.identifier.clone(), self.auxiliary_enabled)
            .with_max_submission_gap(Duration::from_secs(self.max_submission_gap_secs))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LoggingConfig {
    /// Log to file if specified
    pub file: Option<String>,
    /// Log level (defaults to "info")
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log to console, enabled unless set to false
    pub console: Option<bool>,
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub pool: PoolConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load from a TOML file, with `ROUNDKEEPER_<SECTION>__<FIELD>` environment
    /// variables taking precedence.
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("ROUNDKEEPER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn with_pool_identifier(mut self, identifier: String) -> Self {
        self.pool.identifier = identifier;
        self
    }

    pub fn with_auxiliary_enabled(mut self, auxiliary_enabled: bool) -> Self {
        self.pool.auxiliary_enabled = auxiliary_enabled;
        self
    }

    pub fn with_max_submission_gap_secs(mut self, max_submission_gap_secs: u64) -> Self {
        self.pool.max_submission_gap_secs = max_submission_gap_secs;
        self
    }

    pub fn with_store_path(mut self, store_path: String) -> Self {
        self.store.path = store_path;
        self
    }

    pub fn with_log_level(mut self, level: String) -> Self {
        self.logging.level = level;
        self
    }

    pub fn with_log_file(mut self, file: Option<String>) -> Self {
        self.logging.file = file;
        self
    }
}
