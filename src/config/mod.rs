// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for forge-tree.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. forge-tree.toml (cwd, optional)
//! 3. --config FILE (repeatable)
//! 4. FORGE_TREE_* env vars
//! 5. --set section.key=value
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! FORGE_TREE_API__BASE_URL=https://ghe/api/v3 → api.base_url
//! FORGE_TREE_RETRY__MAX_ATTEMPTS=5            → retry.max_attempts = 5
//! FORGE_TREE_LOG__OUTPUT_LOG_LEVEL=4          → log.output_log_level = 4
//! ```
//!
//! The API token is deliberately absent: it is read once from
//! `--token`/`GITHUB_TOKEN` and never from files.

pub mod loader;
pub mod types;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

use types::{ApiConfig, LogSettings, RetryConfig};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Remote API endpoint.
    pub api: ApiConfig,
    /// Request retry policy.
    pub retry: RetryConfig,
    /// Logging.
    pub log: LogSettings,
}

impl Config {
    /// Validate cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if the retry policy is unusable.
    pub fn validate(&self) -> Result<()> {
        self.retry.validate()?;
        Ok(())
    }

    /// Format configuration options for display.
    ///
    /// Output is deterministically ordered using `BTreeMap`.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();

        options.insert("api.base_url".to_string(), self.api.base_url.clone());
        options.insert("api.version".to_string(), self.api.version.clone());
        options.insert("api.user_agent".to_string(), self.api.user_agent.clone());
        options.insert(
            "api.timeout_secs".to_string(),
            self.api.timeout_secs.to_string(),
        );

        options.insert(
            "retry.max_attempts".to_string(),
            self.retry.max_attempts.to_string(),
        );
        options.insert(
            "retry.max_delay_secs".to_string(),
            self.retry.max_delay_secs.to_string(),
        );
        options.insert(
            "retry.rate_limit_backoff_secs".to_string(),
            self.retry.rate_limit_backoff_secs.to_string(),
        );
        options.insert(
            "retry.rate_limit_jitter_secs".to_string(),
            self.retry.rate_limit_jitter_secs.to_string(),
        );
        options.insert(
            "retry.server_error_backoff_secs".to_string(),
            self.retry.server_error_backoff_secs.to_string(),
        );
        options.insert(
            "retry.server_error_jitter_secs".to_string(),
            self.retry.server_error_jitter_secs.to_string(),
        );

        options.insert(
            "log.output_log_level".to_string(),
            self.log.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "log.file_log_level".to_string(),
            self.log.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "log.log_file".to_string(),
            self.log
                .log_file
                .as_ref()
                .map_or_else(String::new, |p| p.display().to_string()),
        );
        options.insert("log.json".to_string(), self.log.json.to_string());

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }
}
