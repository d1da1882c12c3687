// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration types for forge-tree.
//!
//! ```text
//! Config: ApiConfig, RetryConfig, LogSettings
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::logging::LogLevel;

/// Default GitHub REST endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Pinned REST API version sent as `X-GitHub-Api-Version`.
pub const DEFAULT_API_VERSION: &str = "2022-11-28";

/// Remote API endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://ghe.example.com/api/v3` for Enterprise.
    pub base_url: String,
    /// Value of the `X-GitHub-Api-Version` header.
    pub version: String,
    /// Client identifier sent as `User-Agent`.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            version: DEFAULT_API_VERSION.to_string(),
            user_agent: format!("forge-tree/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 60,
        }
    }
}

impl ApiConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry and backoff settings for the request layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
    /// Ceiling for any single backoff sleep.
    pub max_delay_secs: u64,
    /// Base unit for rate-limit backoff when no header says how long to wait.
    pub rate_limit_backoff_secs: u64,
    /// Upper bound of the random jitter added to rate-limit delays.
    pub rate_limit_jitter_secs: f64,
    /// Base unit for 5xx backoff.
    pub server_error_backoff_secs: u64,
    /// Upper bound of the random jitter added to 5xx delays.
    pub server_error_jitter_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_delay_secs: 300,
            rate_limit_backoff_secs: 60,
            rate_limit_jitter_secs: 5.0,
            server_error_backoff_secs: 1,
            server_error_jitter_secs: 1.0,
        }
    }
}

impl RetryConfig {
    /// Reject values the request layer cannot honor.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for zero attempts, or jitter that
    /// is negative, NaN or above `max_delay_secs`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts", "must be at least 1"));
        }
        #[allow(clippy::cast_precision_loss)]
        let ceiling = self.max_delay_secs as f64;
        for (key, value) in [
            ("rate_limit_jitter_secs", self.rate_limit_jitter_secs),
            ("server_error_jitter_secs", self.server_error_jitter_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(key, "must be a non-negative number"));
            }
            if value > ceiling {
                return Err(invalid(key, "must not exceed max_delay_secs"));
            }
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: "retry".to_string(),
        key: key.to_string(),
        message: message.to_string(),
    }
}

/// Logging settings; CLI flags take precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    /// Log level for console output (0-6).
    pub output_log_level: LogLevel,
    /// Log level for file output (0-6).
    pub file_log_level: LogLevel,
    /// Path to log file; no file logging when unset.
    pub log_file: Option<PathBuf>,
    /// Write the log file as JSON lines.
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            output_log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: None,
            json: false,
        }
    }
}
