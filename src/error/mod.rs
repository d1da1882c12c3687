// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!           ForgeError (~24 bytes)
//!                  |
//!   +------+-------+-------+------+------+
//!   |      |       |       |      |      |
//!   v      v       v       v      v      v
//! Bail    Api   Network  Config   Io   Other
//!         Box     Box     Box     Box  Box<str>
//!
//! Sub-errors (unboxed internally):
//!   Api     NotFound, MissingPaths, Validation, NonFastForward,
//!           StaleContent, Conflict, RateLimited, ServerError,
//!           AuthFailure, Unexpected
//!   Network Reqwest, Timeout, InvalidUrl, Decode
//!   Config  ParseError, InvalidValue
//! ```
//!
//! `RateLimited` and `ServerError` only escape the request layer once its
//! retries are exhausted.

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`ForgeError`].
pub type ForgeResult<T> = std::result::Result<T, ForgeError>;

/// Top-level application error type.
///
/// All sub-errors are boxed to keep this enum at ~24 bytes on the stack.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Fatal error that should terminate the application.
    #[error("fatal error: {0}")]
    Bailed(Box<str>),

    /// The remote API rejected or failed a request.
    #[error("api error: {0}")]
    Api(#[from] Box<ApiError>),

    /// Network operation failed.
    #[error("network error: {0}")]
    Network(#[from] Box<NetworkError>),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),

    /// Generic error with message.
    #[error("{0}")]
    Other(Box<str>),
}

/// Create a fatal [`ForgeError::Bailed`] that terminates the application.
pub fn bail_out(message: impl Into<String>) -> ForgeError {
    ForgeError::Bailed(message.into().into_boxed_str())
}

impl ForgeError {
    /// The API error, if this is one.
    #[must_use]
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Coarse classification of the failure.
    #[must_use]
    pub fn kind(&self) -> Option<ErrorKind> {
        self.api().map(ApiError::kind)
    }

    /// Remediation hint shown to the operator after the error message.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Api(err) => err.hint(),
            Self::Network(err) if matches!(**err, NetworkError::Timeout { .. }) => {
                Some("raise api.timeout_secs for very large trees")
            }
            _ => None,
        }
    }
}

// --- From implementations for boxing ---

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for ForgeError {
                fn from(err: $error) -> Self {
                    ForgeError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    ApiError => Api,
    NetworkError => Network,
    ConfigError => Config,
    std::io::Error => Io,
}

// --- API Errors ---

/// The failure classes a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    RateLimited,
    ServerError,
    AuthFailure,
    Unexpected,
}

/// Errors reported by the remote store, or detected before calling it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Branch, tag, commit, tree or repository is absent.
    #[error("{what} not found")]
    NotFound { what: String },

    /// Requested paths are absent from the tree.
    #[error("paths not found in tree: {}", .paths.join(", "))]
    MissingPaths { paths: Vec<String> },

    /// Malformed mode, malformed patch, or a change the store refused.
    #[error("validation failed: {message}{}", format_details(.details))]
    Validation {
        message: String,
        details: Vec<String>,
    },

    /// The branch moved since it was read.
    #[error("branch '{branch}' was not updated: {message}")]
    NonFastForward { branch: String, message: String },

    /// The file being overwritten changed since its blob id was read.
    #[error("'{path}' has blob {actual}, expected {expected}")]
    StaleContent {
        path: String,
        expected: String,
        actual: String,
    },

    /// Generic conflict reported by the store.
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// Quota exhausted and retries did not help.
    #[error("rate limit exceeded{}", format_reset(.reset_at))]
    RateLimited { reset_at: Option<u64> },

    /// 5xx that persisted through every retry.
    #[error("server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Bad, expired, or under-scoped token.
    #[error("authentication failed ({status}): {message}")]
    AuthFailure { status: u16, message: String },

    /// Any other status the caller did not expect.
    #[error("unexpected status {status}: {message}")]
    Unexpected { status: u16, message: String },
}

fn format_details(details: &[String]) -> String {
    if details.is_empty() {
        String::new()
    } else {
        format!(" ({})", details.join("; "))
    }
}

fn format_reset(reset_at: &Option<u64>) -> String {
    reset_at.map_or_else(String::new, |ts| format!(", resets at unix time {ts}"))
}

impl ApiError {
    /// Build a [`ApiError::Validation`] without details.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: Vec::new(),
        }
    }

    /// Build a [`ApiError::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::MissingPaths { .. } => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NonFastForward { .. } | Self::StaleContent { .. } | Self::Conflict { .. } => {
                ErrorKind::Conflict
            }
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::ServerError { .. } => ErrorKind::ServerError,
            Self::AuthFailure { .. } => ErrorKind::AuthFailure,
            Self::Unexpected { .. } => ErrorKind::Unexpected,
        }
    }

    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => Some(
                "check that the repository, branch, or path exists and the token has access",
            ),
            Self::MissingPaths { .. } => Some("list the tree with `forge-tree tree` to check paths"),
            Self::NonFastForward { .. } => Some(
                "the branch moved since it was read; re-run, or pass --force to overwrite the intervening history",
            ),
            Self::StaleContent { .. } => Some("get the current content identifier and retry"),
            Self::Conflict { .. } => Some("the resource was modified concurrently; re-run"),
            Self::RateLimited { .. } => Some("wait for the rate-limit window to reset"),
            Self::AuthFailure { status: 401, .. } => {
                Some("check that the token is valid and not expired")
            }
            Self::AuthFailure { .. } => Some("the token may lack the required scopes"),
            Self::Validation { .. } | Self::ServerError { .. } | Self::Unexpected { .. } => None,
        }
    }
}

// --- Network Errors ---

/// Network operation errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Error from reqwest library.
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// Request exceeded the configured timeout.
    #[error("request timed out: {url}")]
    Timeout { url: String },

    /// Invalid URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Response body did not match the expected shape.
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration.
    #[error("failed to parse config '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}
