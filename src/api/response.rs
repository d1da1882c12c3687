// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Buffered responses and status classification.
//!
//! | Status                  | Error          |
//! |-------------------------|----------------|
//! | 401                     | `AuthFailure`  |
//! | 403 rate limited, 429   | `RateLimited`  |
//! | 403 otherwise           | `AuthFailure`  |
//! | 404                     | `NotFound`     |
//! | 409                     | `Conflict`     |
//! | 422                     | `Validation`   |
//! | 5xx                     | `ServerError`  |
//! | anything else non-2xx   | `Unexpected`   |

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::retry::{header_u64, is_rate_limited};
use crate::error::{ApiError, ForgeResult, NetworkError};

/// A fully read HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
    pub url: String,
}

impl ApiResponse {
    /// Read the whole body of `response`.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the body cannot be read.
    pub async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().to_string();
        let body = response.text().await?;
        Ok(Self {
            status,
            headers,
            body,
            url,
        })
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        is_rate_limited(self.status, &self.headers, &self.body)
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::Decode` if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> ForgeResult<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            NetworkError::Decode {
                url: self.url.clone(),
                message: e.to_string(),
            }
            .into()
        })
    }

    fn body_json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// The `message` field of an error body, else the raw body.
    #[must_use]
    pub fn message(&self) -> String {
        if let Some(message) = self
            .body_json()
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
        {
            return message.to_string();
        }
        let body = self.body.trim();
        if body.is_empty() {
            self.status
                .canonical_reason()
                .unwrap_or("no message")
                .to_string()
        } else {
            body.to_string()
        }
    }

    /// Entries of the `errors` array of a 422 body.
    #[must_use]
    pub fn details(&self) -> Vec<String> {
        let errors = match self.body_json() {
            Some(Value::Object(mut body)) => body.remove("errors"),
            _ => None,
        };
        let Some(Value::Array(errors)) = errors else {
            return Vec::new();
        };
        errors
            .iter()
            .map(|err| match err {
                Value::String(text) => text.clone(),
                Value::Object(fields) => {
                    if let Some(message) = fields.get("message").and_then(Value::as_str) {
                        return message.to_string();
                    }
                    let field = fields.get("field").and_then(Value::as_str).unwrap_or("unknown");
                    let code = fields.get("code").and_then(Value::as_str).unwrap_or("unknown");
                    format!("field '{field}': {code}")
                }
                other => other.to_string(),
            })
            .collect()
    }

    /// Classify a non-2xx response. `what` names the resource for 404s.
    #[must_use]
    pub fn error(&self, what: &str) -> ApiError {
        let status = self.status.as_u16();
        match status {
            401 => ApiError::AuthFailure {
                status,
                message: self.message(),
            },
            403 | 429 if self.is_rate_limited() => ApiError::RateLimited {
                reset_at: header_u64(&self.headers, "x-ratelimit-reset"),
            },
            403 => ApiError::AuthFailure {
                status,
                message: self.message(),
            },
            404 => ApiError::not_found(what),
            409 => ApiError::Conflict {
                message: self.message(),
            },
            422 => ApiError::Validation {
                message: self.message(),
                details: self.details(),
            },
            500..=599 => ApiError::ServerError {
                status,
                message: self.message(),
            },
            _ => ApiError::Unexpected {
                status,
                message: self.message(),
            },
        }
    }
}
