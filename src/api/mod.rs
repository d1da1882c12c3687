// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! HTTP client for the GitHub Git Data API.
//!
//! ```text
//! ApiClient::new(ApiConfig, RetryConfig, token, owner/repo)
//!   default headers: Authorization, Accept, X-GitHub-Api-Version
//!        |
//!        v
//!   endpoint("git/ref/heads/feature/x")
//!     {base_url}/repos/{owner}/{repo}/git/ref/heads/feature/x
//!        |
//!        v
//!   retry::send_with_retry --> response::ApiResponse
//!        |
//!        +-- lookup: 2xx -> Some(T), 404/422 -> None, else ApiError
//!        +-- write:  2xx -> T, else ApiError
//!
//! impl GitStore for ApiClient   (store.rs)
//! ```

pub mod response;
pub mod retry;
mod store;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::config::types::{ApiConfig, RetryConfig};
use crate::error::{ApiError, ForgeResult, NetworkError, bail_out};
use response::ApiResponse;
use retry::{RetryPolicy, send_with_retry};

/// Media type requested on every call.
pub const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// `owner/repo` pair naming a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoSlug {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ApiError::Validation {
            message: format!("invalid repository '{s}'"),
            details: vec!["expected the form owner/repo".to_string()],
        };
        let (owner, name) = s.trim().split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Authenticated client bound to one repository.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
    repo: RepoSlug,
    policy: RetryPolicy,
}

impl ApiClient {
    /// Build a client for `repo`.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::InvalidUrl` for a malformed `base_url`, and a
    /// fatal error if the token cannot be sent as a header or the HTTP
    /// client cannot be constructed.
    pub fn new(
        api: &ApiConfig,
        retry: &RetryConfig,
        token: &str,
        repo: RepoSlug,
    ) -> ForgeResult<Self> {
        let base = Url::parse(&api.base_url)
            .map_err(|e| NetworkError::InvalidUrl(format!("{}: {e}", api.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(NetworkError::InvalidUrl(api.base_url.clone()).into());
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|_| bail_out("token contains characters not allowed in a header"))?;
        auth.set_sensitive(true);
        let version = HeaderValue::from_str(&api.version)
            .map_err(|_| bail_out(format!("invalid api.version '{}'", api.version)))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert("x-github-api-version", version);

        let client = Client::builder()
            .user_agent(api.user_agent.as_str())
            .default_headers(headers)
            .timeout(api.timeout())
            .build()
            .map_err(NetworkError::Reqwest)?;

        Ok(Self {
            client,
            base,
            repo,
            policy: RetryPolicy::from(retry),
        })
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn repo(&self) -> &RepoSlug {
        &self.repo
    }

    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// URL of `path` below `repos/{owner}/{repo}`.
    ///
    /// Slashes in `path` separate segments, so branch names like
    /// `feature/x` keep their slash; every other reserved character is
    /// percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::InvalidUrl` if the base URL cannot take a path.
    pub fn endpoint(&self, path: &str) -> ForgeResult<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| NetworkError::InvalidUrl(self.base.to_string()))?;
            segments
                .pop_if_empty()
                .push("repos")
                .push(&self.repo.owner)
                .push(&self.repo.name);
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> ForgeResult<ApiResponse> {
        let request = request.build().map_err(NetworkError::Reqwest)?;
        send_with_retry(&self.client, request, &self.policy).await
    }

    async fn get(&self, url: Url) -> ForgeResult<ApiResponse> {
        self.send(self.client.get(url)).await
    }

    /// GET `url`; absent objects (404, or 422 for unknown commit-ish) are `None`.
    async fn lookup<T: DeserializeOwned>(&self, url: Url, what: &str) -> ForgeResult<Option<T>> {
        let response = self.get(url).await?;
        match response.status {
            StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
                debug!(what, status = response.status.as_u16(), "lookup found nothing");
                Ok(None)
            }
            _ if response.is_success() => response.json().map(Some),
            _ => Err(response.error(what).into()),
        }
    }

    async fn write<B, T>(&self, method: Method, url: Url, body: &B, what: &str) -> ForgeResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send_json(method, url, body).await?;
        if response.is_success() {
            response.json()
        } else {
            Err(response.error(what).into())
        }
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> ForgeResult<ApiResponse> {
        self.send(self.client.request(method, url).json(body)).await
    }
}
