// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> cmd::run_* handlers --> git::ops over api::ApiClient
//!   change (chmod, write, rm), query (tree, resolve), config (options)
//! ```

pub mod change;
pub mod config;
pub mod query;


use tracing::debug;

use crate::api::{ApiClient, RepoSlug};
use crate::config::Config;
use crate::error::{Result, bail_out};

/// Build an authenticated client for `repo`.
///
/// # Errors
///
/// Returns an error if no token was given or the client cannot be built.
pub fn connect(config: &Config, token: Option<&str>, repo: &RepoSlug) -> Result<ApiClient> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| bail_out("no API token; pass --token or set GITHUB_TOKEN"))?;
    debug!(repo = %repo, base_url = config.api.base_url, "connecting");
    Ok(ApiClient::new(&config.api, &config.retry, token, repo.clone())?)
}
