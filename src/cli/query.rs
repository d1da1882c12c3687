// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments of the read-only commands.

use clap::Args;

use crate::api::RepoSlug;

/// Arguments for the `tree` command.
#[derive(Debug, Clone, Args)]
pub struct TreeArgs {
    /// Repository as owner/repo.
    #[arg(value_name = "OWNER/REPO")]
    pub repo: RepoSlug,

    /// Branch, tag or commit to list (defaults to the default branch).
    #[arg(short = 'r', long = "ref", value_name = "REF")]
    pub reference: Option<String>,

    /// Lists only this path and what is below it.
    #[arg(short = 'p', long = "path", value_name = "PATH")]
    pub path: Option<String>,

    /// Prints the listing as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `resolve` command.
#[derive(Debug, Clone, Args)]
pub struct ResolveArgs {
    /// Repository as owner/repo.
    #[arg(value_name = "OWNER/REPO")]
    pub repo: RepoSlug,

    /// Branch, tag or commit id.
    #[arg(value_name = "REF")]
    pub reference: String,
}
