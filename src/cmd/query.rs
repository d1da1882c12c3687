// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `tree` and `resolve` handlers.

use serde_json::json;

use crate::cli::global::GlobalOptions;
use crate::cli::query::{ResolveArgs, TreeArgs};
use crate::cmd::connect;
use crate::config::Config;
use crate::error::Result;
use crate::git::ops::list_tree;
use crate::git::refs::resolve_ref_to_commit;
use crate::git::tree::TreeListing;

/// Run the `tree` command.
///
/// # Errors
///
/// Returns an error if the reference does not resolve or the tree cannot
/// be read.
pub async fn run_tree_command(args: &TreeArgs, config: &Config, global: &GlobalOptions) -> Result<()> {
    let client = connect(config, global.token.as_deref(), &args.repo)?;
    let (commit, mut listing) = list_tree(&client, args.reference.as_deref()).await?;
    if let Some(path) = &args.path {
        listing = listing.under(path);
    }

    if args.json {
        let out = json!({
            "commit": commit,
            "tree": listing.sha,
            "truncated": listing.truncated,
            "entries": listing.entries,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for line in render_listing(&listing) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Run the `resolve` command.
///
/// # Errors
///
/// Returns `NotFound` if `REF` names no branch, tag or commit.
pub async fn run_resolve_command(
    args: &ResolveArgs,
    config: &Config,
    global: &GlobalOptions,
) -> Result<()> {
    let client = connect(config, global.token.as_deref(), &args.repo)?;
    let commit = resolve_ref_to_commit(&client, &args.reference).await?;
    println!("{commit}");
    Ok(())
}

/// `git ls-tree` style lines: `<mode> <type> <sha>\t<path>`.
#[must_use]
pub fn render_listing(listing: &TreeListing) -> Vec<String> {
    let mut lines: Vec<String> = listing
        .entries
        .iter()
        .map(|e| format!("{} {} {}\t{}", e.mode, e.kind, e.sha, e.path))
        .collect();
    if listing.truncated {
        lines.push("warning: listing truncated by the server".to_string());
    }
    lines
}
