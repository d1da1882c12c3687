// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Commit creation and branch advance.

use tracing::{info, warn};

use crate::error::ForgeResult;
use crate::git::store::GitStore;

/// Create a single-parent commit. No reference moves.
///
/// # Errors
///
/// Returns the store's error if it rejects the commit.
pub async fn create_commit<S: GitStore>(
    store: &S,
    tree: &str,
    parent: &str,
    message: &str,
) -> ForgeResult<String> {
    let commit = store.create_commit(message, tree, &[parent]).await?;
    info!(commit, tree, parent, "created commit");
    Ok(commit)
}

/// Point `branch` at `commit`.
///
/// Without `force`, a branch that moved since it was read is left alone and
/// the call fails with `ApiError::NonFastForward`.
///
/// # Errors
///
/// Returns `ApiError::NonFastForward` as above, or any store failure.
pub async fn advance_branch<S: GitStore>(
    store: &S,
    branch: &str,
    commit: &str,
    force: bool,
) -> ForgeResult<()> {
    if force {
        warn!(branch, commit, "force-updating branch; intervening commits will be dropped");
    }
    store.update_branch(branch, commit, force).await?;
    info!(branch, commit, "advanced branch");
    Ok(())
}
