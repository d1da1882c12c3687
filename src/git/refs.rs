// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Reference resolution.
//!
//! ```text
//! "v1.2" --> Branch("v1.2")  miss
//!        --> Tag("v1.2")     hit: tag object --> tag object --> commit
//!        --> Commit("v1.2")  (not tried)
//! ```

use std::fmt;
use tracing::debug;

use crate::error::{ApiError, ForgeResult};
use crate::git::store::{GitObject, GitStore, ObjectKind};

/// Longest chain of annotated tags followed before giving up.
const MAX_TAG_DEPTH: usize = 8;

/// One interpretation of a user-supplied reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefSpec {
    Branch(String),
    Tag(String),
    Commit(String),
}

impl RefSpec {
    /// Interpretations of `reference` in the order they are tried.
    #[must_use]
    pub fn candidates(reference: &str) -> [Self; 3] {
        [
            Self::Branch(reference.to_string()),
            Self::Tag(reference.to_string()),
            Self::Commit(reference.to_string()),
        ]
    }

    /// Resolve this interpretation to a commit id, if it names one.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` for a tag that does not lead to a
    /// commit, or any store failure.
    pub async fn resolve<S: GitStore>(&self, store: &S) -> ForgeResult<Option<String>> {
        match self {
            Self::Branch(name) => match store.get_branch(name).await? {
                Some(object) => peel_to_commit(store, object, name).await.map(Some),
                None => Ok(None),
            },
            Self::Tag(name) => match store.get_tag_ref(name).await? {
                Some(object) => peel_to_commit(store, object, name).await.map(Some),
                None => Ok(None),
            },
            Self::Commit(reference) => store.find_commit(reference).await,
        }
    }
}

impl fmt::Display for RefSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch(name) => write!(f, "branch '{name}'"),
            Self::Tag(name) => write!(f, "tag '{name}'"),
            Self::Commit(reference) => write!(f, "commit '{reference}'"),
        }
    }
}

async fn peel_to_commit<S: GitStore>(
    store: &S,
    mut object: GitObject,
    name: &str,
) -> ForgeResult<String> {
    for _ in 0..=MAX_TAG_DEPTH {
        match object.kind {
            ObjectKind::Commit => return Ok(object.sha),
            ObjectKind::Tag => {
                let tag = store
                    .get_tag(&object.sha)
                    .await?
                    .ok_or_else(|| ApiError::not_found(format!("tag object {}", object.sha)))?;
                debug!(name, tag = %tag.tag, target = %tag.object.sha, "dereferenced tag");
                object = tag.object;
            }
            ObjectKind::Tree | ObjectKind::Blob => {
                return Err(ApiError::validation(format!(
                    "'{name}' points at a {} object, not a commit",
                    object.kind
                ))
                .into());
            }
        }
    }
    Err(ApiError::validation(format!(
        "'{name}' is nested more than {MAX_TAG_DEPTH} tags deep"
    ))
    .into())
}

/// Current commit at the head of `branch`.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the branch does not exist.
pub async fn resolve_branch_head<S: GitStore>(store: &S, branch: &str) -> ForgeResult<String> {
    let spec = RefSpec::Branch(branch.to_string());
    let commit = spec
        .resolve(store)
        .await?
        .ok_or_else(|| ApiError::not_found(spec.to_string()))?;
    debug!(branch, commit, "resolved branch head");
    Ok(commit)
}

/// Resolve a branch, tag, or commit-ish to a commit id, trying each in
/// turn.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if no interpretation matches.
pub async fn resolve_ref_to_commit<S: GitStore>(store: &S, reference: &str) -> ForgeResult<String> {
    for spec in RefSpec::candidates(reference) {
        if let Some(commit) = spec.resolve(store).await? {
            debug!(reference, %spec, commit, "resolved reference");
            return Ok(commit);
        }
    }
    Err(ApiError::not_found(format!("reference '{reference}'")).into())
}

/// Root tree of `commit`.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the commit does not exist.
pub async fn commit_root_tree<S: GitStore>(store: &S, commit: &str) -> ForgeResult<String> {
    let object = store
        .get_commit(commit)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("commit {commit}")))?;
    Ok(object.tree.sha)
}
