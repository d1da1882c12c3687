// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The object-store seam.
//!
//! ```text
//!   refs / tree / patch / commit / ops
//!                  |
//!                  v
//!            trait GitStore
//!              |         |
//!              v         v
//!        ApiClient    MemoryStore
//!        (HTTP)       (tests)
//! ```
//!
//! Lookups return `Ok(None)` when the object is absent, so callers can try
//! alternatives (see `RefSpec`) and choose their own `NotFound` wording.
//! Writes fail with a classified `ApiError`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ForgeResult;
use crate::git::patch::PatchChange;
use crate::git::tree::TreeListing;

/// Object kinds a reference or tag can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Commit,
    Tag,
    Tree,
    Blob,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Commit => "commit",
            Self::Tag => "tag",
            Self::Tree => "tree",
            Self::Blob => "blob",
        })
    }
}

/// Target of a reference or tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitObject {
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
}

/// Response of `git/ref/...`.
#[derive(Debug, Clone, Deserialize)]
pub struct GitRef {
    #[serde(rename = "ref")]
    pub name: String,
    pub object: GitObject,
}

/// Annotated tag object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagObject {
    pub sha: String,
    pub tag: String,
    pub object: GitObject,
}

/// Id-only pointer used inside commit payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub sha: String,
}

/// A commit object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCommit {
    pub sha: String,
    pub tree: ObjectRef,
    #[serde(default)]
    pub parents: Vec<ObjectRef>,
    #[serde(default)]
    pub message: String,
}

/// Operations the engine needs from a remote object store.
#[allow(async_fn_in_trait)]
pub trait GitStore {
    /// Name of the repository's default branch.
    async fn default_branch(&self) -> ForgeResult<String>;

    /// Current target of `refs/heads/{branch}`.
    async fn get_branch(&self, branch: &str) -> ForgeResult<Option<GitObject>>;

    /// Current target of `refs/tags/{tag}`.
    async fn get_tag_ref(&self, tag: &str) -> ForgeResult<Option<GitObject>>;

    /// Annotated tag object by id.
    async fn get_tag(&self, sha: &str) -> ForgeResult<Option<TagObject>>;

    /// Commit id for any commit-ish the store understands (full or
    /// abbreviated id).
    async fn find_commit(&self, reference: &str) -> ForgeResult<Option<String>>;

    async fn get_commit(&self, sha: &str) -> ForgeResult<Option<GitCommit>>;

    /// Flattened listing of every entry under `sha`.
    async fn get_tree_recursive(&self, sha: &str) -> ForgeResult<Option<TreeListing>>;

    /// Store `changes` on top of `base_tree`; returns the new root tree id.
    async fn create_tree(&self, base_tree: &str, changes: &[PatchChange]) -> ForgeResult<String>;

    /// Store a commit object; returns its id. Touches no reference.
    async fn create_commit(&self, message: &str, tree: &str, parents: &[&str])
    -> ForgeResult<String>;

    /// Move `refs/heads/{branch}` to `sha`.
    ///
    /// Without `force` the store must refuse a move that is not a
    /// fast-forward with `ApiError::NonFastForward`.
    async fn update_branch(&self, branch: &str, sha: &str, force: bool) -> ForgeResult<()>;
}
