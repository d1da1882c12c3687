// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Recursive tree listings.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::error::{ApiError, ForgeResult};
use crate::git::mode::Mode;
use crate::git::store::GitStore;

/// Object type of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    Commit,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        })
    }
}

/// One entry of a flattened listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Full `/`-separated path from the root tree.
    pub path: String,
    pub mode: Mode,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub sha: String,
    /// Byte size; blobs only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl TreeEntry {
    #[must_use]
    pub fn is_blob(&self) -> bool {
        self.kind == EntryKind::Blob
    }

    /// Last path segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.rsplit_once('/').map_or(self.path.as_str(), |(_, name)| name)
    }
}

/// A tree read with `recursive=1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeListing {
    /// Id of the root tree that was listed.
    pub sha: String,
    #[serde(rename = "tree")]
    pub entries: Vec<TreeEntry>,
    /// The store cut the listing short; entries are incomplete.
    #[serde(default)]
    pub truncated: bool,
}

impl TreeListing {
    /// Keep only `prefix` itself and the entries below it.
    ///
    /// Matching is per path component, so `src` does not select `src2/a`.
    /// An empty prefix (or `/`) keeps everything.
    #[must_use]
    pub fn under(mut self, prefix: &str) -> Self {
        let prefix = prefix.trim_matches('/');
        if !prefix.is_empty() {
            self.entries.retain(|entry| {
                entry
                    .path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
            });
        }
        self
    }
}

/// List every entry under `tree`.
///
/// A truncated listing is returned as-is with a warning.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the tree does not exist.
pub async fn read_tree_recursive<S: GitStore>(store: &S, tree: &str) -> ForgeResult<TreeListing> {
    let listing = store
        .get_tree_recursive(tree)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("tree {tree}")))?;

    if listing.truncated {
        warn!(
            tree,
            entries = listing.entries.len(),
            "tree listing truncated by the server; results are partial"
        );
    } else {
        debug!(tree, entries = listing.entries.len(), "read tree");
    }
    Ok(listing)
}
