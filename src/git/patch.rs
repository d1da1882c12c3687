// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sparse tree patches.
//!
//! ```text
//! PatchChange { path, mode, source }
//!   source = Blob(sha)      -> {"path","mode","type","sha": sha}
//!            Content(text)  -> {"path","mode","type","content": text}
//!            Delete         -> {"path","mode","type","sha": null}
//!
//! patch_tree(base, changes)
//!   validate --> store.create_tree(base.root, changes)
//!   merge    --> predicted id, compared at debug level
//! ```

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::error::{ApiError, ForgeResult};
use crate::git::index::TreeIndex;
use crate::git::mode::Mode;
use crate::git::store::GitStore;
use crate::git::tree::EntryKind;

/// Where a changed entry's content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSource {
    /// Reuse an existing object; only the mode changes.
    Blob(String),
    /// New inline content; the store creates the blob.
    Content(String),
    /// Remove the entry.
    Delete,
}

/// One path-level change relative to a base tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchChange {
    pub path: String,
    pub mode: Mode,
    pub source: ChangeSource,
}

impl PatchChange {
    pub fn mode_only(path: impl Into<String>, mode: Mode, sha: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode,
            source: ChangeSource::Blob(sha.into()),
        }
    }

    pub fn content(path: impl Into<String>, mode: Mode, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode,
            source: ChangeSource::Content(text.into()),
        }
    }

    /// `mode` must be the entry's current mode.
    pub fn delete(path: impl Into<String>, mode: Mode) -> Self {
        Self {
            path: path.into(),
            mode,
            source: ChangeSource::Delete,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.mode.entry_kind()
    }

    /// Whether the path must already exist in the base tree.
    #[must_use]
    pub const fn needs_existing(&self) -> bool {
        !matches!(self.source, ChangeSource::Content(_))
    }
}

#[derive(Serialize)]
struct WireChange<'a> {
    path: &'a str,
    mode: Mode,
    #[serde(rename = "type")]
    kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<Option<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
}

impl Serialize for PatchChange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let (sha, content) = match &self.source {
            ChangeSource::Blob(sha) => (Some(Some(sha.as_str())), None),
            ChangeSource::Content(text) => (None, Some(text.as_str())),
            ChangeSource::Delete => (Some(None), None),
        };
        WireChange {
            path: &self.path,
            mode: self.mode,
            kind: self.kind(),
            sha,
            content,
        }
        .serialize(serializer)
    }
}

/// Check `changes` against `base` without contacting the store.
///
/// # Errors
///
/// - `ApiError::Validation` for an empty patch, inline content with a
///   non-file mode, or a mode whose type differs from the existing object.
/// - `ApiError::MissingPaths` naming every reused or deleted path absent
///   from `base`.
pub fn validate(base: &TreeIndex, changes: &[PatchChange]) -> Result<(), ApiError> {
    if changes.is_empty() {
        return Err(ApiError::validation("patch is empty"));
    }

    let missing: Vec<String> = changes
        .iter()
        .filter(|change| change.needs_existing() && !base.contains(&change.path))
        .map(|change| change.path.clone())
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::MissingPaths { paths: missing });
    }

    let mut details = Vec::new();
    for change in changes {
        match &change.source {
            ChangeSource::Content(_) if change.kind() != EntryKind::Blob => details.push(format!(
                "'{}': inline content needs a file mode, got {}",
                change.path, change.mode
            )),
            ChangeSource::Blob(_) | ChangeSource::Delete => {
                if let Some(existing) = base.get(&change.path)
                    && existing.kind != change.kind()
                {
                    details.push(format!(
                        "'{}': mode {} is for a {}, but the entry is a {}",
                        change.path,
                        change.mode,
                        change.kind(),
                        existing.kind
                    ));
                }
            }
            ChangeSource::Content(_) => {}
        }
    }
    if details.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation {
            message: "patch does not agree with the base tree".to_string(),
            details,
        })
    }
}

/// Create a tree from `base` plus `changes`; returns the new tree id.
///
/// # Errors
///
/// Returns validation errors from [`validate`] before any request, or the
/// store's error if it rejects the patch.
pub async fn patch_tree<S: GitStore>(
    store: &S,
    base: &TreeIndex,
    changes: &[PatchChange],
) -> ForgeResult<String> {
    validate(base, changes)?;

    let predicted = base.merge(changes)?;
    let tree = store.create_tree(base.root(), changes).await?;

    if predicted.root() == tree {
        debug!(base = base.root(), tree, changes = changes.len(), "created tree");
    } else {
        debug!(
            base = base.root(),
            tree,
            predicted = predicted.root(),
            truncated = base.is_truncated(),
            "created tree differs from local prediction"
        );
    }
    Ok(tree)
}
