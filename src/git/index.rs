// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory `path -> entry` index over a flattened listing.
//!
//! ```text
//! TreeListing --from_listing--> TreeIndex
//!                                  |
//!                 merge(changes)   |  copy-on-write
//!                                  v
//!   1. apply each change      (delete / replace / insert)
//!   2. create missing parents  (placeholder tree entries)
//!   3. mark every ancestor of a touched path dirty
//!   4. re-hash dirty dirs deepest first; prune the empty ones
//!   5. hash the root            --> predicted root tree id
//! ```
//!
//! Subtrees no change touches keep their ids without being re-hashed, which
//! is the same structural merge the store performs for `base_tree` writes.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ApiError;
use crate::git::mode::Mode;
use crate::git::object::{TreeItem, blob_id, tree_id};
use crate::git::patch::{ChangeSource, PatchChange};
use crate::git::tree::{EntryKind, TreeEntry, TreeListing};

/// Lookup table over a recursive listing, keyed by full path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeIndex {
    root: String,
    entries: BTreeMap<String, TreeEntry>,
    truncated: bool,
}

impl TreeIndex {
    #[must_use]
    pub fn from_listing(listing: TreeListing) -> Self {
        Self {
            root: listing.sha,
            entries: listing
                .entries
                .into_iter()
                .map(|entry| (entry.path.clone(), entry))
                .collect(),
            truncated: listing.truncated,
        }
    }

    /// Id of the root tree this index describes.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&TreeEntry> {
        self.entries.get(path)
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.values()
    }

    /// Back to a flat listing, in path order.
    #[must_use]
    pub fn to_listing(&self) -> TreeListing {
        TreeListing {
            sha: self.root.clone(),
            entries: self.entries.values().cloned().collect(),
            truncated: self.truncated,
        }
    }

    /// Apply `changes` locally and compute the resulting ids.
    ///
    /// Returns the new index, whose [`root`](Self::root) is the predicted
    /// root tree id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Validation` if a change would place an entry below
    /// an existing file, or an id in the index is malformed.
    pub fn merge(&self, changes: &[PatchChange]) -> Result<Self, ApiError> {
        let mut entries = self.entries.clone();
        let mut dirty: BTreeSet<String> = BTreeSet::new();

        for change in changes {
            let path = change.path.as_str();
            remove_subtree(&mut entries, path);

            let (sha, size) = match &change.source {
                ChangeSource::Delete => {
                    entries.remove(path);
                    mark_ancestors(&mut dirty, path);
                    continue;
                }
                ChangeSource::Blob(sha) => {
                    let size = entries
                        .get(path)
                        .filter(|old| &old.sha == sha)
                        .and_then(|old| old.size);
                    (sha.clone(), size)
                }
                ChangeSource::Content(text) => {
                    (blob_id(text.as_bytes()), Some(text.len() as u64))
                }
            };

            ensure_parents(&mut entries, path)?;
            entries.insert(
                path.to_string(),
                TreeEntry {
                    path: path.to_string(),
                    mode: change.mode,
                    kind: change.mode.entry_kind(),
                    sha,
                    size,
                },
            );
            mark_ancestors(&mut dirty, path);
        }

        let root = if dirty.is_empty() {
            self.root.clone()
        } else {
            rehash(&mut entries, &dirty)?
        };

        Ok(Self {
            root,
            entries,
            truncated: self.truncated,
        })
    }
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

fn depth(path: &str) -> usize {
    if path.is_empty() {
        0
    } else {
        path.matches('/').count() + 1
    }
}

/// Every proper ancestor of `path`, root (`""`) included.
fn mark_ancestors(dirty: &mut BTreeSet<String>, path: &str) {
    let mut current = path;
    loop {
        current = parent_of(current);
        dirty.insert(current.to_string());
        if current.is_empty() {
            break;
        }
    }
}

/// Drop everything below `path` if it names a directory.
fn remove_subtree(entries: &mut BTreeMap<String, TreeEntry>, path: &str) {
    let prefix = format!("{path}/");
    let doomed: Vec<String> = entries
        .range(prefix.clone()..)
        .take_while(|(key, _)| key.starts_with(&prefix))
        .map(|(key, _)| key.clone())
        .collect();
    for key in doomed {
        entries.remove(&key);
    }
}

fn ensure_parents(entries: &mut BTreeMap<String, TreeEntry>, path: &str) -> Result<(), ApiError> {
    let mut parent = parent_of(path);
    while !parent.is_empty() {
        match entries.get(parent) {
            Some(existing) if existing.kind != EntryKind::Tree => {
                return Err(ApiError::validation(format!(
                    "cannot place '{path}' below '{parent}', which is a {}",
                    existing.kind
                )));
            }
            Some(_) => {}
            None => {
                entries.insert(
                    parent.to_string(),
                    TreeEntry {
                        path: parent.to_string(),
                        mode: Mode::TREE,
                        kind: EntryKind::Tree,
                        sha: String::new(),
                        size: None,
                    },
                );
            }
        }
        parent = parent_of(parent);
    }
    Ok(())
}

fn children<'a>(
    entries: &'a BTreeMap<String, TreeEntry>,
    dir: &str,
) -> impl Iterator<Item = &'a TreeEntry> {
    let prefix = if dir.is_empty() {
        String::new()
    } else {
        format!("{dir}/")
    };
    let skip = prefix.len();
    entries
        .range(prefix.clone()..)
        .take_while(move |(key, _)| key.starts_with(&prefix))
        .filter(move |(key, _)| !key[skip..].contains('/'))
        .map(|(_, entry)| entry)
}

/// Recompute dirty directories deepest first; returns the root id.
fn rehash(
    entries: &mut BTreeMap<String, TreeEntry>,
    dirty: &BTreeSet<String>,
) -> Result<String, ApiError> {
    let mut order: Vec<&String> = dirty.iter().collect();
    order.sort_by_key(|dir| std::cmp::Reverse(depth(dir)));

    let mut root = String::new();
    for dir in order {
        // A later change may have put a file where the directory was.
        if entries
            .get(dir.as_str())
            .is_some_and(|entry| entry.kind != EntryKind::Tree)
        {
            continue;
        }
        let items: Vec<TreeItem<'_>> = children(entries, dir)
            .map(|entry| TreeItem {
                name: entry.name(),
                mode: entry.mode,
                sha: &entry.sha,
            })
            .collect();

        if dir.is_empty() {
            root = tree_id(items)?;
        } else if items.is_empty() {
            entries.remove(dir.as_str());
        } else {
            let sha = tree_id(items)?;
            if let Some(entry) = entries.get_mut(dir.as_str()) {
                entry.sha = sha;
            }
        }
    }
    Ok(root)
}
