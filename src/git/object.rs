// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git object ids computed locally.
//!
//! ```text
//! blob: sha1("blob {len}\0" + content)
//! tree: sha1("tree {len}\0" + for each entry in git order:
//!                 "{mode} {name}\0" + 20 raw id bytes)
//! ```
//!
//! Git order compares names bytewise, with tree names compared as if they
//! ended in `/`; so `scripts-b` sorts before the directory `scripts`.

use sha1::{Digest, Sha1};
use std::cmp::Ordering;

use crate::error::ApiError;
use crate::git::mode::{Mode, ModeKind};

/// Id of the tree with no entries.
pub const EMPTY_TREE_ID: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// One direct child of a tree object.
#[derive(Debug, Clone, Copy)]
pub struct TreeItem<'a> {
    pub name: &'a str,
    pub mode: Mode,
    pub sha: &'a str,
}

fn hash_object(kind: &str, body: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("{kind} {}\0", body.len()).as_bytes());
    hasher.update(body);
    hex::encode(hasher.finalize())
}

/// Object id of a blob with this content.
#[must_use]
pub fn blob_id(content: &[u8]) -> String {
    hash_object("blob", content)
}

fn git_order(a: &TreeItem<'_>, b: &TreeItem<'_>) -> Ordering {
    let key = |item: &TreeItem<'_>| {
        let mut key = item.name.as_bytes().to_vec();
        if item.mode.kind() == ModeKind::Tree {
            key.push(b'/');
        }
        key
    };
    key(a).cmp(&key(b))
}

/// Object id of a tree with exactly these direct children.
///
/// # Errors
///
/// Returns `ApiError::Validation` if a child id is not 40 hex digits.
pub fn tree_id(mut items: Vec<TreeItem<'_>>) -> Result<String, ApiError> {
    items.sort_by(git_order);

    let mut body = Vec::with_capacity(items.len() * 48);
    for item in &items {
        let raw = hex::decode(item.sha)
            .ok()
            .filter(|raw| raw.len() == 20)
            .ok_or_else(|| {
                ApiError::validation(format!("'{}' has a malformed object id '{}'", item.name, item.sha))
            })?;
        body.extend_from_slice(item.mode.object_form().as_bytes());
        body.push(b' ');
        body.extend_from_slice(item.name.as_bytes());
        body.push(0);
        body.extend_from_slice(&raw);
    }
    Ok(hash_object("tree", &body))
}

