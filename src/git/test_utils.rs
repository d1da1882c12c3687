// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory [`GitStore`] for pipeline tests.
//!
//! Trees are kept as whole [`TreeIndex`] snapshots keyed by root id, so
//! `create_tree` runs the same local merge the engine uses for prediction.
//! Branch updates enforce fast-forward unless forced, and a pending
//! "external" commit can be slipped in right before the next update.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::error::{ApiError, ForgeResult};
use crate::git::index::TreeIndex;
use crate::git::mode::Mode;
use crate::git::object::{EMPTY_TREE_ID, blob_id};
use crate::git::patch::PatchChange;
use crate::git::store::{GitCommit, GitObject, GitStore, ObjectKind, ObjectRef, TagObject};
use crate::git::tree::{TreeEntry, TreeListing};

#[derive(Default)]
struct State {
    default_branch: String,
    branches: BTreeMap<String, String>,
    tag_refs: BTreeMap<String, GitObject>,
    tags: HashMap<String, TagObject>,
    commits: HashMap<String, GitCommit>,
    trees: HashMap<String, TreeIndex>,
    interleave: Option<(String, Vec<PatchChange>)>,
    truncate: bool,
    calls: Vec<&'static str>,
}

impl State {
    fn store_commit(&mut self, tree: &str, parents: &[&str], message: &str) -> String {
        let mut text = format!("tree {tree}\n");
        for parent in parents {
            text.push_str(&format!("parent {parent}\n"));
        }
        text.push_str(&format!("\n{message}\n{}", self.commits.len()));
        let sha = blob_id(text.as_bytes());
        self.commits.insert(
            sha.clone(),
            GitCommit {
                sha: sha.clone(),
                tree: ObjectRef {
                    sha: tree.to_string(),
                },
                parents: parents
                    .iter()
                    .map(|p| ObjectRef { sha: (*p).to_string() })
                    .collect(),
                message: message.to_string(),
            },
        );
        sha
    }

    fn head_tree(&self, branch: &str) -> TreeIndex {
        let head = &self.branches[branch];
        let tree = &self.commits[head].tree.sha;
        self.trees[tree].clone()
    }

    /// Commit `changes` on top of `branch` and move it, bypassing checks.
    fn commit_on(&mut self, branch: &str, changes: &[PatchChange], message: &str) -> String {
        let index = self.head_tree(branch).merge(changes).unwrap();
        let root = index.root().to_string();
        self.trees.insert(root.clone(), index);
        let parent = self.branches[branch].clone();
        let commit = self.store_commit(&root, &[&parent], message);
        self.branches.insert(branch.to_string(), commit.clone());
        commit
    }
}

/// A repository held entirely in memory.
pub(crate) struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Repository whose `main` branch has one commit with these files.
    pub(crate) fn new(files: &[(&str, Mode, &str)]) -> Self {
        let changes: Vec<PatchChange> = files
            .iter()
            .map(|(path, mode, content)| PatchChange::content(*path, *mode, *content))
            .collect();
        Self::from_changes(&changes)
    }

    /// Repository built from arbitrary changes (e.g. submodule entries).
    pub(crate) fn from_changes(changes: &[PatchChange]) -> Self {
        let empty = TreeIndex::from_listing(TreeListing {
            sha: EMPTY_TREE_ID.to_string(),
            entries: Vec::new(),
            truncated: false,
        });
        let index = empty.merge(changes).unwrap();
        let root = index.root().to_string();

        let mut state = State {
            default_branch: "main".to_string(),
            ..State::default()
        };
        state.trees.insert(root.clone(), index);
        let commit = state.store_commit(&root, &[], "Initial commit");
        state.branches.insert("main".to_string(), commit);
        Self {
            state: Mutex::new(state),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub(crate) fn head(&self, branch: &str) -> Option<String> {
        self.with(|s| s.branches.get(branch).cloned())
    }

    pub(crate) fn commit(&self, sha: &str) -> Option<GitCommit> {
        self.with(|s| s.commits.get(sha).cloned())
    }

    pub(crate) fn commit_count(&self) -> usize {
        self.with(|s| s.commits.len())
    }

    pub(crate) fn entry(&self, branch: &str, path: &str) -> Option<TreeEntry> {
        self.with(|s| s.head_tree(branch).get(path).cloned())
    }

    pub(crate) fn head_tree(&self, branch: &str) -> TreeIndex {
        self.with(|s| s.head_tree(branch))
    }

    /// Methods called so far, in order.
    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.with(|s| s.calls.clone())
    }

    /// Number of calls that wrote something.
    pub(crate) fn writes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(**c, "create_tree" | "create_commit" | "update_branch"))
            .count()
    }

    pub(crate) fn add_branch(&self, name: &str, from: &str) {
        self.with(|s| {
            let head = s.branches[from].clone();
            s.branches.insert(name.to_string(), head);
        });
    }

    /// Commit directly to `branch`, as another writer would.
    pub(crate) fn commit_external(&self, branch: &str, changes: &[PatchChange]) -> String {
        self.with(|s| s.commit_on(branch, changes, "External change"))
    }

    /// Apply `changes` to `branch` immediately before the next branch update.
    pub(crate) fn interleave_before_update(&self, branch: &str, changes: Vec<PatchChange>) {
        self.with(|s| s.interleave = Some((branch.to_string(), changes)));
    }

    pub(crate) fn add_lightweight_tag(&self, name: &str, commit: &str) {
        self.with(|s| {
            s.tag_refs.insert(
                name.to_string(),
                GitObject {
                    sha: commit.to_string(),
                    kind: ObjectKind::Commit,
                },
            );
        });
    }

    /// Annotated tag object pointing at `target`; returns the tag object id.
    pub(crate) fn add_tag_object(&self, name: &str, target: GitObject) -> String {
        self.with(|s| {
            let sha = blob_id(format!("tag {name} {} {}", target.sha, s.tags.len()).as_bytes());
            s.tags.insert(
                sha.clone(),
                TagObject {
                    sha: sha.clone(),
                    tag: name.to_string(),
                    object: target,
                },
            );
            sha
        })
    }

    pub(crate) fn add_tag_ref(&self, name: &str, target: GitObject) {
        self.with(|s| {
            s.tag_refs.insert(name.to_string(), target);
        });
    }

    /// Report every listing as truncated from now on.
    pub(crate) fn truncate_listings(&self) {
        self.with(|s| s.truncate = true);
    }
}

impl GitStore for MemoryStore {
    async fn default_branch(&self) -> ForgeResult<String> {
        Ok(self.with(|s| {
            s.calls.push("default_branch");
            s.default_branch.clone()
        }))
    }

    async fn get_branch(&self, branch: &str) -> ForgeResult<Option<GitObject>> {
        Ok(self.with(|s| {
            s.calls.push("get_branch");
            s.branches.get(branch).map(|sha| GitObject {
                sha: sha.clone(),
                kind: ObjectKind::Commit,
            })
        }))
    }

    async fn get_tag_ref(&self, tag: &str) -> ForgeResult<Option<GitObject>> {
        Ok(self.with(|s| {
            s.calls.push("get_tag_ref");
            s.tag_refs.get(tag).cloned()
        }))
    }

    async fn get_tag(&self, sha: &str) -> ForgeResult<Option<TagObject>> {
        Ok(self.with(|s| {
            s.calls.push("get_tag");
            s.tags.get(sha).cloned()
        }))
    }

    async fn find_commit(&self, reference: &str) -> ForgeResult<Option<String>> {
        Ok(self.with(|s| {
            s.calls.push("find_commit");
            if reference.len() < 4 {
                return None;
            }
            let mut hits = s.commits.keys().filter(|sha| sha.starts_with(reference));
            match (hits.next(), hits.next()) {
                (Some(sha), None) => Some(sha.clone()),
                _ => None,
            }
        }))
    }

    async fn get_commit(&self, sha: &str) -> ForgeResult<Option<GitCommit>> {
        Ok(self.with(|s| {
            s.calls.push("get_commit");
            s.commits.get(sha).cloned()
        }))
    }

    async fn get_tree_recursive(&self, sha: &str) -> ForgeResult<Option<TreeListing>> {
        Ok(self.with(|s| {
            s.calls.push("get_tree_recursive");
            s.trees.get(sha).map(|index| {
                let mut listing = index.to_listing();
                listing.truncated = s.truncate;
                listing
            })
        }))
    }

    async fn create_tree(&self, base_tree: &str, changes: &[PatchChange]) -> ForgeResult<String> {
        self.with(|s| {
            s.calls.push("create_tree");
            let base = s
                .trees
                .get(base_tree)
                .ok_or_else(|| ApiError::validation(format!("base_tree {base_tree} is invalid")))?;
            let index = base.merge(changes)?;
            let root = index.root().to_string();
            s.trees.insert(root.clone(), index);
            Ok(root)
        })
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &str,
        parents: &[&str],
    ) -> ForgeResult<String> {
        self.with(|s| {
            s.calls.push("create_commit");
            if !s.trees.contains_key(tree) {
                return Err(ApiError::validation(format!("tree {tree} is invalid")).into());
            }
            Ok(s.store_commit(tree, parents, message))
        })
    }

    async fn update_branch(&self, branch: &str, sha: &str, force: bool) -> ForgeResult<()> {
        self.with(|s| {
            s.calls.push("update_branch");
            if let Some((target, changes)) = s.interleave.take() {
                s.commit_on(&target, &changes, "Interleaved change");
            }
            let current = s
                .branches
                .get(branch)
                .cloned()
                .ok_or_else(|| ApiError::not_found(format!("branch '{branch}'")))?;
            let new = s
                .commits
                .get(sha)
                .ok_or_else(|| ApiError::validation(format!("object {sha} does not exist")))?;
            let fast_forward = new.parents.iter().any(|p| p.sha == current);
            if !force && !fast_forward {
                return Err(ApiError::NonFastForward {
                    branch: branch.to_string(),
                    message: "Update is not a fast forward".to_string(),
                }
                .into());
            }
            s.branches.insert(branch.to_string(), sha.to_string());
            Ok(())
        })
    }
}
