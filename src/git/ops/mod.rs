// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Change workflows.
//!
//! ```text
//! change_modes | write_files | delete_files
//!        |
//!        v
//!   normalize paths (strip '/', dedupe)
//!        |
//!        v
//!   load_base: branch --> head commit --> root tree --> TreeIndex
//!        |
//!        v
//!   plan: PatchChange per path, or Skipped with a reason
//!        |
//!        +-- nothing to change --> report, no request made
//!        +-- dry run           --> validate + local merge --> report
//!        v
//!   patch_tree --> create_commit --> advance_branch --> report
//! ```
//!
//! Nothing remote changes before `advance_branch`. A failure anywhere
//! earlier leaves the branch where it was; objects already written are
//! unreachable and harmless.

use bon::Builder;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};

use crate::error::{ApiError, ForgeResult};
use crate::git::commit::{advance_branch, create_commit};
use crate::git::index::TreeIndex;
use crate::git::mode::{Mode, store_mode_to_display, user_mode_to_store_mode};
use crate::git::object::blob_id;
use crate::git::patch::{self, PatchChange, patch_tree};
use crate::git::refs::{commit_root_tree, resolve_branch_head, resolve_ref_to_commit};
use crate::git::store::GitStore;
use crate::git::tree::{EntryKind, TreeListing, read_tree_recursive};

/// Paths named in an auto-generated commit message before it is shortened.
const MESSAGE_PATH_LIMIT: usize = 3;

/// Options shared by every workflow.
#[derive(Debug, Clone, Default, Builder)]
pub struct ChangeOptions {
    /// Branch to commit to; the repository default when unset.
    #[builder(into)]
    pub branch: Option<String>,
    /// Commit message; generated from the changed paths when unset.
    #[builder(into)]
    pub message: Option<String>,
    /// Move the branch even if it is no longer a fast-forward.
    #[builder(default)]
    pub force: bool,
    /// Stop after computing the patch.
    #[builder(default)]
    pub dry_run: bool,
}

/// New content for one path.
#[derive(Debug, Clone, Builder)]
pub struct FileWrite {
    #[builder(into)]
    pub path: String,
    #[builder(into)]
    pub content: String,
    /// Mode to write; keeps the current mode, or 644 for new files.
    pub mode: Option<Mode>,
    /// Blob id the caller last saw; the write fails if it has moved on.
    #[builder(into)]
    pub expected_sha: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Mode,
    Create,
    Update,
    Delete,
}

/// A path the commit touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedPath {
    pub path: String,
    pub action: ChangeAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_mode: Option<Mode>,
}

/// Why a requested path was left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    AlreadyMode { mode: Mode },
    NotABlob { kind: EntryKind },
    Unchanged,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyMode { mode } => {
                write!(f, "already {}", store_mode_to_display(&mode.to_string()))
            }
            Self::NotABlob { kind } => write!(f, "not a file (type: {kind})"),
            Self::Unchanged => f.write_str("content unchanged"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub path: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// How a workflow ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Every requested path changed in one commit.
    Committed,
    /// One commit, but some paths were skipped.
    Partial,
    /// Nothing needed changing; no commit was made.
    NoChanges,
    /// The patch was computed but nothing was written.
    DryRun,
}

/// Result of a workflow run.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeReport {
    pub outcome: Outcome,
    pub branch: String,
    pub base_commit: String,
    pub base_tree: String,
    /// New root tree; the locally predicted id on a dry run.
    pub tree: Option<String>,
    pub commit: Option<String>,
    pub message: Option<String>,
    pub changed: Vec<ChangedPath>,
    pub skipped: Vec<Skipped>,
    /// The base listing was incomplete.
    pub truncated: bool,
}

impl ChangeReport {
    #[must_use]
    pub fn changed_paths(&self) -> Vec<&str> {
        self.changed.iter().map(|c| c.path.as_str()).collect()
    }

    #[must_use]
    pub fn skipped_paths(&self) -> Vec<&str> {
        self.skipped.iter().map(|s| s.path.as_str()).collect()
    }
}

/// Everything read before planning.
struct Base {
    branch: String,
    commit: String,
    index: TreeIndex,
}

#[derive(Default)]
struct Plan {
    changes: Vec<PatchChange>,
    changed: Vec<ChangedPath>,
    skipped: Vec<Skipped>,
}

impl Plan {
    fn change(&mut self, change: PatchChange, changed: ChangedPath) {
        self.changes.push(change);
        self.changed.push(changed);
    }

    fn skip(&mut self, path: String, reason: SkipReason) {
        self.skipped.push(Skipped { path, reason });
    }
}

/// Strip surrounding `/`, drop duplicates, keep first-seen order.
///
/// # Errors
///
/// Returns `ApiError::Validation` for an empty list or a path that is
/// empty once stripped.
pub fn normalize_paths<P: AsRef<str>>(paths: &[P]) -> Result<Vec<String>, ApiError> {
    if paths.is_empty() {
        return Err(ApiError::validation("no paths given"));
    }
    let mut seen = HashSet::new();
    let mut normalized = Vec::with_capacity(paths.len());
    for raw in paths {
        let path = raw.as_ref().trim_matches('/');
        if path.is_empty() {
            return Err(ApiError::validation(format!(
                "'{}' is not a file path",
                raw.as_ref()
            )));
        }
        if seen.insert(path.to_string()) {
            normalized.push(path.to_string());
        }
    }
    Ok(normalized)
}

/// Auto-generated commit message: `"{summary} a, b, c, ... (N files total)"`.
///
/// `summary` carries its own punctuation, e.g. `"Change mode to 755:"`.
#[must_use]
pub fn commit_message(summary: &str, paths: &[&str]) -> String {
    let mut list = paths
        .iter()
        .take(MESSAGE_PATH_LIMIT)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    if paths.len() > MESSAGE_PATH_LIMIT {
        list.push_str(&format!(", ... ({} files total)", paths.len()));
    }
    format!("{summary} {list}")
}

async fn load_base<S: GitStore>(store: &S, branch: Option<&str>) -> ForgeResult<Base> {
    let branch = match branch {
        Some(branch) => branch.to_string(),
        None => store.default_branch().await?,
    };
    let commit = resolve_branch_head(store, &branch).await?;
    let tree = commit_root_tree(store, &commit).await?;
    let listing = read_tree_recursive(store, &tree).await?;
    Ok(Base {
        branch,
        commit,
        index: TreeIndex::from_listing(listing),
    })
}

fn require_paths(index: &TreeIndex, paths: &[String]) -> Result<(), ApiError> {
    let missing: Vec<String> = paths
        .iter()
        .filter(|path| !index.contains(path))
        .cloned()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::MissingPaths { paths: missing })
    }
}

async fn commit_plan<S: GitStore>(
    store: &S,
    base: Base,
    plan: Plan,
    summary: &str,
    options: &ChangeOptions,
) -> ForgeResult<ChangeReport> {
    let mut report = ChangeReport {
        outcome: Outcome::NoChanges,
        branch: base.branch.clone(),
        base_commit: base.commit.clone(),
        base_tree: base.index.root().to_string(),
        tree: None,
        commit: None,
        message: None,
        changed: plan.changed,
        skipped: plan.skipped,
        truncated: base.index.is_truncated(),
    };

    if plan.changes.is_empty() {
        info!(branch = %base.branch, "no changes needed");
        return Ok(report);
    }

    let message = options
        .message
        .clone()
        .unwrap_or_else(|| commit_message(summary, &report.changed_paths()));
    report.message = Some(message.clone());

    if options.dry_run {
        patch::validate(&base.index, &plan.changes)?;
        let predicted = base.index.merge(&plan.changes)?;
        info!(
            branch = %base.branch,
            tree = predicted.root(),
            changes = plan.changes.len(),
            "dry run, nothing written"
        );
        report.tree = Some(predicted.root().to_string());
        report.outcome = Outcome::DryRun;
        return Ok(report);
    }

    let tree = patch_tree(store, &base.index, &plan.changes).await?;
    let commit = create_commit(store, &tree, &base.commit, &message).await?;
    advance_branch(store, &base.branch, &commit, options.force).await?;

    report.tree = Some(tree);
    report.commit = Some(commit);
    report.outcome = if report.skipped.is_empty() {
        Outcome::Committed
    } else {
        Outcome::Partial
    };
    Ok(report)
}

/// Set the mode of every path in one commit.
///
/// Paths already at the target mode, and entries that are not blobs, are
/// skipped. When every path is skipped no commit is made.
///
/// # Errors
///
/// - `ApiError::Validation` for a malformed mode or path.
/// - `ApiError::MissingPaths` naming every path absent from the tree.
/// - `ApiError::NonFastForward` if the branch moved meanwhile.
pub async fn change_modes<S: GitStore, P: AsRef<str>>(
    store: &S,
    paths: &[P],
    mode: &str,
    options: &ChangeOptions,
) -> ForgeResult<ChangeReport> {
    let target = user_mode_to_store_mode(mode)?;
    let paths = normalize_paths(paths)?;
    let base = load_base(store, options.branch.as_deref()).await?;
    require_paths(&base.index, &paths)?;

    let mut plan = Plan::default();
    for path in paths {
        let Some(entry) = base.index.get(&path) else {
            continue;
        };
        if !entry.is_blob() {
            warn!(path, kind = %entry.kind, "not a file, skipping");
            plan.skip(path, SkipReason::NotABlob { kind: entry.kind });
        } else if entry.mode == target {
            info!(
                path,
                mode = %store_mode_to_display(&target.to_string()),
                "already has target mode"
            );
            plan.skip(path, SkipReason::AlreadyMode { mode: target });
        } else {
            plan.change(
                PatchChange::mode_only(&path, target, &entry.sha),
                ChangedPath {
                    path,
                    action: ChangeAction::Mode,
                    old_mode: Some(entry.mode),
                    new_mode: Some(target),
                },
            );
        }
    }

    let summary = format!("Change mode to {:03o}:", target.perms());
    commit_plan(store, base, plan, &summary, options).await
}

/// Write new content to one or more paths in one commit.
///
/// # Errors
///
/// - `ApiError::StaleContent` if an expected blob id no longer matches.
/// - `ApiError::NotFound` if an expected blob id is given for a new path.
/// - `ApiError::Validation` for writes onto directories or submodules, or
///   a non-file mode.
/// - `ApiError::NonFastForward` if the branch moved meanwhile.
pub async fn write_files<S: GitStore>(
    store: &S,
    files: &[FileWrite],
    options: &ChangeOptions,
) -> ForgeResult<ChangeReport> {
    let paths = normalize_paths(&files.iter().map(|f| f.path.as_str()).collect::<Vec<_>>())?;
    if paths.len() != files.len() {
        return Err(ApiError::validation("the same path is written more than once").into());
    }
    let base = load_base(store, options.branch.as_deref()).await?;

    let mut plan = Plan::default();
    let mut created_only = true;
    for (path, file) in paths.into_iter().zip(files) {
        let existing = base.index.get(&path);

        if let Some(expected) = &file.expected_sha {
            let entry = existing.ok_or_else(|| {
                ApiError::not_found(format!("'{path}' (expected blob {expected})"))
            })?;
            if &entry.sha != expected {
                return Err(ApiError::StaleContent {
                    path,
                    expected: expected.clone(),
                    actual: entry.sha.clone(),
                }
                .into());
            }
        }
        if let Some(entry) = existing
            && !entry.is_blob()
        {
            return Err(ApiError::validation(format!(
                "'{path}' is a {}, not a file",
                entry.kind
            ))
            .into());
        }

        let mode = file
            .mode
            .or_else(|| existing.map(|entry| entry.mode))
            .unwrap_or(Mode::REGULAR);
        if mode.entry_kind() != EntryKind::Blob {
            return Err(ApiError::validation(format!("'{path}': {mode} is not a file mode")).into());
        }

        match existing {
            Some(entry) if entry.sha == blob_id(file.content.as_bytes()) => {
                if entry.mode == mode {
                    info!(path, "content unchanged");
                    plan.skip(path, SkipReason::Unchanged);
                } else {
                    created_only = false;
                    plan.change(
                        PatchChange::mode_only(&path, mode, &entry.sha),
                        ChangedPath {
                            path,
                            action: ChangeAction::Mode,
                            old_mode: Some(entry.mode),
                            new_mode: Some(mode),
                        },
                    );
                }
            }
            Some(entry) => {
                created_only = false;
                plan.change(
                    PatchChange::content(&path, mode, file.content.as_str()),
                    ChangedPath {
                        path,
                        action: ChangeAction::Update,
                        old_mode: Some(entry.mode),
                        new_mode: Some(mode),
                    },
                );
            }
            None => plan.change(
                PatchChange::content(&path, mode, file.content.as_str()),
                ChangedPath {
                    path,
                    action: ChangeAction::Create,
                    old_mode: None,
                    new_mode: Some(mode),
                },
            ),
        }
    }

    let summary = if created_only { "Create" } else { "Update" };
    commit_plan(store, base, plan, summary, options).await
}

/// Remove files in one commit. Entries that are not blobs are skipped.
///
/// With `expected_sha` exactly one path may be given, and it is only
/// removed while its blob id still matches.
///
/// # Errors
///
/// - `ApiError::Validation` if `expected_sha` comes with several paths.
/// - `ApiError::MissingPaths` naming every path absent from the tree.
/// - `ApiError::StaleContent` if the file no longer has `expected_sha`.
/// - `ApiError::NonFastForward` if the branch moved meanwhile.
pub async fn delete_files<S: GitStore, P: AsRef<str>>(
    store: &S,
    paths: &[P],
    expected_sha: Option<&str>,
    options: &ChangeOptions,
) -> ForgeResult<ChangeReport> {
    let paths = normalize_paths(paths)?;
    if expected_sha.is_some() && paths.len() != 1 {
        return Err(ApiError::validation("an expected blob id applies to a single path").into());
    }
    let base = load_base(store, options.branch.as_deref()).await?;
    require_paths(&base.index, &paths)?;

    if let (Some(expected), [path]) = (expected_sha, paths.as_slice())
        && let Some(entry) = base.index.get(path)
        && entry.sha != expected
    {
        return Err(ApiError::StaleContent {
            path: path.clone(),
            expected: expected.to_string(),
            actual: entry.sha.clone(),
        }
        .into());
    }

    let mut plan = Plan::default();
    for path in paths {
        let Some(entry) = base.index.get(&path) else {
            continue;
        };
        if entry.is_blob() {
            plan.change(
                PatchChange::delete(&path, entry.mode),
                ChangedPath {
                    path,
                    action: ChangeAction::Delete,
                    old_mode: Some(entry.mode),
                    new_mode: None,
                },
            );
        } else {
            warn!(path, kind = %entry.kind, "not a file, skipping");
            plan.skip(path, SkipReason::NotABlob { kind: entry.kind });
        }
    }

    commit_plan(store, base, plan, "Delete", options).await
}

/// Resolve `reference` (or the default branch) and list its tree.
///
/// Returns the commit id alongside the listing.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the reference does not resolve.
pub async fn list_tree<S: GitStore>(
    store: &S,
    reference: Option<&str>,
) -> ForgeResult<(String, TreeListing)> {
    let commit = match reference {
        Some(reference) => resolve_ref_to_commit(store, reference).await?,
        None => {
            let branch = store.default_branch().await?;
            resolve_branch_head(store, &branch).await?
        }
    };
    let tree = commit_root_tree(store, &commit).await?;
    let listing = read_tree_recursive(store, &tree).await?;
    Ok((commit, listing))
}
