// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::ApiClient;
use crate::error::{ApiError, ForgeResult};
use crate::git::patch::PatchChange;
use crate::git::store::{GitCommit, GitObject, GitRef, GitStore, TagObject};
use crate::git::tree::TreeListing;

#[derive(Deserialize)]
struct Sha {
    sha: String,
}

#[derive(Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Serialize)]
struct NewTree<'a> {
    base_tree: &'a str,
    tree: &'a [PatchChange],
}

#[derive(Serialize)]
struct NewCommit<'a> {
    message: &'a str,
    tree: &'a str,
    parents: &'a [&'a str],
}

#[derive(Serialize)]
struct RefUpdate<'a> {
    sha: &'a str,
    force: bool,
}

impl GitStore for ApiClient {
    async fn default_branch(&self) -> ForgeResult<String> {
        let what = format!("repository {}", self.repo);
        let info: Option<RepoInfo> = self.lookup(self.endpoint("")?, &what).await?;
        info.map(|i| i.default_branch)
            .ok_or_else(|| ApiError::not_found(what).into())
    }

    async fn get_branch(&self, branch: &str) -> ForgeResult<Option<GitObject>> {
        let url = self.endpoint(&format!("git/ref/heads/{branch}"))?;
        let found: Option<GitRef> = self.lookup(url, &format!("branch '{branch}'")).await?;
        Ok(found.map(|r| r.object))
    }

    async fn get_tag_ref(&self, tag: &str) -> ForgeResult<Option<GitObject>> {
        let url = self.endpoint(&format!("git/ref/tags/{tag}"))?;
        let found: Option<GitRef> = self.lookup(url, &format!("tag '{tag}'")).await?;
        Ok(found.map(|r| r.object))
    }

    async fn get_tag(&self, sha: &str) -> ForgeResult<Option<TagObject>> {
        let url = self.endpoint(&format!("git/tags/{sha}"))?;
        self.lookup(url, &format!("tag object {sha}")).await
    }

    async fn find_commit(&self, reference: &str) -> ForgeResult<Option<String>> {
        let url = self.endpoint(&format!("commits/{reference}"))?;
        let found: Option<Sha> = self.lookup(url, &format!("commit '{reference}'")).await?;
        Ok(found.map(|c| c.sha))
    }

    async fn get_commit(&self, sha: &str) -> ForgeResult<Option<GitCommit>> {
        let url = self.endpoint(&format!("git/commits/{sha}"))?;
        self.lookup(url, &format!("commit {sha}")).await
    }

    async fn get_tree_recursive(&self, sha: &str) -> ForgeResult<Option<TreeListing>> {
        let mut url = self.endpoint(&format!("git/trees/{sha}"))?;
        url.query_pairs_mut().append_pair("recursive", "1");
        self.lookup(url, &format!("tree {sha}")).await
    }

    async fn create_tree(&self, base_tree: &str, changes: &[PatchChange]) -> ForgeResult<String> {
        let body = NewTree {
            base_tree,
            tree: changes,
        };
        let created: Sha = self
            .write(Method::POST, self.endpoint("git/trees")?, &body, "base tree")
            .await?;
        debug!(base_tree, tree = %created.sha, changes = changes.len(), "tree created");
        Ok(created.sha)
    }

    async fn create_commit(
        &self,
        message: &str,
        tree: &str,
        parents: &[&str],
    ) -> ForgeResult<String> {
        let body = NewCommit {
            message,
            tree,
            parents,
        };
        let created: Sha = self
            .write(Method::POST, self.endpoint("git/commits")?, &body, "tree")
            .await?;
        Ok(created.sha)
    }

    async fn update_branch(&self, branch: &str, sha: &str, force: bool) -> ForgeResult<()> {
        let url = self.endpoint(&format!("git/refs/heads/{branch}"))?;
        let response = self
            .send_json(Method::PATCH, url, &RefUpdate { sha, force })
            .await?;
        if response.is_success() {
            info!(branch, commit = sha, force, "branch updated");
            return Ok(());
        }

        let message = response.message();
        let rejected_fast_forward = response.status == StatusCode::CONFLICT
            || (response.status == StatusCode::UNPROCESSABLE_ENTITY
                && message.to_lowercase().contains("fast forward"));
        if rejected_fast_forward {
            return Err(ApiError::NonFastForward {
                branch: branch.to_string(),
                message,
            }
            .into());
        }
        Err(response.error(&format!("branch '{branch}'")).into())
    }
}
