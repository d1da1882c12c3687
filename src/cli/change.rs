// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments of the commands that commit.
//!
//! ```text
//! chmod <owner/repo> -p PATH... -m MODE
//! write <owner/repo> -p PATH (-c TEXT | -f FILE) [-m MODE] [--sha BLOB]
//! rm    <owner/repo> -p PATH... [--sha BLOB]
//!   shared: [-b BRANCH] [--message M] [--force] [--json]
//! ```

use clap::{ArgGroup, Args};
use std::path::PathBuf;

use crate::api::RepoSlug;

/// Options shared by every committing command.
#[derive(Debug, Clone, Args)]
pub struct ChangeArgs {
    /// Repository as owner/repo.
    #[arg(value_name = "OWNER/REPO")]
    pub repo: RepoSlug,

    /// Branch to commit to (defaults to the repository's default branch).
    #[arg(short = 'b', long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Commit message (generated from the changed paths when omitted).
    #[arg(long, value_name = "MESSAGE")]
    pub message: Option<String>,

    /// Moves the branch even if it is not a fast-forward.
    /// Discards whatever landed on the branch since it was read.
    #[arg(long)]
    pub force: bool,

    /// Prints the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `chmod` command.
#[derive(Debug, Clone, Args)]
pub struct ChmodArgs {
    #[command(flatten)]
    pub change: ChangeArgs,

    /// File to change; can be repeated.
    #[arg(short = 'p', long = "path", value_name = "PATH", required = true, action = clap::ArgAction::Append)]
    pub paths: Vec<String>,

    /// Target mode, e.g. 755, 644 or 100755.
    #[arg(short = 'm', long, value_name = "MODE")]
    pub mode: String,
}

/// Arguments for the `write` command.
#[derive(Debug, Clone, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["content", "file"])))]
pub struct WriteArgs {
    #[command(flatten)]
    pub change: ChangeArgs,

    /// File to create or overwrite.
    #[arg(short = 'p', long = "path", value_name = "PATH")]
    pub path: String,

    /// New content, given inline.
    #[arg(short = 'c', long, value_name = "TEXT")]
    pub content: Option<String>,

    /// Reads the new content from a local file.
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Mode of the written file (keeps the current mode when omitted).
    #[arg(short = 'm', long, value_name = "MODE")]
    pub mode: Option<String>,

    /// Blob id the file must currently have; refuses to overwrite otherwise.
    #[arg(long = "sha", value_name = "BLOB")]
    pub expected_sha: Option<String>,
}

/// Arguments for the `rm` command.
#[derive(Debug, Clone, Args)]
pub struct RmArgs {
    #[command(flatten)]
    pub change: ChangeArgs,

    /// File to delete; can be repeated.
    #[arg(short = 'p', long = "path", value_name = "PATH", required = true, action = clap::ArgAction::Append)]
    pub paths: Vec<String>,

    /// Blob id the file must currently have; refuses to delete otherwise.
    /// Takes a single `--path`.
    #[arg(long = "sha", value_name = "BLOB")]
    pub expected_sha: Option<String>,
}
