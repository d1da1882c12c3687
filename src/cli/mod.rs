// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for forge-tree using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! forge-tree [global options] <command>
//! chmod   <owner/repo> -p PATH... -m MODE
//! write   <owner/repo> -p PATH (-c TEXT | -f FILE)
//! rm      <owner/repo> -p PATH...
//! tree    <owner/repo> [-r REF]
//! resolve <owner/repo> REF
//! options
//! version
//! ```

pub mod change;
pub mod global;
pub mod query;


use crate::cli::change::{ChmodArgs, RmArgs, WriteArgs};
use crate::cli::global::GlobalOptions;
use crate::cli::query::{ResolveArgs, TreeArgs};
use clap::{Parser, Subcommand};

/// Remote tree mutation for hosted Git repositories.
///
/// Changes file modes and contents on a branch without a local clone.
#[derive(Debug, Parser)]
#[command(
    name = "forge-tree",
    author,
    version,
    about = "Atomic file content and mode changes for hosted Git repositories",
    long_about = "forge-tree Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Changes file modes and contents on a GitHub branch through the\n\
                  Git Data API, without cloning. Every invocation makes at most one\n\
                  commit, and the branch only moves if nobody else moved it first.\n\
                  See `forge-tree <command> --help` for more information about a command.",
    after_help = "CONFIG FILES:\n\n\
                  forge-tree reads `forge-tree.toml` from the current directory if\n\
                  present, then every file given with --config, then FORGE_TREE_*\n\
                  environment variables (e.g. FORGE_TREE_API__BASE_URL), then --set.\n\
                  The token is only taken from --token or GITHUB_TOKEN."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    #[command(visible_alias = "-v")]
    Version,

    /// Lists all options and their values.
    Options,

    /// Sets the mode of one or more files in a single commit.
    Chmod(ChmodArgs),

    /// Creates or overwrites a file in a single commit.
    Write(WriteArgs),

    /// Deletes one or more files in a single commit.
    Rm(RmArgs),

    /// Lists every entry of a branch, tag or commit.
    Tree(TreeArgs),

    /// Prints the commit a branch, tag or commit id resolves to.
    Resolve(ResolveArgs),
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
