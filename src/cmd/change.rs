// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! `chmod`, `write` and `rm` handlers.
//!
//! ```text
//! args --> ChangeOptions --> git::ops workflow --> ChangeReport
//!                                                    |
//!                                        --json ? pretty JSON : lines
//! ```

use anyhow::Context;

use crate::cli::change::{ChangeArgs, ChmodArgs, RmArgs, WriteArgs};
use crate::cli::global::GlobalOptions;
use crate::cmd::connect;
use crate::config::Config;
use crate::error::Result;
use crate::git::mode::user_mode_to_store_mode;
use crate::git::ops::{
    ChangeAction, ChangeOptions, ChangeReport, FileWrite, Outcome, change_modes, delete_files,
    write_files,
};

/// Map the shared arguments onto workflow options.
#[must_use]
pub fn change_options(args: &ChangeArgs, dry_run: bool) -> ChangeOptions {
    ChangeOptions::builder()
        .maybe_branch(args.branch.clone())
        .maybe_message(args.message.clone())
        .force(args.force)
        .dry_run(dry_run)
        .build()
}

/// Run the `chmod` command.
///
/// # Errors
///
/// Returns an error if the mode or paths are invalid, or the remote rejects
/// the change.
pub async fn run_chmod_command(
    args: &ChmodArgs,
    config: &Config,
    global: &GlobalOptions,
) -> Result<()> {
    let client = connect(config, global.token.as_deref(), &args.change.repo)?;
    let options = change_options(&args.change, global.dry);
    let report = change_modes(&client, &args.paths, &args.mode, &options).await?;
    print_report(&report, args.change.json)
}

/// Run the `write` command.
///
/// # Errors
///
/// Returns an error if the content file cannot be read, the mode is
/// invalid, or the remote rejects the change.
pub async fn run_write_command(
    args: &WriteArgs,
    config: &Config,
    global: &GlobalOptions,
) -> Result<()> {
    let file = file_write(args).await?;
    let client = connect(config, global.token.as_deref(), &args.change.repo)?;
    let options = change_options(&args.change, global.dry);
    let report = write_files(&client, &[file], &options).await?;
    print_report(&report, args.change.json)
}

/// Run the `rm` command.
///
/// # Errors
///
/// Returns an error if a path is missing or the remote rejects the change.
pub async fn run_rm_command(args: &RmArgs, config: &Config, global: &GlobalOptions) -> Result<()> {
    let client = connect(config, global.token.as_deref(), &args.change.repo)?;
    let options = change_options(&args.change, global.dry);
    let report = delete_files(&client, &args.paths, args.expected_sha.as_deref(), &options).await?;
    print_report(&report, args.change.json)
}

/// Turn `write` arguments into a [`FileWrite`], reading `--file` if given.
///
/// # Errors
///
/// Returns an error if the mode is malformed or the file cannot be read.
pub async fn file_write(args: &WriteArgs) -> Result<FileWrite> {
    let content = match (&args.content, &args.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => anyhow::bail!("either --content or --file is required"),
    };
    let mode = args
        .mode
        .as_deref()
        .map(user_mode_to_store_mode)
        .transpose()?;

    Ok(FileWrite::builder()
        .path(args.path.as_str())
        .content(content)
        .maybe_mode(mode)
        .maybe_expected_sha(args.expected_sha.clone())
        .build())
}

fn print_report(report: &ChangeReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        for line in render_report(report) {
            println!("{line}");
        }
    }
    Ok(())
}

/// Human-readable summary of a workflow run.
#[must_use]
pub fn render_report(report: &ChangeReport) -> Vec<String> {
    let mut lines = Vec::new();
    let short = |sha: &Option<String>| sha.as_deref().map_or("-", short_sha).to_string();

    match report.outcome {
        Outcome::Committed => lines.push(format!(
            "Committed {} to {}",
            short(&report.commit),
            report.branch
        )),
        Outcome::Partial => lines.push(format!(
            "Committed {} to {} ({} of {} paths skipped)",
            short(&report.commit),
            report.branch,
            report.skipped.len(),
            report.skipped.len() + report.changed.len()
        )),
        Outcome::NoChanges => lines.push(format!(
            "No changes needed on {} (at {})",
            report.branch,
            short_sha(&report.base_commit)
        )),
        Outcome::DryRun => lines.push(format!(
            "Dry run: would commit tree {} on {} (at {})",
            short(&report.tree),
            report.branch,
            short_sha(&report.base_commit)
        )),
    }
    if let Some(message) = &report.message {
        lines.push(format!("  message: {message}"));
    }

    for change in &report.changed {
        let modes = match (change.action, change.old_mode, change.new_mode) {
            (ChangeAction::Mode, Some(old), Some(new)) => {
                format!(" ({:03o} -> {:03o})", old.perms(), new.perms())
            }
            _ => String::new(),
        };
        let action = match change.action {
            ChangeAction::Mode => "mode",
            ChangeAction::Create => "create",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
        };
        lines.push(format!("  {action:<7}{}{modes}", change.path));
    }
    for skipped in &report.skipped {
        lines.push(format!("  {:<7}{}: {}", "skip", skipped.path, skipped.reason));
    }
    if report.truncated {
        lines.push("warning: the tree listing was truncated; some entries were not visible".into());
    }
    lines
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
