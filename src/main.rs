// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config --> Logging --> Command Dispatch
//!   Chmod | Write | Rm | Tree | Resolve | Options | Version
//! ```

use std::process::ExitCode;

use forge_tree::cli::global::GlobalOptions;
use forge_tree::cli::{self, Command};
use forge_tree::cmd::change::{run_chmod_command, run_rm_command, run_write_command};
use forge_tree::cmd::config::{run_options_command, run_version_command};
use forge_tree::cmd::query::{run_resolve_command, run_tree_command};
use forge_tree::config::Config;
use forge_tree::config::loader::ConfigLoader;
use forge_tree::error::{ApiError, ForgeError};
use forge_tree::logging::{LogConfig, init_logging};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = cli::parse();

    let loader = match build_config_loader(&cli.global) {
        Ok(loader) => loader,
        Err(e) => return report_error(&e),
    };
    let loaded_files = loader.format_loaded_files();
    let config = match loader.build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let log_config = build_log_config(&config);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    dispatch_command(&cli, &config, &loaded_files).await
}

fn build_log_config(config: &Config) -> LogConfig {
    LogConfig::builder()
        .with_console_level(config.log.output_log_level)
        .with_file_level(config.log.file_log_level)
        .maybe_with_log_file(config.log.log_file.as_ref().map(|p| p.display().to_string()))
        .with_json_file(config.log.json)
        .build()
}

async fn dispatch_command(cli: &cli::Cli, config: &Config, loaded_files: &[String]) -> ExitCode {
    let global = &cli.global;
    let result = match &cli.command {
        Some(Command::Version) => {
            run_version_command();
            Ok(())
        }
        Some(Command::Options) => {
            run_options_command(config, loaded_files);
            Ok(())
        }
        Some(Command::Chmod(args)) => run_chmod_command(args, config, global).await,
        Some(Command::Write(args)) => run_write_command(args, config, global).await,
        Some(Command::Rm(args)) => run_rm_command(args, config, global).await,
        Some(Command::Tree(args)) => run_tree_command(args, config, global).await,
        Some(Command::Resolve(args)) => run_resolve_command(args, config, global).await,
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            Err(anyhow::anyhow!("No command specified"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_error(&e),
    }
}

fn report_error(e: &anyhow::Error) -> ExitCode {
    eprintln!("Error: {e:#}");
    let hint = e
        .downcast_ref::<ForgeError>()
        .and_then(ForgeError::hint)
        .or_else(|| e.downcast_ref::<ApiError>().and_then(ApiError::hint));
    if let Some(hint) = hint {
        eprintln!("hint: {hint}");
    }
    ExitCode::FAILURE
}

fn build_config_loader(global: &GlobalOptions) -> anyhow::Result<ConfigLoader> {
    let mut loader = ConfigLoader::new().add_toml_file_optional("forge-tree.toml");
    for path in &global.configs {
        loader = loader.add_toml_file(path);
    }
    loader = loader.with_env_prefix("FORGE_TREE");
    for option in global.to_config_overrides() {
        loader = loader.set_option(&option)?;
    }
    Ok(loader)
}
