// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Layered configuration loading.
//!
//! ```text
//! ConfigLoader::new()
//!   .add_toml_file_optional("forge-tree.toml")
//!   .add_toml_file(--config)      (repeatable)
//!   .with_env_prefix("FORGE_TREE")
//!   .set_option(--set)            (repeatable)
//!        |
//!        v
//!    build() --> validated Config
//! ```
//!
//! Later layers win.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};

use super::Config;
use crate::error::{ConfigError, Result};

/// A file that contributes to the configuration.
#[derive(Debug, Clone)]
struct FileLayer {
    path: PathBuf,
    required: bool,
}

/// Collects configuration sources in priority order.
pub struct ConfigLoader {
    builder: ConfigBuilder<DefaultState>,
    env_prefix: Option<String>,
    files: Vec<FileLayer>,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: config::Config::builder(),
            env_prefix: None,
            files: Vec::new(),
        }
    }

    /// Layers a TOML file; `build()` fails if it is missing or malformed.
    #[must_use]
    pub fn add_toml_file(self, path: impl AsRef<Path>) -> Self {
        self.add_file(path.as_ref(), true)
    }

    /// Layers a TOML file only if it exists.
    #[must_use]
    pub fn add_toml_file_optional(self, path: impl AsRef<Path>) -> Self {
        self.add_file(path.as_ref(), false)
    }

    fn add_file(mut self, path: &Path, required: bool) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path).format(FileFormat::Toml).required(required));
        if required || path.is_file() {
            self.files.push(FileLayer {
                path: path.to_path_buf(),
                required,
            });
        }
        self
    }

    /// Reads `PREFIX_SECTION__KEY` variables, e.g. `FORGE_TREE_API__BASE_URL`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Applies a `section.key=value` override as given on the command line.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` if the option has no `=` or no section.
    pub fn set_option(mut self, option: &str) -> Result<Self> {
        let malformed = |message: String| ConfigError::ParseError {
            path: "--set".to_string(),
            message,
        };
        let (key, value) = option
            .split_once('=')
            .filter(|(key, _)| key.contains('.'))
            .ok_or_else(|| malformed(format!("expected 'section.key=value', got '{option}'")))?;
        self.builder = self
            .builder
            .set_override(key.trim(), value.trim())
            .map_err(|e| malformed(e.to_string()))?;
        Ok(self)
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A required file is missing or is not valid TOML.
    /// - An environment variable cannot be parsed.
    /// - A key is unknown or a value has the wrong type.
    /// - The merged values fail validation.
    pub fn build(self) -> Result<Config> {
        let builder = match &self.env_prefix {
            Some(prefix) => self.builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            ),
            None => self.builder,
        };
        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Files that take part in the result, numbered in priority order.
    #[must_use]
    pub fn format_loaded_files(&self) -> Vec<String> {
        self.files
            .iter()
            .enumerate()
            .map(|(i, layer)| {
                let label = if layer.required { "file" } else { "optional" };
                format!("{}. [{label}] {}", i + 1, layer.path.display())
            })
            .collect()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
