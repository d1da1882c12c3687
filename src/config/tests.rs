// forge-tree: Remote tree mutation for hosted Git repositories
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::Config;
use super::loader::ConfigLoader;
use crate::config::types::{DEFAULT_API_URL, DEFAULT_API_VERSION, RetryConfig};
use crate::logging::LogLevel;
use std::io::Write;

fn toml_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn parse(content: &str) -> crate::error::Result<Config> {
    let file = toml_file(content);
    ConfigLoader::new().add_toml_file(file.path()).build()
}

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.api.base_url, DEFAULT_API_URL);
    assert_eq!(config.api.version, DEFAULT_API_VERSION);
    assert!(config.api.user_agent.starts_with("forge-tree/"));
    assert_eq!(config.api.timeout_secs, 60);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.max_delay_secs, 300);
    assert_eq!(config.log.output_log_level, LogLevel::INFO);
    assert!(config.log.log_file.is_none());
}

#[test]
fn test_parse_partial_sections_keep_defaults() {
    let config = parse(
        r#"
[api]
base_url = "https://ghe.example.com/api/v3"

[retry]
max_attempts = 5
"#,
    )
    .unwrap();

    assert_eq!(config.api.base_url, "https://ghe.example.com/api/v3");
    assert_eq!(config.api.version, DEFAULT_API_VERSION);
    assert_eq!(config.retry.max_attempts, 5);
    assert_eq!(config.retry.rate_limit_backoff_secs, 60);
}

#[test]
fn test_parse_rejects_unknown_keys() {
    assert!(parse("[api]\nbase_uri = \"x\"\n").is_err());
    assert!(parse("[nonsense]\nkey = 1\n").is_err());
}

#[test]
fn test_parse_rejects_invalid_retry() {
    let err = parse("[retry]\nmax_attempts = 0\n").unwrap_err();
    assert!(err.to_string().contains("max_attempts"), "{err:#}");

    let err = parse("[retry]\nserver_error_jitter_secs = -1.0\n").unwrap_err();
    assert!(err.to_string().contains("server_error_jitter_secs"), "{err:#}");
}

#[test]
fn test_parse_log_level_out_of_range() {
    assert!(parse("[log]\noutput_log_level = 9\n").is_err());
}

#[test]
fn test_set_option_overrides_file() {
    let file = toml_file("[api]\ntimeout_secs = 10\n");
    let config = ConfigLoader::new()
        .add_toml_file(file.path())
        .set_option("api.timeout_secs=120")
        .unwrap()
        .set_option("retry.rate_limit_jitter_secs = 0.5")
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(config.api.timeout_secs, 120);
    assert!((config.retry.rate_limit_jitter_secs - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_set_option_malformed() {
    assert!(ConfigLoader::new().set_option("timeout_secs=1").is_err());
    assert!(ConfigLoader::new().set_option("api.timeout_secs").is_err());
}

#[test]
fn test_loaded_files_list_existing_layers() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[log]\noutput_log_level = 2\njson = true").unwrap();

    let loader = ConfigLoader::new()
        .add_toml_file_optional("definitely-not-here.toml")
        .add_toml_file_optional(file.path())
        .add_toml_file(file.path());
    let loaded = loader.format_loaded_files();
    assert_eq!(loaded.len(), 2);
    assert!(loaded[0].starts_with("1. [optional] "));
    assert!(loaded[1].starts_with("2. [file] "));

    let config = loader.build().unwrap();
    assert_eq!(config.log.output_log_level, LogLevel::WARN);
    assert!(config.log.json);
}

#[test]
fn test_missing_required_file_fails() {
    assert!(
        ConfigLoader::new()
            .add_toml_file("definitely-not-here.toml")
            .build()
            .is_err()
    );
}

#[test]
fn test_format_options_sorted_and_aligned() {
    let options = Config::default().format_options();
    let keys: Vec<&str> = options
        .iter()
        .map(|line| line.split_whitespace().next().unwrap())
        .collect();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(keys, sorted);

    let eq_columns: Vec<usize> = options.iter().map(|l| l.find(" = ").unwrap()).collect();
    assert!(eq_columns.windows(2).all(|w| w[0] == w[1]));
    assert!(options.contains(&format!(
        "{:<31} = 3",
        "retry.max_attempts"
    )));
}

#[test]
fn test_retry_config_validate() {
    assert!(RetryConfig::default().validate().is_ok());
    let bad = RetryConfig {
        rate_limit_jitter_secs: f64::NAN,
        ..RetryConfig::default()
    };
    assert!(bad.validate().is_err());

    let huge = RetryConfig {
        server_error_jitter_secs: 1e20,
        ..RetryConfig::default()
    };
    let err = huge.validate().unwrap_err();
    assert!(err.to_string().contains("must not exceed max_delay_secs"), "{err}");
}

#[test]
fn test_retry_config_huge_jitter_rejected_from_env_style_override() {
    let err = ConfigLoader::new()
        .set_option("retry.rate_limit_jitter_secs=1e20")
        .unwrap()
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("rate_limit_jitter_secs"), "{err:#}");
}
