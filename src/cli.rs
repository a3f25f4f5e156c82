// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;
use crate::types::HumanDuration;

/// Command-line arguments for `dagwalk`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dagwalk",
    version,
    about = "Run a DAG of commands, each vertex starting once all of its dependencies succeeded.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Execution name used in logs and the report.
    ///
    /// Overrides `[config].name`; defaults to the config file stem.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Deadline for the whole execution (e.g. "30s", "10m").
    ///
    /// Overrides `[config].timeout`.
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<HumanDuration>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DAGWALK_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the execution report as JSON on stdout instead of a summary.
    #[arg(long)]
    pub json: bool,

    /// Parse + validate, print the DAG, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn defaults_to_the_standard_config_file() {
        let args = CliArgs::try_parse_from(["dagwalk"]).unwrap();
        assert_eq!(args.config, default_config_path());
        assert!(args.timeout.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn parses_overrides() {
        let args = CliArgs::try_parse_from([
            "dagwalk",
            "--config",
            "ci/Release.toml",
            "--timeout",
            "90s",
            "--log-level",
            "debug",
            "--json",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("ci/Release.toml"));
        assert_eq!(args.timeout.map(HumanDuration::as_duration), Some(Duration::from_secs(90)));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(args.json);
    }
}
