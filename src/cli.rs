// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::DEFAULT_CONFIG_PATH;

/// Command-line arguments for `stagedag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stagedag",
    version,
    about = "Run system setup stages in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the stage file (TOML).
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STAGEDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the stage layers, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Also run stages without any dependency edges (overrides `[config]`).
    #[arg(long)]
    pub enable_init: bool,

    /// Wait for background stages before exiting (overrides `[config]`).
    #[arg(long)]
    pub collect_orphans: bool,

    /// Cancel the run after this many seconds.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
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
    use super::*;
    use crate::config::default_config_path;

    #[test]
    fn config_defaults_to_the_shared_stage_file_path() {
        let args = CliArgs::try_parse_from(["stagedag"]).unwrap();
        assert_eq!(args.config, default_config_path());
        assert!(args.timeout.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn explicit_config_and_flags_are_parsed() {
        let args = CliArgs::try_parse_from([
            "stagedag",
            "--config",
            "boot.toml",
            "--enable-init",
            "--timeout",
            "30",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("boot.toml"));
        assert!(args.enable_init);
        assert_eq!(args.timeout, Some(30));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }
}
