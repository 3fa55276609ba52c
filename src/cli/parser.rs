//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::build;

/// Cron-style job runner with a local status endpoint
#[derive(Parser, Debug)]
#[command(name = "jobrunner")]
#[command(about = "Cron-style job runner with a local status endpoint")]
#[command(long_about = "
jobrunner schedules jobs on cron expressions or `@every <duration>`
intervals, bounds how many of them run at once and serves their live
status to local callers.

EXAMPLES:
    # Start with the layered configuration from ./config
    jobrunner serve

    # At most four jobs at a time, let a job overlap with itself
    jobrunner serve --pool-size 4 --self-concurrent 1

    # Use a single configuration file
    jobrunner --config /etc/jobrunner/production.toml serve

    # Check configuration without starting anything
    jobrunner serve --dry-run
")]
#[command(version = build::CLAP_LONG_VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Single TOML configuration file, replacing the layered config directory
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Log errors only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the runner and the status endpoint (default)
    Serve {
        /// Address the status endpoint binds to
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port the status endpoint listens on
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Maximum number of jobs running at once; zero or less picks the default pool
        #[arg(long, value_name = "N", allow_negative_numbers = true)]
        pool_size: Option<i64>,

        /// Values greater than zero let a job overlap with its own previous run
        #[arg(long, value_name = "N", allow_negative_numbers = true)]
        self_concurrent: Option<i64>,

        /// Log level override, taking precedence over --verbose/--quiet
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Cli {
    pub fn is_dry_run(&self) -> bool {
        matches!(self.command, Some(Commands::Serve { dry_run: true, .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let err = Cli::try_parse_from(["jobrunner", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_default_behavior() {
        let cli = Cli::try_parse_from(["jobrunner"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(!cli.quiet);
        assert!(!cli.is_dry_run());
    }

    #[test]
    fn test_serve_runner_options() {
        let cli = Cli::try_parse_from([
            "jobrunner",
            "serve",
            "--pool-size",
            "-1",
            "--self-concurrent",
            "1",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Serve {
                pool_size,
                self_concurrent,
                dry_run,
                ..
            }) => {
                assert_eq!(pool_size, Some(-1));
                assert_eq!(self_concurrent, Some(1));
                assert!(dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["jobrunner", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Cli::try_parse_from(["jobrunner", "serve", "--port", "0"]).is_err());
    }
}
