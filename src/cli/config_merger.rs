//! Merges CLI overrides into the file/environment based settings.

use std::path::Path;

use super::parser::{Cli, Commands};
use crate::config::error::ConfigError;
use crate::config::{ConfigLoader, settings::Settings};

/// Applies CLI arguments on top of loaded settings; CLI values win.
pub struct ConfigurationMerger {
    base_config: Settings,
}

impl ConfigurationMerger {
    pub fn new(base_config: Settings) -> Self {
        Self { base_config }
    }

    /// Loads the base settings from `config_path` in single-file mode, or
    /// through the layered loader when no path is given.
    pub fn from_config_path(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_path {
            Some(path) => ConfigLoader::from_file(path).load()?,
            None => ConfigLoader::new()?.load()?,
        };

        Ok(Self::new(config))
    }

    /// Returns the merged settings, validated again after the overrides
    pub fn merge_cli_args(&self, cli: &Cli) -> Result<Settings, ConfigError> {
        let mut config = self.base_config.clone();

        if cli.verbose {
            config.logger.level = "debug".to_string();
        } else if cli.quiet {
            config.logger.level = "error".to_string();
        }

        if let Some(command) = &cli.command {
            Self::apply_command_overrides(&mut config, command);
        }

        config.validate()?;

        Ok(config)
    }

    fn apply_command_overrides(config: &mut Settings, command: &Commands) {
        match command {
            Commands::Serve {
                host,
                port,
                pool_size,
                self_concurrent,
                log_level,
                dry_run: _,
            } => {
                if let Some(host) = host {
                    config.server.host = host.clone();
                }
                if let Some(port) = port {
                    config.server.port = *port;
                }
                if pool_size.is_some() {
                    config.runner.pool_size = *pool_size;
                }
                if self_concurrent.is_some() {
                    config.runner.self_concurrent = *self_concurrent;
                }
                if let Some(level) = log_level {
                    config.logger.level = level.as_str().to_string();
                }
            }
        }
    }

    pub fn config(&self) -> &Settings {
        &self.base_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn merge(args: &[&str]) -> Settings {
        let cli = Cli::try_parse_from(args).unwrap();
        ConfigurationMerger::new(Settings::default())
            .merge_cli_args(&cli)
            .unwrap()
    }

    #[test]
    fn test_verbose_and_quiet_flags() {
        assert_eq!(merge(&["jobrunner", "--verbose"]).logger.level, "debug");
        assert_eq!(merge(&["jobrunner", "--quiet"]).logger.level, "error");
        assert_eq!(merge(&["jobrunner"]).logger.level, "info");
    }

    #[test]
    fn test_serve_overrides() {
        let settings = merge(&[
            "jobrunner",
            "-q",
            "serve",
            "--host",
            "0.0.0.0",
            "--port",
            "9100",
            "--pool-size",
            "3",
            "--self-concurrent",
            "1",
            "--log-level",
            "trace",
        ]);

        assert_eq!(settings.server.address(), "0.0.0.0:9100");
        assert_eq!(settings.runner.pool_size, Some(3));
        assert_eq!(settings.runner.self_concurrent, Some(1));
        assert_eq!(settings.logger.level, "trace");
    }

    #[test]
    fn test_unset_options_keep_file_values() {
        let base = Settings {
            runner: crate::config::RunnerConfig {
                pool_size: Some(7),
                self_concurrent: Some(1),
                heartbeat: Some("@every 5s".to_string()),
            },
            ..Default::default()
        };
        let cli = Cli::try_parse_from(["jobrunner", "serve"]).unwrap();
        let merged = ConfigurationMerger::new(base.clone())
            .merge_cli_args(&cli)
            .unwrap();
        assert_eq!(merged.runner, base.runner);
    }

    #[test]
    fn test_from_config_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[runner]\npool_size = 2\n\n[server]\nport = 9300").unwrap();

        let merger = ConfigurationMerger::from_config_path(Some(file.path())).unwrap();
        assert_eq!(merger.config().runner.pool_size, Some(2));
        assert_eq!(merger.config().server.port, 9300);
    }
}
