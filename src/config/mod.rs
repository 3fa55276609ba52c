//! Layered configuration for the jobrunner binary
//!
//! Sources, lowest priority first:
//! 1. compiled-in defaults
//! 2. `default.toml`
//! 3. `{environment}.toml`
//! 4. `local.toml`
//! 5. `JOBRUNNER_*` environment variables

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    ApplicationConfig, ConsoleSettings, FileSettings, LoggerSettings, RunnerConfig, ServerConfig,
    Settings, StatusConfig,
};
