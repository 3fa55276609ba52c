//! Serve command: dry-run validation or the long-running server.

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::server::Server;

pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            self.validate_only()
        } else {
            Server::new(self.config.clone()).run().await
        }
    }

    /// Validate configuration without starting anything
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;
        self.config.logger.clone().into_logger_config()?;

        let gate = self.config.runner.gate();
        println!("✓ Configuration is valid");
        println!("✓ Status endpoint would bind to: {}", self.config.server.address());
        if gate.is_bounded() {
            println!("✓ Job pool size: {}", gate.capacity());
        } else {
            println!("✓ Job pool: unbounded");
        }
        println!("✓ Self-concurrency: {}", gate.self_concurrent());
        match &self.config.runner.heartbeat {
            Some(spec) => println!("✓ Heartbeat job: {}", spec),
            None => println!("✓ Heartbeat job: disabled"),
        }

        println!("Dry run completed successfully");
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
