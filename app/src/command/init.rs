use std::path::PathBuf;

use kbforge_config::Config;

/// Strategy for initializing the configuration.
///
/// Creates the template at the given path, or at `~/kbforge/config.json`.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        Config::create_config(input.as_deref())?;
        Ok(())
    }
}
