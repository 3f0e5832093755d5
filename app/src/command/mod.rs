//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input, dispatched
//! statically from `main`.

use chrono::Local;
use kbforge_config::Config;
use kbforge_pipeline::Pipeline;
use kbforge_units::builtin_catalog;
use tracing::info;
use uuid::Uuid;

mod info;
mod init;
mod plan;
mod run;
mod version;

pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use plan::{PlanInput, PlanStrategy};
pub use run::{RunInput, RunStrategy};
pub use version::VersionStrategy;

/// Contract shared by all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// `run <uuid> at <timestamp>`, written into every theme header.
fn run_header() -> String {
    format!("run {} at {}", Uuid::now_v7(), Local::now().to_rfc3339())
}

/// Instantiates the configured units and sets up the scheduler. Blocking.
fn build_pipeline(config: &Config, run_header: &str) -> anyhow::Result<Pipeline> {
    let languages = config.language_order()?;
    let units = builtin_catalog().instantiate_all(
        config.units.as_slice(),
        &languages,
        &config.source_map(),
    )?;
    info!("Instantiated {} units for {languages}", units.len());
    Ok(Pipeline::new(config.pipeline_config(run_header)?, units)?)
}

/// Requested targets, else the configured ones, else every output.
fn resolve_targets(requested: Vec<String>, config: &Config, pipeline: &Pipeline) -> Vec<String> {
    if !requested.is_empty() {
        requested
    } else if !config.targets.is_empty() {
        config.targets.clone()
    } else {
        pipeline.graph().outputs()
    }
}
