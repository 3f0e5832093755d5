use std::path::PathBuf;

use kbforge_config::Config;
use kbforge_pipeline::{PipelineError, RunReport};
use tracing::{error, info};

/// Input parameters for the Run command strategy.
#[derive(Debug, Clone)]
pub struct RunInput {
    pub config: Option<PathBuf>,
    pub targets: Vec<String>,
    pub regenerate: Vec<String>,
}

/// Strategy for producing themes.
///
/// The scheduler is synchronous and runs on a blocking task; units of one
/// wave share its worker pool.
#[derive(Debug, Clone, Copy)]
pub struct RunStrategy;

impl super::CommandStrategy for RunStrategy {
    type Input = RunInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load(input.config.as_deref())?;
        let header = super::run_header();
        info!("Starting {header}");

        let outcome = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let pipeline = super::build_pipeline(&config, &header)?;
            let targets = if input.targets.is_empty() && !input.regenerate.is_empty() {
                Vec::new()
            } else {
                super::resolve_targets(input.targets, &config, &pipeline)
            };
            Ok(pipeline.execute(&targets, &input.regenerate))
        })
        .await??;

        match outcome {
            Ok(report) => {
                print_report(&report);
                Ok(())
            }
            Err(PipelineError::UnitsFailed(report)) => {
                print_report(&report);
                for failure in &report.failed {
                    error!("{failure}");
                }
                anyhow::bail!("{} units failed", report.failed.len())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn print_report(report: &RunReport) {
    print!("{report}");
}
