use std::path::PathBuf;

use kbforge_config::Config;

/// Input parameters for the Plan command strategy.
#[derive(Debug, Clone)]
pub struct PlanInput {
    pub config: Option<PathBuf>,
    pub targets: Vec<String>,
    pub json: bool,
}

/// Strategy for a dry run: resolves dependencies, detects cycles and
/// prints the execution waves without opening any theme.
#[derive(Debug, Clone, Copy)]
pub struct PlanStrategy;

impl super::CommandStrategy for PlanStrategy {
    type Input = PlanInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load(input.config.as_deref())?;

        let plan = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let pipeline = super::build_pipeline(&config, "")?;
            let targets = super::resolve_targets(input.targets, &config, &pipeline);
            Ok(pipeline.plan(&targets, &[])?)
        })
        .await??;

        if input.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            print!("{plan}");
        }
        Ok(())
    }
}
