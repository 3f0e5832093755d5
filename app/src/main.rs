#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod command;

use command::{
    CommandStrategy, InfoStrategy, InitStrategy, PlanInput, PlanStrategy, RunInput, RunStrategy,
    VersionStrategy,
};

#[derive(Parser)]
#[command(name = "kbforge")]
#[command(about = "Builds knowledge-base themes from raw sources", long_about = None)]
struct Cli {
    /// Config file, defaults to ~/kbforge/config.json
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log state transitions and parse misses
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce themes and everything they depend on
    Run {
        /// Theme to produce, repeatable. Defaults to the configured targets
        #[arg(short, long = "target")]
        targets: Vec<String>,

        /// Theme to produce again even if it exists, repeatable
        #[arg(short, long)]
        regenerate: Vec<String>,
    },
    /// Show which units would run, without running them
    Plan {
        #[arg(short, long = "target")]
        targets: Vec<String>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Initialize configuration
    Init,
    /// Show the configuration and the units it names
    Info,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run {
            targets,
            regenerate,
        } => {
            RunStrategy
                .execute(RunInput {
                    config: cli.config,
                    targets,
                    regenerate,
                })
                .await
        }
        Commands::Plan { targets, json } => {
            PlanStrategy
                .execute(PlanInput {
                    config: cli.config,
                    targets,
                    json,
                })
                .await
        }
        Commands::Init => InitStrategy.execute(cli.config).await,
        Commands::Info => InfoStrategy.execute(cli.config).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
