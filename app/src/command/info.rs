use std::path::{Path, PathBuf};

use kbforge_config::Config;
use kbforge_core::{Theme, read_header};
use kbforge_pipeline::UnitGraph;
use kbforge_units::builtin_catalog;

/// Strategy for displaying configuration information: pipeline settings,
/// languages and their sources, the unit catalog, and the themes the
/// configured units produce with their state on disk.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load(input.as_deref())?;

        println!("=== kbforge Configuration ===\n");

        println!("Pipeline:");
        println!("  Output Folder: {}", config.pipeline.output_folder.display());
        if let Some(cache) = &config.pipeline.cache_folder {
            println!("  Cache Folder: {}", cache.display());
        }
        println!("  Threads: {}", config.pipeline.threads);
        println!("  Reuse: {}", config.pipeline.reuse);
        println!("  Header: {}", config.pipeline.header);
        println!();

        let languages = config.language_order()?;
        println!("Languages: {languages}");
        for (language, path) in &config.sources {
            println!("  {language}: {} ({})", path.display(), presence(path));
        }
        println!();

        let catalog = builtin_catalog();
        println!("Available Units:");
        for (name, shape) in catalog.entries() {
            println!("  {name} ({})", shape.as_str());
        }
        println!();

        println!("Configured Units:");
        for call in &config.units {
            println!("  {call}");
        }
        println!();

        let units =
            match catalog.instantiate_all(config.units.as_slice(), &languages, &config.source_map())
            {
                Ok(units) => units,
                Err(e) => {
                    println!("Themes: unavailable, {e}");
                    return Ok(());
                }
            };
        let graph = match UnitGraph::new(units) {
            Ok(graph) => graph,
            Err(e) => {
                println!("Themes: unavailable, {e}");
                return Ok(());
            }
        };
        println!("Themes:");
        for theme in graph.themes() {
            let producer = graph.producer_of(theme.name()).unwrap_or("(external)");
            println!(
                "  {:<28} {:<10} {:<32} {}",
                theme.name(),
                theme.group().as_str(),
                producer,
                theme_state(theme, &config.pipeline.output_folder)
            );
        }

        Ok(())
    }
}

fn presence(path: &Path) -> &'static str {
    if path.exists() { "found" } else { "missing" }
}

fn theme_state(theme: &Theme, folder: &Path) -> &'static str {
    let path = theme.file_in(folder);
    if !path.exists() {
        return "not produced";
    }
    match read_header(&path) {
        Ok(header) if header.complete => "complete",
        Ok(_) => "incomplete",
        Err(_) => "unreadable",
    }
}
