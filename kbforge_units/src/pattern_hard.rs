//! Copies the hard-wired rule and dictionary themes into the run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use kbforge_core::{FactReader, Theme};
use kbforge_pipeline::{ExtractionContext, Extractor};
use tracing::info;

/// Reads `_dateParser`, `_numberParser`, `_stringParser` and
/// `_preferredMeanings` from a folder of theme files maintained by hand.
#[derive(Debug, Clone)]
pub struct PatternHardExtractor {
    folder: PathBuf,
}

impl PatternHardExtractor {
    #[must_use]
    pub const fn new(folder: PathBuf) -> Self {
        Self { folder }
    }

    #[must_use]
    pub fn shared(folder: PathBuf) -> Arc<dyn Extractor> {
        Arc::new(Self::new(folder))
    }
}

impl Extractor for PatternHardExtractor {
    fn name(&self) -> String {
        "PatternHardExtractor".to_string()
    }

    fn input(&self) -> Vec<Theme> {
        Vec::new()
    }

    fn output(&self) -> Vec<Theme> {
        kbforge_parsers::themes::all()
    }

    fn extract(&self, context: &ExtractionContext<'_>) -> anyhow::Result<()> {
        for theme in self.output() {
            let path = theme.file_in(&self.folder);
            let reader = FactReader::open(&path)
                .with_context(|| format!("no hard-wired file for {}", theme.name()))?;
            let mut copied = 0;
            for fact in reader {
                context.write(theme.name(), &fact?)?;
                copied += 1;
            }
            info!("Copied {copied} facts into {}", theme.name());
        }
        Ok(())
    }
}
