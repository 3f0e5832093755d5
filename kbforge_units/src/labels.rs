//! Entity labels, one theme per language.

use std::path::PathBuf;
use std::sync::Arc;

use kbforge_core::component::{for_entity, for_string_with_language};
use kbforge_core::vocab::RDFS_LABEL;
use kbforge_core::{Fact, Theme};
use kbforge_pipeline::{ExtractionContext, Extractor};
use tracing::info;

use crate::source::for_each_record;
use crate::themes;

/// Reads `entity<TAB>label` lines of one language's source into
/// `labels_<lang>`. Entities are named canonically, so the same entity has
/// the same subject in every language.
#[derive(Debug, Clone)]
pub struct LabelExtractor {
    language: String,
    source: PathBuf,
}

impl LabelExtractor {
    #[must_use]
    pub fn new(language: &str, source: PathBuf) -> Self {
        Self {
            language: language.to_string(),
            source,
        }
    }

    #[must_use]
    pub fn shared(language: &str, source: PathBuf) -> Arc<dyn Extractor> {
        Arc::new(Self::new(language, source))
    }

    fn theme(&self) -> Theme {
        themes::labels().in_language(&self.language)
    }
}

impl Extractor for LabelExtractor {
    fn name(&self) -> String {
        format!("LabelExtractor({})", self.language)
    }

    fn input(&self) -> Vec<Theme> {
        Vec::new()
    }

    fn output(&self) -> Vec<Theme> {
        vec![self.theme()]
    }

    fn extract(&self, context: &ExtractionContext<'_>) -> anyhow::Result<()> {
        let theme = self.theme();
        let count = for_each_record(&self.source, 2, |_, record| {
            let (entity, label) = (record[0].trim(), record[1].trim());
            if entity.is_empty() || label.is_empty() {
                return Ok(());
            }
            context.write(
                theme.name(),
                &Fact::new(
                    for_entity(entity),
                    RDFS_LABEL,
                    for_string_with_language(label, &self.language),
                ),
            )?;
            Ok(())
        })?;
        info!("Read {count} labels from {}", self.source.display());
        Ok(())
    }
}
