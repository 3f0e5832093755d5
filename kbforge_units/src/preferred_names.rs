//! One preferred name per entity, chosen across languages.

use std::collections::HashSet;
use std::sync::Arc;

use kbforge_core::vocab::{RDFS_LABEL, SKOS_PREF_LABEL};
use kbforge_core::{Fact, LanguageOrder, Theme};
use kbforge_pipeline::{ExtractionContext, Extractor, merge_family};
use tracing::info;

use crate::themes;

/// Consolidates every `labels_<lang>` theme into `preferredNames`. An
/// entity's name comes from the most dominant language labelling it, and
/// within that language from its first label.
#[derive(Debug, Clone)]
pub struct PreferredNameExtractor {
    languages: LanguageOrder,
}

impl PreferredNameExtractor {
    #[must_use]
    pub const fn new(languages: LanguageOrder) -> Self {
        Self { languages }
    }

    #[must_use]
    pub fn shared(languages: &LanguageOrder) -> Arc<dyn Extractor> {
        Arc::new(Self::new(languages.clone()))
    }
}

impl Extractor for PreferredNameExtractor {
    fn name(&self) -> String {
        "PreferredNameExtractor".to_string()
    }

    fn input(&self) -> Vec<Theme> {
        themes::labels().in_languages(&self.languages)
    }

    fn output(&self) -> Vec<Theme> {
        vec![themes::preferred_names()]
    }

    fn extract(&self, context: &ExtractionContext<'_>) -> anyhow::Result<()> {
        let output = themes::preferred_names();
        let merged = merge_family(context, &themes::labels())?;
        let mut named: HashSet<&str> = HashSet::new();
        for fact in merged.facts_with_relation(RDFS_LABEL) {
            if named.insert(fact.subject()) {
                context.write(
                    output.name(),
                    &Fact::new(fact.subject(), SKOS_PREF_LABEL, fact.object()),
                )?;
            }
        }
        info!("Chose preferred names for {} entities", named.len());
        Ok(())
    }
}
