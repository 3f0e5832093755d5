//! What a running unit sees of the pipeline.

use std::collections::HashSet;
use std::sync::Arc;

use kbforge_core::component::{for_string, for_uri};
use kbforge_core::vocab::{EXTRACTION_SOURCE, EXTRACTION_TECHNIQUE};
use kbforge_core::{Error, Fact, FactReader, FactStore, LanguageOrder, Result, ThemeRegistry};

/// Access to the declared inputs and outputs of one unit execution.
///
/// Reads of undeclared inputs and writes to undeclared outputs fail with
/// [`Error::UndeclaredAccess`].
pub struct ExtractionContext<'a> {
    unit: String,
    registry: &'a ThemeRegistry,
    languages: &'a LanguageOrder,
    inputs: HashSet<String>,
    outputs: HashSet<String>,
}

impl<'a> ExtractionContext<'a> {
    pub fn new<I, O>(
        unit: impl Into<String>,
        registry: &'a ThemeRegistry,
        languages: &'a LanguageOrder,
        inputs: I,
        outputs: O,
    ) -> Self
    where
        I: IntoIterator<Item = String>,
        O: IntoIterator<Item = String>,
    {
        Self {
            unit: unit.into(),
            registry,
            languages,
            inputs: inputs.into_iter().collect(),
            outputs: outputs.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Configured languages, most dominant first.
    #[must_use]
    pub const fn languages(&self) -> &LanguageOrder {
        self.languages
    }

    fn check(&self, declared: &HashSet<String>, theme: &str) -> Result<()> {
        if declared.contains(theme) {
            Ok(())
        } else {
            Err(Error::UndeclaredAccess {
                unit: self.unit.clone(),
                theme: theme.to_string(),
            })
        }
    }

    /// Streams a declared input.
    pub fn reader(&self, theme: &str) -> Result<FactReader> {
        self.check(&self.inputs, theme)?;
        self.registry.reader(theme)
    }

    /// A declared input as a frozen store shared with other units.
    pub fn store(&self, theme: &str) -> Result<Arc<FactStore>> {
        self.check(&self.inputs, theme)?;
        self.registry.fact_store(theme)
    }

    /// Translation dictionary of a declared input.
    pub fn dictionary(&self, theme: &str) -> Result<std::collections::HashMap<String, String>> {
        self.check(&self.inputs, theme)?;
        self.registry.dictionary(theme)
    }

    pub fn write(&self, theme: &str, fact: &Fact) -> Result<()> {
        self.check(&self.outputs, theme)?;
        self.registry.write(theme, fact)
    }

    /// Writes `fact` to `fact_theme` and its extraction source and technique
    /// to `meta_theme`, both linked to the fact's id.
    pub fn write_with_provenance(
        &self,
        fact: &Fact,
        fact_theme: &str,
        meta_theme: &str,
        source: &str,
        technique: &str,
    ) -> Result<()> {
        self.check(&self.outputs, meta_theme)?;
        let fact = if fact.explicit_id().is_some() {
            fact.clone()
        } else {
            fact.clone().with_id(fact.id())
        };
        self.write(fact_theme, &fact)?;
        self.registry
            .write(meta_theme, &fact.meta_fact(EXTRACTION_SOURCE, for_uri(source)))?;
        self.registry.write(
            meta_theme,
            &fact.meta_fact(EXTRACTION_TECHNIQUE, for_string(technique)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbforge_core::{Completion, Theme};

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_undeclared_access_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let registry = ThemeRegistry::new();
        registry.register(&Theme::new("facts", ""));
        registry.register(&Theme::new("other", ""));
        registry
            .open_for_writing("facts", dir.path(), "")
            .expect("open");
        registry
            .open_for_writing("other", dir.path(), "")
            .expect("open");

        let languages = LanguageOrder::default();
        let context = ExtractionContext::new(
            "Writer",
            &registry,
            &languages,
            Vec::new(),
            vec!["facts".to_string()],
        );
        let fact = Fact::new("<A>", "<r>", "<B>");
        context.write("facts", &fact).expect("declared output");
        assert!(matches!(
            context.write("other", &fact),
            Err(Error::UndeclaredAccess { .. })
        ));
        assert!(matches!(
            context.reader("facts"),
            Err(Error::UndeclaredAccess { .. })
        ));
        registry.close("facts", &Completion::Complete).expect("close");
        registry.close("other", &Completion::Complete).expect("close");
    }

    #[test]
    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn test_write_with_provenance_links_meta_facts() {
        let dir = tempfile::tempdir().expect("temp dir");
        let registry = ThemeRegistry::new();
        registry.register(&Theme::new("facts", ""));
        registry.register(&Theme::new("sources", ""));
        registry
            .open_for_writing("facts", dir.path(), "")
            .expect("open");
        registry
            .open_for_writing("sources", dir.path(), "")
            .expect("open");

        let languages = LanguageOrder::default();
        let context = ExtractionContext::new(
            "Writer",
            &registry,
            &languages,
            Vec::new(),
            vec!["facts".to_string(), "sources".to_string()],
        );
        let fact = Fact::new("<Elvis>", "<livesIn>", "<Memphis>");
        context
            .write_with_provenance(&fact, "facts", "sources", "http://example.org/Elvis", "infobox")
            .expect("write");
        registry.close("facts", &Completion::Complete).expect("close");
        registry.close("sources", &Completion::Complete).expect("close");

        let facts = registry.fact_store("facts").expect("facts");
        let sources = registry.fact_store("sources").expect("sources");
        let written = facts.iter().next().expect("one fact");
        assert_eq!(written.explicit_id(), Some(fact.id().as_str()));
        assert_eq!(
            sources.object(&fact.id(), EXTRACTION_TECHNIQUE),
            Some("\"infobox\"")
        );
        assert_eq!(sources.len(), 2);
    }
}
