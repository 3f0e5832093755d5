//! Typed facts from raw attribute values.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use kbforge_core::component::{for_entity, for_foreign_entity, is_english};
use kbforge_core::{Fact, Theme};
use kbforge_parsers::themes::{
    DATE_PATTERNS, NUMBER_PATTERNS, PREFERRED_MEANINGS, STRING_PATTERNS,
};
use kbforge_parsers::{LiteralPatterns, ParserKind, ParserSet, PatternList};
use kbforge_pipeline::{ExtractionContext, Extractor};
use tracing::{debug, info};

use crate::source::for_each_record;
use crate::themes;
use crate::type_checker::LiteralTypeChecker;

/// Reads `title<TAB>attribute<TAB>datatype<TAB>raw value` lines of one
/// language's source. Each raw value goes through the parser chosen by the
/// datatype and every token found becomes a fact, with its extraction source
/// and technique in `attributeSources_<lang>`.
#[derive(Debug, Clone)]
pub struct AttributeExtractor {
    language: String,
    source: PathBuf,
}

impl AttributeExtractor {
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

    fn parsers(&self, context: &ExtractionContext<'_>) -> kbforge_core::Result<ParserSet> {
        let patterns = LiteralPatterns {
            date: PatternList::from_store(&*context.store(DATE_PATTERNS)?),
            number: PatternList::from_store(&*context.store(NUMBER_PATTERNS)?),
            string: PatternList::from_store(&*context.store(STRING_PATTERNS)?),
        };
        let meanings = if is_english(&self.language) {
            context.store(PREFERRED_MEANINGS)?.preferred_meanings().clone()
        } else {
            HashMap::new()
        };
        Ok(ParserSet::new(patterns, meanings, &self.language))
    }

    fn subject(&self, title: &str) -> String {
        for_foreign_entity(title, &self.language)
    }

    fn page(&self, title: &str) -> String {
        format!(
            "https://{}.wikipedia.org/wiki/{}",
            self.language,
            title.trim().replace(' ', "_")
        )
    }
}

/// Relation names without brackets or prefix become references.
fn relation(attribute: &str) -> String {
    let attribute = attribute.trim();
    if attribute.starts_with('<') || attribute.contains(':') {
        attribute.to_string()
    } else {
        for_entity(attribute)
    }
}

impl Extractor for AttributeExtractor {
    fn name(&self) -> String {
        format!("AttributeExtractor({})", self.language)
    }

    fn input(&self) -> Vec<Theme> {
        Vec::new()
    }

    fn input_cached(&self) -> Vec<Theme> {
        kbforge_parsers::themes::all()
    }

    fn output(&self) -> Vec<Theme> {
        vec![
            themes::attribute_facts().in_language(&self.language),
            themes::attribute_sources().in_language(&self.language),
        ]
    }

    fn follow_up(&self) -> Vec<Arc<dyn Extractor>> {
        vec![Arc::new(LiteralTypeChecker::new(&self.language))]
    }

    fn extract(&self, context: &ExtractionContext<'_>) -> anyhow::Result<()> {
        let parsers = self.parsers(context)?;
        let facts_theme = themes::attribute_facts().in_language(&self.language);
        let sources_theme = themes::attribute_sources().in_language(&self.language);
        let mut written = 0;
        let mut misses = 0;

        let records = for_each_record(&self.source, 4, |line, record| {
            let (title, attribute, datatype) = (record[0], record[1], record[2].trim());
            let raw = record[3].replace("\\n", "\n");
            let kind = ParserKind::for_datatype(datatype);
            let tokens = parsers.extract(datatype, &raw);
            if tokens.is_empty() {
                debug!("Line {line}: no {kind} value in {raw:?}");
                misses += 1;
                return Ok(());
            }
            let subject = self.subject(title);
            let relation = relation(attribute);
            let source = self.page(title);
            let technique = format!("AttributeExtractor/{kind}");
            for token in tokens {
                context.write_with_provenance(
                    &Fact::new(subject.clone(), relation.clone(), token),
                    facts_theme.name(),
                    sources_theme.name(),
                    &source,
                    &technique,
                )?;
                written += 1;
            }
            Ok(())
        })?;
        info!(
            "Parsed {records} attribute values into {written} facts, {misses} without a value"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_names() {
        assert_eq!(relation("wasBornOnDate"), "<wasBornOnDate>");
        assert_eq!(relation("<hasLength>"), "<hasLength>");
        assert_eq!(relation("rdf:type"), "rdf:type");
    }

    #[test]
    fn test_subject_depends_on_language() {
        let english = AttributeExtractor::new("en", PathBuf::from("unused"));
        let german = AttributeExtractor::new("de", PathBuf::from("unused"));
        assert_eq!(english.subject("Elvis Presley"), "<Elvis_Presley>");
        assert_eq!(german.subject("München"), "<de/München>");
        assert_eq!(
            german.page("Elvis Presley"),
            "https://de.wikipedia.org/wiki/Elvis_Presley"
        );
    }
}
