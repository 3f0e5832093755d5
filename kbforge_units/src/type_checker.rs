//! Drops literals that do not look like their datatype.

use std::sync::OnceLock;

use kbforge_core::component::literal_parts;
use kbforge_core::{Fact, Theme};
use kbforge_parsers::ParserKind;
use kbforge_pipeline::{ExtractionContext, Extractor};
use regex::Regex;
use tracing::{debug, info};

use crate::themes;

#[expect(clippy::expect_used, reason = "Static regex pattern validated at compile time")]
fn date_form() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^-?[0-9#]{4}-[0-9#]{2}-[0-9#]{2}$").expect("Invalid date form regex")
    })
}

#[expect(clippy::expect_used, reason = "Static regex pattern validated at compile time")]
fn number_form() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("Invalid number form regex"))
}

/// Whether an object token is well-formed. References and untyped literals
/// always pass.
#[must_use]
pub fn is_well_typed(object: &str) -> bool {
    let Some(parts) = literal_parts(object) else {
        return true;
    };
    let Some(datatype) = parts.datatype else {
        return true;
    };
    match ParserKind::for_datatype(datatype) {
        ParserKind::Date => date_form().is_match(&parts.value),
        ParserKind::Number => number_form().is_match(&parts.value),
        _ => true,
    }
}

/// Follow-up of the attribute extractor for one language.
#[derive(Debug, Clone)]
pub struct LiteralTypeChecker {
    language: String,
}

impl LiteralTypeChecker {
    #[must_use]
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
        }
    }
}

impl Extractor for LiteralTypeChecker {
    fn name(&self) -> String {
        format!("LiteralTypeChecker({})", self.language)
    }

    fn input(&self) -> Vec<Theme> {
        vec![themes::attribute_facts().in_language(&self.language)]
    }

    fn output(&self) -> Vec<Theme> {
        vec![themes::checked_attribute_facts().in_language(&self.language)]
    }

    fn extract(&self, context: &ExtractionContext<'_>) -> anyhow::Result<()> {
        let input = themes::attribute_facts().in_language(&self.language);
        let output = themes::checked_attribute_facts().in_language(&self.language);
        let (mut kept, mut dropped) = (0_usize, 0_usize);
        for fact in context.reader(input.name())? {
            let fact: Fact = fact?;
            if is_well_typed(fact.object()) {
                context.write(output.name(), &fact)?;
                kept += 1;
            } else {
                debug!("Ill-typed: {}", fact.to_tsv_line());
                dropped += 1;
            }
        }
        info!("Kept {kept} facts, dropped {dropped} ill-typed literals");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dates() {
        assert!(is_well_typed("\"1935-01-08\"^^xsd:date"));
        assert!(is_well_typed("\"1935-##-##\"^^xsd:date"));
        assert!(is_well_typed("\"-0044-03-15\"^^xsd:date"));
        assert!(!is_well_typed("\"January 1935\"^^xsd:date"));
    }

    #[test]
    fn test_numbers() {
        assert!(is_well_typed("\"42\"^^xsd:decimal"));
        assert!(is_well_typed("\"-3.5\"^^<m>"));
        assert!(!is_well_typed("\"3,5\"^^<m>"));
        assert!(!is_well_typed("\"many\"^^</km2>"));
    }

    #[test]
    fn test_others_pass() {
        assert!(is_well_typed("<Elvis_Presley>"));
        assert!(is_well_typed("\"Elvis\"@en"));
        assert!(is_well_typed("\"anything\"^^<yagoURL>"));
    }
}
