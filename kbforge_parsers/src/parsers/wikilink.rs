use std::sync::OnceLock;

use kbforge_core::component::{for_foreign_entity, strip_quotes};
use regex::Regex;
use tracing::debug;

use super::TermParser;

static LINK: OnceLock<Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn link_pattern() -> &'static Regex {
    LINK.get_or_init(|| {
        Regex::new(r"\[\[([^|\]]+)(?:\|([^\]]+))?\]\]")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Extracts `[[target|label]]` links as entities of one language.
#[derive(Debug, Clone)]
pub struct WikiLinkParser {
    language: String,
}

impl WikiLinkParser {
    #[must_use]
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    fn accept(input: &str, target: &str, end: usize) -> Option<String> {
        if target.contains(':') || target.contains('#') || target.contains(" and ") {
            return None;
        }
        // [[Swedish]] [[singer]]: the first link is an adjective.
        if input[end..].starts_with(" [[") {
            return None;
        }
        // Years attached to a statement.
        if target.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let target = target.trim();
        let target = target.strip_prefix('[').unwrap_or(target);
        if target.is_empty() {
            return None;
        }
        Some(target.to_string())
    }

    /// Lines that are a plain phrase of letters and blanks count as links
    /// when the input has no bracketed link at all.
    fn fallback(&self, input: &str) -> Vec<String> {
        input
            .split('\n')
            .map(|line| strip_quotes(line.trim()))
            .filter(|line| {
                line.contains(' ') && line.chars().all(|c| c == ' ' || c.is_alphabetic())
            })
            .map(|line| {
                debug!("Finding suboptimal wikilink {line:?} in {input:?}");
                for_foreign_entity(&line, &self.language)
            })
            .collect()
    }
}

impl TermParser for WikiLinkParser {
    fn name(&self) -> &'static str {
        "wikilink"
    }

    fn extract_list(&self, input: &str) -> Vec<String> {
        let mut links: Vec<String> = link_pattern()
            .captures_iter(input)
            .filter_map(|caps| {
                let end = caps.get(0)?.end();
                Self::accept(input, caps.get(1)?.as_str(), end)
            })
            .map(|target| for_foreign_entity(&target, &self.language))
            .collect();

        if links.is_empty() {
            links = self.fallback(input);
        }
        if links.is_empty() {
            debug!("Could not find wikilink in {input:?}");
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_and_labels() {
        let parser = WikiLinkParser::new("en");
        assert_eq!(
            parser.extract_list("born in [[Tupelo, Mississippi|Tupelo]] and [[Memphis]]"),
            vec!["<Tupelo,_Mississippi>", "<Memphis>"]
        );
    }

    #[test]
    fn test_rejected_targets() {
        let parser = WikiLinkParser::new("en");
        assert!(parser.extract_list("[[1999]]").is_empty());
        assert!(parser.extract_list("[[Category:Singers]]").is_empty());
        assert!(parser.extract_list("[[History#Early]]").is_empty());
        assert!(parser.extract_list("[[Rock and roll]]").is_empty());
        assert_eq!(
            parser.extract_list("[[American]] [[singer]]"),
            vec!["<singer>"]
        );
    }

    #[test]
    fn test_numeric_span_rejected_next_to_valid_link() {
        let parser = WikiLinkParser::new("en");
        assert_eq!(
            parser.extract_list("married in [[1967]] to [[Priscilla Presley]]"),
            vec!["<Priscilla_Presley>"]
        );
    }

    #[test]
    fn test_foreign_language_and_stray_bracket() {
        let parser = WikiLinkParser::new("de");
        assert_eq!(parser.extract_list("[[[Berlin]]"), vec!["<de/Berlin>"]);
        assert!(parser.extract_list("[[ ]]").is_empty());
    }

    #[test]
    fn test_fallback_on_plain_lines() {
        let parser = WikiLinkParser::new("en");
        assert_eq!(
            parser.extract_list("Elvis Presley\n42\nMemphis\n\"Priscilla Presley\""),
            vec!["<Elvis_Presley>", "<Priscilla_Presley>"]
        );
        assert!(parser.extract_list("12 34").is_empty());
    }
}
