use std::collections::HashMap;
use std::sync::Arc;

use kbforge_core::FactStore;
use tracing::debug;

use super::TermParser;
use crate::stem::stem;

/// Maps class-name phrases to classes through a preferred-meanings
/// dictionary. Does not use result markers.
#[derive(Debug, Clone)]
pub struct ClassParser {
    meanings: Arc<HashMap<String, String>>,
}

impl ClassParser {
    #[must_use]
    pub fn new(meanings: HashMap<String, String>) -> Self {
        Self {
            meanings: Arc::new(meanings),
        }
    }

    /// Uses the `<isPreferredMeaningOf>` facts of a store.
    #[must_use]
    pub fn from_store(store: &FactStore) -> Self {
        Self::new(store.preferred_meanings().clone())
    }

    /// Looks a single phrase up verbatim, stemmed, lower-cased, then
    /// lower-cased and stemmed. The first hit wins.
    #[must_use]
    pub fn resolve(&self, phrase: &str) -> Option<&str> {
        let lower = phrase.to_lowercase();
        self.meanings
            .get(phrase)
            .or_else(|| self.meanings.get(&stem(phrase)))
            .or_else(|| self.meanings.get(&lower))
            .or_else(|| self.meanings.get(&stem(&lower)))
            .map(String::as_str)
    }
}

impl TermParser for ClassParser {
    fn name(&self) -> &'static str {
        "class"
    }

    fn extract_list(&self, input: &str) -> Vec<String> {
        let classes: Vec<String> = input
            .split([',', '\n'])
            .map(|phrase| phrase.trim().replace(['[', ']'], ""))
            .filter(|phrase| phrase.chars().count() >= 4)
            .filter_map(|phrase| self.resolve(&phrase).map(str::to_string))
            .collect();
        if classes.is_empty() {
            debug!("Could not find class in {input:?}");
        }
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> ClassParser {
        ClassParser::new(HashMap::from([
            ("dog".to_string(), "<wordnet_dog>".to_string()),
            ("singer".to_string(), "<wordnet_singer>".to_string()),
            ("Rock band".to_string(), "<wordnet_band>".to_string()),
        ]))
    }

    #[test]
    fn test_case_and_plural_insensitive() {
        let parser = parser();
        assert_eq!(parser.resolve("Dogs"), Some("<wordnet_dog>"));
        assert_eq!(parser.resolve("dog"), Some("<wordnet_dog>"));
        assert_eq!(parser.resolve("cats"), None);

        // Whole inputs still drop phrases below four characters.
        assert_eq!(parser.extract_list("Dogs"), vec!["<wordnet_dog>"]);
        assert_eq!(parser.extract_list("dog"), Vec::<String>::new());
        assert_eq!(parser.extract_list("DOGS"), vec!["<wordnet_dog>"]);
        assert_eq!(parser.extract_list("[[Singers]]"), vec!["<wordnet_singer>"]);
    }

    #[test]
    fn test_short_phrases_are_skipped() {
        // "dog" has three characters and is below the minimum length.
        let parser = ClassParser::new(HashMap::from([
            ("dog".to_string(), "<wordnet_dog>".to_string()),
            ("cat".to_string(), "<wordnet_cat>".to_string()),
        ]));
        assert!(parser.extract_list("dog, cat").is_empty());
    }

    #[test]
    fn test_lists_keep_order_and_duplicates() {
        assert_eq!(
            parser().extract_list("singers, Rock band\ndogs, Singer, unknown thing"),
            vec![
                "<wordnet_singer>",
                "<wordnet_band>",
                "<wordnet_dog>",
                "<wordnet_singer>"
            ]
        );
    }
}
