//! Typed parsers turning raw attribute text into canonical tokens.
//!
//! None of the parsers fail: text that cannot be interpreted contributes no
//! token, and an empty result is a normal outcome.

use std::collections::HashMap;
use std::fmt;

use kbforge_core::component::is_english;
use kbforge_core::ThemeRegistry;

use crate::pattern_list::PatternList;
use crate::themes::{
    DATE_PATTERNS, NUMBER_PATTERNS, PREFERRED_MEANINGS, STRING_PATTERNS,
};

pub mod class;
pub mod date;
pub mod literal;
pub mod number;
pub mod string;
pub mod url;
pub mod wikilink;

pub use class::ClassParser;
pub use date::DateParser;
pub use literal::{LiteralParser, ResultInterpreter, result_pattern};
pub use number::{NumberParser, parse_numerical, render_number};
pub use string::StringParser;
pub use url::UrlParser;
pub use wikilink::WikiLinkParser;

pub trait TermParser: Send + Sync {
    fn name(&self) -> &'static str;

    /// Every token found in `input`, in order of appearance.
    fn extract_list(&self, input: &str) -> Vec<String>;
}

/// Which parser handles values of a target datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserKind {
    Date,
    Number,
    String,
    Url,
    WikiLink,
    Class,
}

impl ParserKind {
    #[must_use]
    pub fn for_datatype(datatype: &str) -> Self {
        match datatype {
            "xsd:date" => Self::Date,
            "xsd:string" | "<yagoLanString>" | "<yagoTLD>" | "<yagoISBN>" | "<yagoIdentifier>" => {
                Self::String
            }
            "<yagoURL>" => Self::Url,
            "xsd:decimal" | "<degrees>" | "<m2>" | "<yagoMonetaryValue>" | "<percent>"
            | "</km2>" | "xsd:integer" | "xsd:duration" | "<g>" | "<m>" | "<s>"
            | "<yago0to100>" | "xsd:nonNegativeInteger" | "<yagoFraction>" => Self::Number,
            "rdfs:Class" | "rdfs:class" => Self::Class,
            _ => Self::WikiLink,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Number => "number",
            Self::String => "string",
            Self::Url => "url",
            Self::WikiLink => "wikilink",
            Self::Class => "class",
        }
    }
}

impl fmt::Display for ParserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule lists of the three pattern-driven parsers.
#[derive(Debug, Clone, Default)]
pub struct LiteralPatterns {
    pub date: PatternList,
    pub number: PatternList,
    pub string: PatternList,
}

impl LiteralPatterns {
    /// Loads the three rule themes. They must be available for reading.
    pub fn from_registry(registry: &ThemeRegistry) -> kbforge_core::Result<Self> {
        Ok(Self {
            date: PatternList::from_theme(registry, DATE_PATTERNS)?,
            number: PatternList::from_theme(registry, NUMBER_PATTERNS)?,
            string: PatternList::from_theme(registry, STRING_PATTERNS)?,
        })
    }
}

/// All parsers for one language. The class parser exists for English only.
pub struct ParserSet {
    class: Option<ClassParser>,
    wikilink: WikiLinkParser,
    number: NumberParser,
    string: StringParser,
    date: DateParser,
    url: UrlParser,
}

impl ParserSet {
    #[must_use]
    pub fn new(
        patterns: LiteralPatterns,
        preferred_meanings: HashMap<String, String>,
        language: &str,
    ) -> Self {
        Self {
            class: is_english(language).then(|| ClassParser::new(preferred_meanings)),
            wikilink: WikiLinkParser::new(language),
            number: NumberParser::new(patterns.number),
            string: StringParser::new(patterns.string),
            date: DateParser::new(patterns.date),
            url: UrlParser,
        }
    }

    /// Builds the set from the rule themes and the preferred-meanings theme.
    pub fn from_registry(registry: &ThemeRegistry, language: &str) -> kbforge_core::Result<Self> {
        let patterns = LiteralPatterns::from_registry(registry)?;
        let meanings = if is_english(language) {
            registry.fact_store(PREFERRED_MEANINGS)?.preferred_meanings().clone()
        } else {
            HashMap::new()
        };
        Ok(Self::new(patterns, meanings, language))
    }

    #[must_use]
    pub fn get(&self, kind: ParserKind) -> Option<&dyn TermParser> {
        match kind {
            ParserKind::Class => self.class.as_ref().map(|p| p as &dyn TermParser),
            ParserKind::WikiLink => Some(&self.wikilink),
            ParserKind::Number => Some(&self.number),
            ParserKind::String => Some(&self.string),
            ParserKind::Date => Some(&self.date),
            ParserKind::Url => Some(&self.url),
        }
    }

    /// Every available parser, class parser first.
    #[must_use]
    pub fn all(&self) -> Vec<&dyn TermParser> {
        let mut all: Vec<&dyn TermParser> = Vec::with_capacity(6);
        if let Some(class) = &self.class {
            all.push(class);
        }
        all.push(&self.wikilink);
        all.push(&self.number);
        all.push(&self.string);
        all.push(&self.date);
        all.push(&self.url);
        all
    }

    /// Parses `raw` with the parser for `datatype`.
    #[must_use]
    pub fn extract(&self, datatype: &str, raw: &str) -> Vec<String> {
        self.get(ParserKind::for_datatype(datatype))
            .map(|parser| parser.extract_list(raw))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datatype_mapping() {
        assert_eq!(ParserKind::for_datatype("xsd:date"), ParserKind::Date);
        assert_eq!(ParserKind::for_datatype("<m>"), ParserKind::Number);
        assert_eq!(ParserKind::for_datatype("</km2>"), ParserKind::Number);
        assert_eq!(ParserKind::for_datatype("<yagoISBN>"), ParserKind::String);
        assert_eq!(ParserKind::for_datatype("<yagoURL>"), ParserKind::Url);
        assert_eq!(ParserKind::for_datatype("rdfs:Class"), ParserKind::Class);
        assert_eq!(ParserKind::for_datatype("<wordnet_person>"), ParserKind::WikiLink);
    }

    #[test]
    fn test_class_parser_only_for_english() {
        let meanings = HashMap::from([("dog".to_string(), "<wordnet_dog>".to_string())]);
        let english = ParserSet::new(LiteralPatterns::default(), meanings.clone(), "en");
        let german = ParserSet::new(LiteralPatterns::default(), meanings, "de");
        assert_eq!(english.all().len(), 6);
        assert_eq!(english.all()[0].name(), "class");
        assert_eq!(german.all().len(), 5);
        assert!(german.get(ParserKind::Class).is_none());
        assert!(german.extract("rdfs:Class", "Dogs").is_empty());
        assert_eq!(english.extract("rdfs:Class", "Dogs"), vec!["<wordnet_dog>"]);
    }
}
