//! Themes the parsers read their rules and dictionaries from.

use kbforge_core::{Theme, ThemeGroup};

pub const DATE_PATTERNS: &str = "_dateParser";
pub const NUMBER_PATTERNS: &str = "_numberParser";
pub const STRING_PATTERNS: &str = "_stringParser";
pub const PREFERRED_MEANINGS: &str = "_preferredMeanings";

#[must_use]
pub fn date_patterns() -> Theme {
    Theme::new(DATE_PATTERNS, "Patterns that find dates in attribute values")
}

#[must_use]
pub fn number_patterns() -> Theme {
    Theme::new(NUMBER_PATTERNS, "Patterns that find numbers and units in attribute values")
}

#[must_use]
pub fn string_patterns() -> Theme {
    Theme::new(STRING_PATTERNS, "Patterns that find strings in attribute values")
}

#[must_use]
pub fn preferred_meanings() -> Theme {
    Theme::new(PREFERRED_MEANINGS, "Preferred class for each class name")
        .with_group(ThemeGroup::Taxonomy)
}

/// Every theme the parser set needs, in the order they are loaded.
#[must_use]
pub fn all() -> Vec<Theme> {
    vec![
        date_patterns(),
        number_patterns(),
        string_patterns(),
        preferred_meanings(),
    ]
}
