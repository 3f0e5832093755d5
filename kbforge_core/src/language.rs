use std::fmt;

use crate::error::{Error, Result};

/// The configured languages, most dominant first.
///
/// Position matters: when two languages assert conflicting values for the
/// same entity, the one listed earlier wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageOrder {
    codes: Vec<String>,
}

impl LanguageOrder {
    pub fn new<I, S>(codes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut validated: Vec<String> = Vec::new();
        for code in codes {
            let code = code.into();
            let valid = (2..=3).contains(&code.len()) && code.chars().all(|c| c.is_ascii_lowercase());
            if !valid {
                return Err(Error::InvalidLanguage(code));
            }
            if validated.contains(&code) {
                return Err(Error::DuplicateLanguage(code));
            }
            validated.push(code);
        }
        if validated.is_empty() {
            return Err(Error::EmptyLanguageOrder);
        }
        Ok(Self { codes: validated })
    }

    /// English only.
    #[must_use]
    pub fn english() -> Self {
        Self {
            codes: vec!["en".to_string()],
        }
    }

    #[must_use]
    pub fn dominant(&self) -> &str {
        &self.codes[0]
    }

    /// Every language after the dominant one, in order.
    #[must_use]
    pub fn others(&self) -> &[String] {
        &self.codes[1..]
    }

    #[must_use]
    pub fn position(&self, language: &str) -> Option<usize> {
        self.codes.iter().position(|c| c == language)
    }

    #[must_use]
    pub fn contains(&self, language: &str) -> bool {
        self.position(language).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.codes.iter().map(String::as_str)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.codes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for LanguageOrder {
    fn default() -> Self {
        Self::english()
    }
}

impl fmt::Display for LanguageOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.codes.join(","))
    }
}
