use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::debug;

use super::TermParser;
use crate::pattern_list::PatternList;

static RESULT_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Matches `_result_<value>_<unit>_` markers left by the pattern list.
#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
pub fn result_pattern() -> &'static Regex {
    RESULT_PATTERN.get_or_init(|| {
        Regex::new(r"_result_([^_]+)_([^_]*)_")
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Turns the value and unit captured by one marker into a canonical token.
pub trait ResultInterpreter: Send + Sync {
    const NAME: &'static str;

    /// Returns `None` when the captured text is not a value of this type.
    fn interpret(&self, value: &str, unit: &str) -> Option<String>;
}

/// A parser driven by a pattern list: rewrite, then interpret every marker.
#[derive(Debug, Clone)]
pub struct LiteralParser<I> {
    patterns: PatternList,
    interpreter: I,
}

impl<I: ResultInterpreter + Default> LiteralParser<I> {
    #[must_use]
    pub fn new(patterns: PatternList) -> Self {
        Self {
            patterns,
            interpreter: I::default(),
        }
    }
}

impl<I: ResultInterpreter> LiteralParser<I> {
    #[must_use]
    pub const fn patterns(&self) -> &PatternList {
        &self.patterns
    }

    fn interpret(&self, marker: &Captures<'_>) -> Option<String> {
        let value = marker.get(1)?.as_str();
        let unit = marker.get(2).map_or("", |m| m.as_str());
        self.interpreter.interpret(value, unit)
    }
}

impl<I: ResultInterpreter> TermParser for LiteralParser<I> {
    fn name(&self) -> &'static str {
        I::NAME
    }

    fn extract_list(&self, input: &str) -> Vec<String> {
        let Some(rewritten) = self.patterns.transform(input) else {
            debug!("{} rejected {input:?}", I::NAME);
            return Vec::new();
        };
        let results: Vec<String> = result_pattern()
            .captures_iter(&rewritten)
            .filter_map(|marker| self.interpret(&marker))
            .collect();
        if results.is_empty() {
            debug!("Could not find {} in {input:?}", I::NAME);
        }
        results
    }
}
