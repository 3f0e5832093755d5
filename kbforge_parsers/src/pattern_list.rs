//! Ordered rewrite rules.
//!
//! Each rule is a regular expression and a replacement template. Rules are
//! applied one after the other, every rule to the output of the previous one,
//! and a rule that does not match leaves the text unchanged. Parsers use the
//! rules to turn free text into `_result_<value>_<unit>_` markers.

use std::borrow::Cow;
use std::iter;
use std::ops::Range;

use kbforge_core::component::{is_literal, strip_quotes};
use kbforge_core::vocab::MAPS_TO;
use kbforge_core::{Fact, FactStore, ThemeRegistry};
use regex::Regex;
use tracing::{debug, trace, warn};

/// A template equal to this marker rejects the whole input once it appears in
/// the rewritten text.
pub const NIL: &str = "NIL";

#[derive(Debug, Clone)]
pub struct PatternRule {
    source: String,
    pattern: Regex,
    replacement: String,
}

impl PatternRule {
    /// Compiles a rule written in the source rule syntax (`$1` group
    /// references, possessive quantifiers).
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            source: pattern.to_string(),
            pattern: Regex::new(&translate_pattern(pattern))?,
            replacement: translate_template(replacement),
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub const fn regex(&self) -> &Regex {
        &self.pattern
    }

    #[must_use]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.replacement == NIL
    }
}

/// Rewritten text plus, for every output byte, the byte range of the input it
/// came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traced {
    pub text: String,
    pub spans: Vec<Range<usize>>,
}

impl Traced {
    /// Input range covering the output bytes in `output`.
    #[must_use]
    pub fn source_of(&self, output: Range<usize>) -> Option<Range<usize>> {
        let spans = self.spans.get(output)?;
        let start = spans.iter().map(|s| s.start).min()?;
        let end = spans.iter().map(|s| s.end).max()?;
        Some(start..end)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatternList {
    rules: Vec<PatternRule>,
}

impl PatternList {
    #[must_use]
    pub const fn new(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// Builds a list from `(pattern, replacement)` pairs. Fails on the first
    /// rule that does not compile.
    pub fn from_rules<'a, I>(rules: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| PatternRule::new(pattern, replacement))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Builds a list from `(pattern, relation, replacement)` facts in the
    /// order given. Rules that do not compile are skipped with a warning.
    pub fn from_facts<'a, I>(facts: I, relation: &str) -> Self
    where
        I: IntoIterator<Item = &'a Fact>,
    {
        debug!("Loading patterns of {relation}");
        let mut rules = Vec::new();
        for fact in facts {
            if fact.relation() != relation {
                continue;
            }
            let pattern = unquote(fact.subject());
            let replacement = unquote(fact.object());
            match PatternRule::new(&pattern, &replacement) {
                Ok(rule) => rules.push(rule),
                Err(e) => warn!("Skipping pattern {pattern:?}: {e}"),
            }
        }
        if rules.is_empty() {
            warn!("No patterns found for {relation}");
        }
        Self { rules }
    }

    /// Builds a list from the `<mapsTo>` facts of a store.
    #[must_use]
    pub fn from_store(store: &FactStore) -> Self {
        Self::from_facts(store.facts_with_relation(MAPS_TO), MAPS_TO)
    }

    /// Builds a list from a theme. The theme must be available for reading.
    pub fn from_theme(registry: &ThemeRegistry, theme: &str) -> kbforge_core::Result<Self> {
        let store = registry.fact_store(theme)?;
        Ok(Self::from_store(&store))
    }

    #[must_use]
    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Applies every rule in order. Returns `None` if a `NIL` rule rejected
    /// the input.
    #[must_use]
    pub fn transform(&self, input: &str) -> Option<String> {
        let mut current = input.to_string();
        for rule in &self.rules {
            let next = match rule.pattern.replace_all(&current, rule.replacement.as_str()) {
                Cow::Borrowed(_) => None,
                Cow::Owned(next) => Some(next),
            };
            if let Some(next) = next {
                trace!("{} --> {next}", rule.source);
                current = next;
            }
            if rule.is_nil() && current.contains(NIL) {
                return None;
            }
        }
        Some(current)
    }

    /// Like [`PatternList::transform`], also tracking which input bytes every
    /// output byte derives from. Text produced by a replacement maps to the
    /// whole span its match covered; an empty match maps to an empty span at
    /// its position.
    #[must_use]
    pub fn transform_with_provenance(&self, input: &str) -> Option<Traced> {
        let mut text = input.to_string();
        let mut spans: Vec<Range<usize>> = (0..input.len()).map(|i| i..i + 1).collect();

        for rule in &self.rules {
            let mut out = String::with_capacity(text.len());
            let mut out_spans = Vec::with_capacity(spans.len());
            let mut last = 0;
            let mut matched = false;

            for caps in rule.pattern.captures_iter(&text) {
                let Some(m) = caps.get(0) else {
                    continue;
                };
                matched = true;
                out.push_str(&text[last..m.start()]);
                out_spans.extend_from_slice(&spans[last..m.start()]);

                let covered = &spans[m.start()..m.end()];
                let source = match (
                    covered.iter().map(|s| s.start).min(),
                    covered.iter().map(|s| s.end).max(),
                ) {
                    (Some(start), Some(end)) => start..end,
                    _ => {
                        let at = spans.get(m.start()).map_or(input.len(), |s| s.start);
                        at..at
                    }
                };

                let before = out.len();
                caps.expand(&rule.replacement, &mut out);
                out_spans.extend(iter::repeat_n(source, out.len() - before));
                last = m.end();
            }

            if matched {
                out.push_str(&text[last..]);
                out_spans.extend_from_slice(&spans[last..]);
                trace!("{} --> {out}", rule.source);
                text = out;
                spans = out_spans;
            }
            if rule.is_nil() && text.contains(NIL) {
                return None;
            }
        }
        Some(Traced { text, spans })
    }
}

fn unquote(token: &str) -> String {
    if is_literal(token) {
        strip_quotes(token)
    } else {
        token.to_string()
    }
}

/// Rewrites a rule pattern for the `regex` engine. Possessive quantifiers
/// (`a++`, `a*+`, `a?+`, `a{2}+`) become greedy ones.
#[must_use]
pub fn translate_pattern(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    let mut in_class = false;
    let mut in_counted = false;
    while let Some(c) = chars.next() {
        out.push(c);
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
                continue;
            }
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '{' if !in_class => in_counted = true,
            _ => {}
        }
        let quantifier = !in_class && (matches!(c, '+' | '*' | '?') || (c == '}' && in_counted));
        if c == '}' {
            in_counted = false;
        }
        if quantifier && chars.peek() == Some(&'+') {
            chars.next();
        }
    }
    out
}

/// Rewrites a replacement template: `$1` becomes `${1}`, `\$` a literal
/// dollar and `\x` the character `x`.
#[must_use]
pub fn translate_template(template: &str) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('$') | None => out.push_str("$$"),
                Some(other) => out.push(other),
            },
            '$' => {
                let mut group = String::new();
                if chars.peek() == Some(&'{') {
                    chars.next();
                    for c in chars.by_ref() {
                        if c == '}' {
                            break;
                        }
                        group.push(c);
                    }
                } else {
                    while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                        group.push(d);
                        chars.next();
                    }
                }
                if group.is_empty() {
                    out.push_str("$$");
                } else {
                    out.push_str("${");
                    out.push_str(&group);
                    out.push('}');
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbforge_core::component::for_string;

    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn list(rules: &[(&str, &str)]) -> PatternList {
        PatternList::from_rules(rules.iter().copied()).expect("valid rules")
    }

    #[test]
    fn test_rules_apply_in_sequence() {
        let patterns = list(&[("(\\d+) km", "_result_$1_<km>_"), ("<km>", "</km>")]);
        assert_eq!(
            patterns.transform("about 12 km").as_deref(),
            Some("about _result_12_</km>_")
        );
    }

    #[test]
    fn test_no_match_passes_through() {
        let patterns = list(&[("zzz", "y")]);
        assert_eq!(patterns.transform("abc").as_deref(), Some("abc"));
    }

    #[test]
    fn test_idempotent_without_matches() {
        let patterns = list(&[("(\\d+)", "_result_$1__"), ("[A-Z]+", "")]);
        let clean = "abc def";
        let once = patterns.transform(clean).unwrap_or_default();
        let twice = patterns.transform(&once).unwrap_or_default();
        assert_eq!(once, clean);
        assert_eq!(twice, once);
    }

    #[test]
    fn test_nil_rule_rejects_input() {
        let patterns = list(&[("circa", "NIL"), ("(\\d+)", "_result_$1__")]);
        assert_eq!(patterns.transform("circa 1900"), None);
        assert!(patterns.transform("1900").is_some());
    }

    #[test]
    fn test_translation() {
        assert_eq!(translate_pattern("a++b*+c?+d{2}+"), "a+b*c?d{2}");
        assert_eq!(translate_pattern("\\++"), "\\++");
        assert_eq!(translate_pattern("[+*]+"), "[+*]+");
        assert_eq!(translate_pattern("[^_]++"), "[^_]+");
        assert_eq!(translate_template("_result_$1_$2_"), "_result_${1}_${2}_");
        assert_eq!(translate_template("\\$5"), "$$5");
        assert_eq!(translate_template("${year}"), "${year}");
    }

    #[test]
    fn test_lenient_loading_skips_broken_rules() {
        let facts = [
            Fact::new(for_string("(\\d+)"), MAPS_TO, for_string("_result_$1__")),
            Fact::new(for_string("(?<=x)y"), MAPS_TO, for_string("z")),
            Fact::new(for_string("a"), "<other>", for_string("b")),
        ];
        let patterns = PatternList::from_facts(facts.iter(), MAPS_TO);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns.rules()[0].source(), "(\\d+)");
    }

    #[test]
    fn test_provenance() {
        // a123b: the digits collapse into one marker that maps back to 1..4.
        let patterns = list(&[("(\\d+)", "_result_$1__")]);
        let traced = patterns.transform_with_provenance("a123b").unwrap_or_else(|| Traced {
            text: String::new(),
            spans: Vec::new(),
        });
        assert_eq!(traced.text, "a_result_123__b");
        assert_eq!(traced.spans.len(), traced.text.len());
        assert_eq!(traced.spans[0], 0..1);
        assert_eq!(traced.spans[1], 1..4);
        assert_eq!(traced.spans[traced.text.len() - 2], 1..4);
        assert_eq!(traced.spans[traced.text.len() - 1], 4..5);
        assert_eq!(traced.source_of(1..14), Some(1..4));
    }

    #[test]
    fn test_provenance_chains_rules() {
        let patterns = list(&[("b", "bb"), ("bb", "X")]);
        let traced = patterns.transform_with_provenance("abc").unwrap_or_else(|| Traced {
            text: String::new(),
            spans: Vec::new(),
        });
        assert_eq!(traced.text, "aXc");
        assert_eq!(traced.spans, vec![0..1, 1..2, 2..3]);
    }
}
