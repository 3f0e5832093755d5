use kbforge_core::component::for_date;

use super::literal::{LiteralParser, ResultInterpreter};

/// Wraps the trimmed marker value as an `xsd:date` literal. The value is
/// not checked against the calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateResult;

impl ResultInterpreter for DateResult {
    const NAME: &'static str = "date";

    fn interpret(&self, value: &str, _unit: &str) -> Option<String> {
        Some(for_date(value.trim()))
    }
}

pub type DateParser = LiteralParser<DateResult>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::TermParser;
    use crate::pattern_list::PatternList;

    #[expect(clippy::expect_used, reason = "Test failure should panic with context")]
    fn parser() -> DateParser {
        DateParser::new(
            PatternList::from_rules([
                (r"(\d{4})-(\d{2})-(\d{2})", "_result_$1-$2-$3__"),
                (r"\b(\d{4})\b", "_result_$1-##-##__"),
            ])
            .expect("valid rules"),
        )
    }

    #[test]
    fn test_dates_are_extracted_in_order() {
        let dates = parser().extract_list("born 1935-01-08, died 1977");
        assert_eq!(
            dates,
            vec![
                "\"1935-01-08\"^^xsd:date".to_string(),
                "\"1977-##-##\"^^xsd:date".to_string()
            ]
        );
    }

    #[test]
    fn test_malformed_dates_pass_through() {
        let parser = DateParser::new(
            PatternList::from_rules([(r"on (\S+)", "_result_$1__")]).unwrap_or_default(),
        );
        assert_eq!(
            parser.extract_list("on 2001-13-45"),
            vec!["\"2001-13-45\"^^xsd:date".to_string()]
        );
    }

    #[test]
    fn test_no_marker_is_empty() {
        assert!(parser().extract_list("sometime in spring").is_empty());
    }
}
