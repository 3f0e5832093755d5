use std::str::FromStr;

use bigdecimal::BigDecimal;
use kbforge_core::component::{for_number, for_string_with_datatype};
use tracing::warn;

use super::literal::{LiteralParser, ResultInterpreter};

/// Evaluates a numeric expression with `+` and `*`.
///
/// Blanks are ignored. The expression is split before every operator and the
/// segments are applied strictly left to right, so `2*3+1` is 7 and `1+2*3`
/// is 9. Precision is unbounded. Returns `None` if any segment is not a
/// decimal number.
#[must_use]
pub fn parse_numerical(expression: &str) -> Option<BigDecimal> {
    let expression: String = expression.chars().filter(|c| *c != ' ').collect();

    let mut segments = Vec::new();
    let mut start = 0;
    for (i, c) in expression.char_indices() {
        if i > 0 && matches!(c, '+' | '*') {
            segments.push(&expression[start..i]);
            start = i;
        }
    }
    segments.push(&expression[start..]);

    let (first, rest) = segments.split_first()?;
    let mut result = parse_decimal(first)?;
    for segment in rest {
        let (operator, operand) = segment.split_at(1);
        let operand = parse_decimal(operand)?;
        result = match operator {
            "*" => result * operand,
            "+" => result + operand,
            _ => return None,
        };
    }
    Some(result)
}

fn parse_decimal(text: &str) -> Option<BigDecimal> {
    if text.is_empty() {
        return None;
    }
    BigDecimal::from_str(text).ok()
}

/// Plain digits while the scale stays below 100, engineering notation beyond.
#[must_use]
pub fn render_number(number: &BigDecimal) -> String {
    let (_, scale) = number.as_bigint_and_exponent();
    if scale.unsigned_abs() < 100 {
        number.to_plain_string()
    } else {
        number.to_engineering_notation()
    }
}

/// Interprets the marker value as a numeric expression and attaches the
/// marker unit as datatype, `xsd:decimal` when there is none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberResult;

impl ResultInterpreter for NumberResult {
    const NAME: &'static str = "number";

    fn interpret(&self, value: &str, unit: &str) -> Option<String> {
        let Some(number) = parse_numerical(value) else {
            warn!("Cannot parse the numerical value {value:?}");
            return None;
        };
        let rendered = render_number(&number);
        let unit = unit.trim();
        Some(if unit.is_empty() {
            for_number(&rendered)
        } else {
            for_string_with_datatype(&rendered, unit)
        })
    }
}

pub type NumberParser = LiteralParser<NumberResult>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::TermParser;
    use crate::pattern_list::PatternList;

    fn value(expression: &str) -> Option<String> {
        parse_numerical(expression).map(|number| render_number(&number))
    }

    #[test]
    fn test_left_to_right_evaluation() {
        assert_eq!(value("2*3+1").as_deref(), Some("7"));
        assert_eq!(value("1+2*3").as_deref(), Some("9"));
        assert_eq!(value("2 * 3 + 1").as_deref(), Some("7"));
        assert_eq!(value("1.5*2").as_deref(), Some("3.0"));
    }

    #[test]
    fn test_plain_and_scientific_numbers() {
        assert_eq!(value("42").as_deref(), Some("42"));
        assert_eq!(value("-3.25").as_deref(), Some("-3.25"));
        assert_eq!(parse_numerical("+42"), Some(BigDecimal::from(42)));
        assert_eq!(value("1.5e3").as_deref(), Some("1500"));
    }

    #[test]
    fn test_values_beyond_machine_precision() {
        assert_eq!(
            value("1.989e30").as_deref(),
            Some("1989000000000000000000000000000")
        );
        assert_eq!(
            value("1.6e-35").as_deref(),
            Some("0.000000000000000000000000000000000016")
        );
        assert_eq!(
            value("100000000000000000000000000000").as_deref(),
            Some("100000000000000000000000000000")
        );
        assert_eq!(
            value("123456789012345678901234567890*10").as_deref(),
            Some("1234567890123456789012345678900")
        );
        assert_eq!(
            NumberResult.interpret("1.989e30", "<kg>").as_deref(),
            Some("\"1989000000000000000000000000000\"^^<kg>")
        );
    }

    #[test]
    fn test_huge_scale_uses_engineering_notation() {
        let rendered = value("1e-150").unwrap_or_default();
        assert!(rendered.contains('e') || rendered.contains('E'), "{rendered}");
        assert!(!rendered.starts_with("0.000"));
    }

    #[test]
    fn test_malformed_expressions() {
        assert_eq!(value(""), None);
        assert_eq!(value("abc"), None);
        assert_eq!(value("2*"), None);
        assert_eq!(value("*2"), None);
        assert_eq!(value("2+x"), None);
    }

    #[test]
    fn test_unit_becomes_datatype() {
        let interpreter = NumberResult;
        assert_eq!(
            interpreter.interpret("2*3+1", "").as_deref(),
            Some("\"7\"^^xsd:decimal")
        );
        assert_eq!(
            interpreter.interpret("3", " </km2> ").as_deref(),
            Some("\"3\"^^</km2>")
        );
        assert_eq!(interpreter.interpret("x", "<m>"), None);
    }

    #[test]
    fn test_parser_drops_unparseable_markers() {
        let parser = NumberParser::new(
            PatternList::from_rules([
                (r"(\d+(?:\.\d+)?) ?km", "_result_$1_<km>_"),
                (r"about ([^,\s]+)", "_result_$1__"),
            ])
            .unwrap_or_default(),
        );
        assert_eq!(
            parser.extract_list("12 km, about 3*4, about lots"),
            vec![
                "\"12\"^^<km>".to_string(),
                "\"12\"^^xsd:decimal".to_string(),
            ]
        );
    }
}
