use kbforge_core::component::for_string;

use super::literal::{LiteralParser, ResultInterpreter};

#[derive(Debug, Clone, Copy, Default)]
pub struct StringResult;

impl ResultInterpreter for StringResult {
    const NAME: &'static str = "string";

    fn interpret(&self, value: &str, _unit: &str) -> Option<String> {
        Some(for_string(value))
    }
}

pub type StringParser = LiteralParser<StringResult>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::TermParser;
    use crate::pattern_list::PatternList;

    #[test]
    fn test_marker_value_is_quoted_verbatim() {
        let parser = StringParser::new(
            PatternList::from_rules([(r"'''([^']+)'''", "_result_$1__")]).unwrap_or_default(),
        );
        assert_eq!(
            parser.extract_list("'''The King''' and '''Elvis'''"),
            vec!["\"The King\"".to_string(), "\"Elvis\"".to_string()]
        );
    }
}
