#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Rewrite rules and literal parsers.

pub mod parsers;
pub mod pattern_list;
pub mod stem;
pub mod themes;

pub use parsers::{
    ClassParser, DateParser, LiteralPatterns, NumberParser, ParserKind, ParserSet, StringParser,
    TermParser, UrlParser, WikiLinkParser,
};
pub use pattern_list::{NIL, PatternList, PatternRule, Traced};
pub use stem::stem;
