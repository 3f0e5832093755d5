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

//! Built-in extraction units.
//!
//! They read plain tab-separated sources, so a pipeline can be run end to
//! end without any external dump.

pub mod attributes;
pub mod catalog;
pub mod labels;
pub mod pattern_hard;
pub mod preferred_names;
pub mod source;
pub mod themes;
pub mod type_checker;

pub use attributes::AttributeExtractor;
pub use catalog::builtin_catalog;
pub use labels::LabelExtractor;
pub use pattern_hard::PatternHardExtractor;
pub use preferred_names::PreferredNameExtractor;
pub use type_checker::{LiteralTypeChecker, is_well_typed};
