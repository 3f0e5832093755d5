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

//! Facts, themes and the in-memory fact store.

pub mod component;
pub mod error;
pub mod fact;
pub mod language;
pub mod store;
pub mod theme;
pub mod tsv;
pub mod vocab;

pub use error::{Error, Result};
pub use fact::Fact;
pub use language::LanguageOrder;
pub use store::FactStore;
pub use theme::{Theme, ThemeFamily, ThemeGroup, ThemeRegistry, ThemeState};
pub use tsv::{Completion, FactReader, FactWriter, ThemeHeader, read_header};
