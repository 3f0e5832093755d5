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

//! Theme dependency graph and the scheduler that materializes themes.
//!
//! Units declare the themes they read and write. Asking the [`Pipeline`]
//! for a theme runs the units producing it and, transitively, everything
//! those units need that is not already available, in dependency order.

pub mod catalog;
pub mod context;
pub mod error;
pub mod extractor;
pub mod graph;
pub mod multilingual;
pub mod report;
pub mod scheduler;

pub use catalog::{Capabilities, UnitCall, UnitCatalog, UnitShape};
pub use context::ExtractionContext;
pub use error::{ConfigurationError, PipelineError, Result};
pub use extractor::Extractor;
pub use graph::{Plan, Task, UnitGraph};
pub use multilingual::{dominant_facts, merge_family};
pub use report::{RunReport, SkippedUnit, UnitFailure, UnitRun, UnitState};
pub use scheduler::{Pipeline, PipelineConfig};
