use std::path::PathBuf;

use thiserror::Error;

use crate::report::RunReport;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Problems that make the requested themes unproducible. Raised before any
/// extraction starts.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Theme {theme} is produced by both {first} and {second}")]
    DuplicateOutput {
        theme: String,
        first: String,
        second: String,
    },

    #[error("Unit {0} is declared twice")]
    DuplicateUnit(String),

    #[error("Unit {unit} needs theme {theme}, which no unit produces and no earlier run left behind")]
    MissingInput { unit: String, theme: String },

    #[error("No unit produces requested theme {0}")]
    UnknownTarget(String),

    #[error("Dependency cycle between themes: {}", themes.join(", "))]
    Cycle { themes: Vec<String> },

    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Malformed unit call {call:?}: {reason}")]
    MalformedCall { call: String, reason: String },

    #[error("Unit {0} needs a data file argument")]
    MissingDataFile(String),

    #[error("Data file {} of unit {unit} does not exist", path.display())]
    DataFileNotFound { unit: String, path: PathBuf },

    #[error("Unit {unit} has no source file for language {language}")]
    MissingSource { unit: String, language: String },

    #[error("Theme error: {0}")]
    Theme(#[from] kbforge_core::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Units failed: {}", .0.failed_names().join(", "))]
    UnitsFailed(Box<RunReport>),
}

impl PipelineError {
    /// The run report, when units ran and some of them failed.
    #[must_use]
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            Self::UnitsFailed(report) => Some(report),
            _ => None,
        }
    }
}
