use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Theme {0} is not available for reading")]
    NotReadable(String),

    #[error("Theme {0} is not open for writing")]
    NotWritable(String),

    #[error("Theme {0} is already open for writing")]
    AlreadyWriting(String),

    #[error("Theme {name} was already written in this run to {}", path.display())]
    AlreadyWritten { name: String, path: PathBuf },

    #[error("Theme {name} has no file in {}", folder.display())]
    NotFound { name: String, folder: PathBuf },

    #[error("Malformed record at {}:{line}: {reason}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Unit {unit} did not declare theme {theme}")]
    UndeclaredAccess { unit: String, theme: String },

    #[error("Invalid language code: {0:?}")]
    InvalidLanguage(String),

    #[error("Language {0} appears twice in the language order")]
    DuplicateLanguage(String),

    #[error("Language order is empty")]
    EmptyLanguageOrder,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
