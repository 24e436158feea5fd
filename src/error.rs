//! Error types for tablemerge

use serde::Serialize;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], reported alongside the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NoInput,
    Format,
    Parse,
    MissingKeyColumn,
    UnsupportedExtension,
    InvalidConfig,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::NoInput => "no_input",
            ErrorKind::Format => "format",
            ErrorKind::Parse => "parse",
            ErrorKind::MissingKeyColumn => "missing_key_column",
            ErrorKind::UnsupportedExtension => "unsupported_extension",
            ErrorKind::InvalidConfig => "invalid_config",
            ErrorKind::Io => "io",
        };
        f.write_str(s)
    }
}

/// Errors that can occur while loading, merging or writing tables
#[derive(Debug, Error)]
pub enum Error {
    /// No tables were supplied to a merge
    #[error("no input tables supplied")]
    NoInput,

    /// The file is readable but has the wrong shape
    #[error("format error in '{name}': {message}")]
    Format { name: String, message: String },

    /// The file cannot be decoded in the declared format
    #[error("failed to parse '{name}': {message}")]
    Parse { name: String, message: String },

    /// A join or dedup key column is absent
    #[error("key column '{column}' not found in '{table}'")]
    MissingKeyColumn { column: String, table: String },

    /// The file type is not one of the supported set
    #[error("unsupported file format '{extension}' for '{name}'")]
    UnsupportedExtension { name: String, extension: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoInput => ErrorKind::NoInput,
            Error::Format { .. } => ErrorKind::Format,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::MissingKeyColumn { .. } => ErrorKind::MissingKeyColumn,
            Error::UnsupportedExtension { .. } => ErrorKind::UnsupportedExtension,
            Error::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn format(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Format {
            name: name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn parse(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Parse {
            name: name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn missing_key(column: impl Into<String>, table: impl Into<String>) -> Self {
        Error::MissingKeyColumn {
            column: column.into(),
            table: table.into(),
        }
    }
}
