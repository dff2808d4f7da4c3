use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    // Statement text
    Parse,
    UnsupportedQuery,

    // Schema
    AlreadyExists,
    NotFound,
    NoPrimaryKey,

    // Validation
    UnknownColumn,
    MissingRequiredColumn,
    MissingPrimaryKeyValue,
    DuplicateKey,
    DuplicateValue,
    ColumnCountMismatch,
    TypeMismatch,

    // Runtime predicate evaluation
    Evaluation,

    // Backing file
    Io,
    Serialization,
    Locked,
}

/// Coarse grouping of error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Schema,
    Validation,
    Evaluation,
    Storage,
}

impl ErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::Parse | ErrorKind::UnsupportedQuery => ErrorCategory::Parse,
            ErrorKind::AlreadyExists | ErrorKind::NotFound | ErrorKind::NoPrimaryKey => {
                ErrorCategory::Schema
            }
            ErrorKind::UnknownColumn
            | ErrorKind::MissingRequiredColumn
            | ErrorKind::MissingPrimaryKeyValue
            | ErrorKind::DuplicateKey
            | ErrorKind::DuplicateValue
            | ErrorKind::ColumnCountMismatch
            | ErrorKind::TypeMismatch => ErrorCategory::Validation,
            ErrorKind::Evaluation => ErrorCategory::Evaluation,
            ErrorKind::Io | ErrorKind::Serialization | ErrorKind::Locked => ErrorCategory::Storage,
        }
    }
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error { kind, context: context.into() }
    }

    pub fn parse(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::Parse, context)
    }

    pub fn table_not_found(table: &str) -> Self {
        Error::new(ErrorKind::NotFound, format!("Table '{}' does not exist", table))
    }

    /// Human-readable message without the kind prefix
    pub fn message(&self) -> &str {
        &self.context
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Serialization,
            context: err.to_string(),
        }
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error {
            kind: ErrorKind::Io,
            context: format!("Failed to replace data file: {}", err.error),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
