// Error taxonomy for the attendance engine
// Every failure surfaces to the caller with a stable kind and a
// human-readable message; nothing is swallowed and nothing is retried.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A required field is missing or empty
    #[error("{0}")]
    Validation(String),

    /// Unknown student registration number
    #[error("{0}")]
    NotFound(String),

    /// Role or enrollment does not permit the operation
    #[error("{0}")]
    Forbidden(String),

    /// A record with the same (reg_no, subject, date) key already exists.
    /// This is a terminal outcome: retrying the same check-in cannot succeed.
    #[error("{0}")]
    Conflict(String),

    /// Storage or other unexpected failure
    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable kind, independent of the message text
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::NotFound(_) => "not_found",
            Error::Forbidden(_) => "forbidden",
            Error::Conflict(_) => "conflict",
            Error::Internal(_) => "internal",
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Internal(format!("storage error: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Internal(format!("serialization error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
