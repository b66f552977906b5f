//! Error types for the SQLite facade.

use thiserror::Error;

/// Errors returned by [`Database`](crate::Database) and the schema helpers.
#[derive(Debug, Error)]
pub enum Error {
    /// The engine rejected a statement. Passed through untouched.
    #[error(transparent)]
    Engine(#[from] rusqlite::Error),

    /// `create_table` found a table with the requested name.
    #[error("table {0} already exists")]
    TableExists(String),

    /// An identifier could not be quoted (empty or containing NUL).
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// The database has been closed, or its connection thread is gone.
    #[error("database connection is closed")]
    Closed,

    /// A job panicked on the connection thread. The connection stays usable.
    #[error("database job panicked: {0}")]
    JobPanicked(String),

    /// A `DEFAULT` literal that SQLite cannot represent (NaN or infinity).
    #[error("invalid default value: {0}")]
    InvalidDefault(String),

    /// Any other failure reported by the connection thread.
    #[error("database connection error: {0}")]
    Worker(String),
}

impl From<tokio_rusqlite::Error> for Error {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::ConnectionClosed => Error::Closed,
            tokio_rusqlite::Error::Close((_, err)) => Error::Engine(err),
            tokio_rusqlite::Error::Rusqlite(err) => Error::Engine(err),
            other => Error::Worker(other.to_string()),
        }
    }
}

impl Error {
    /// Returns the underlying engine error, if this is one.
    pub fn as_engine(&self) -> Option<&rusqlite::Error> {
        match self {
            Error::Engine(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
