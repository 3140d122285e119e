//! SQLite file behind device-local storage.
//!
//! # Responsibility
//! - Open the storage file and bring its schema up to date.
//!
//! # Invariants
//! - The schema version lives in `PRAGMA user_version`.
//! - Callers only ever see fully migrated connections.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or querying the storage file.
#[derive(Debug)]
pub enum DbError {
    /// The file could not be opened or created.
    Open(rusqlite::Error),
    /// A statement failed on an open connection.
    Statement(rusqlite::Error),
    /// The file was written by a newer build of the app.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open(err) => write!(f, "cannot open local storage file: {err}"),
            Self::Statement(err) => write!(f, "local storage query failed: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "local storage was written by a newer app (schema {found}, this build reads up to {supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open(err) | Self::Statement(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Statement(value)
    }
}
