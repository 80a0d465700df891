//! Tracker store on SQLite.
//!
//! One database file holds three tables: `tasks` (the catalog with its
//! `order_index` ranks), `completions` (the XP ledger, ordered by
//! `occurred_on` then `seq`) and `profiles` (level and XP, seeded with one
//! row). `open_db` hands out a connection only after `migrations` brought
//! the file to the schema this binary understands.
//!
//! # Invariants
//! - `PRAGMA user_version` equals the last applied migration.
//! - A file written by a newer binary is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file's `user_version` is ahead of the known migrations.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "tracker store: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "tracker store uses schema v{found}; this xptrack only knows up to v{supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
