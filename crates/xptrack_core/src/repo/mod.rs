//! Store boundary: repository contracts and their SQLite implementations.
//!
//! # Responsibility
//! - Define the row-store and XP-adjustment capabilities the tracker needs.
//! - Keep SQL details out of the service and domain layers.
//!
//! # Invariants
//! - Write paths validate input before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.
//! - Repositories only accept connections migrated to `latest_version()`.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::task::TaskValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod completion_repo;
pub mod profile_repo;
pub mod task_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level failure for any repository call.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Validation(TaskValidationError),
    NotFound { entity: &'static str, id: Uuid },
    /// No profile row exists at all.
    MissingProfile,
    /// Bulk reorder did not list every stored task exactly once.
    IncompleteOrder { expected: usize, actual: usize },
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::MissingProfile => write!(f, "no profile row found"),
            Self::IncompleteOrder { expected, actual } => write!(
                f,
                "reorder must list all {expected} tasks exactly once, got {actual}"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "tracker repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<TaskValidationError> for RepoError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}
