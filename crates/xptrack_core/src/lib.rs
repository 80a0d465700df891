//! Core domain logic for the XP tracker.
//! This crate is the single source of truth for task ordering, leveling and
//! ledger invariants.

pub mod catalog;
pub mod config;
pub mod db;
pub mod history;
pub mod ledger;
pub mod leveling;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use catalog::{CatalogError, TaskCatalog};
pub use config::{ConfigError, LoggingConfig, TrackerConfig};
pub use history::{group_by_day, DaySummary, HistoryError, HistoryIndex};
pub use ledger::{DateRange, LedgerError, XpLedger};
pub use leveling::{apply_xp, progress, LevelPolicy, LevelProgress, LevelingRules};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::completion::{CompletionId, CompletionRecord};
pub use model::profile::{Profile, ProfileId};
pub use model::task::{TaskDefinition, TaskId, TaskPatch, TaskValidationError, MAX_XP_VALUE};
pub use repo::completion_repo::{
    CompletionRepository, CompletionSlot, SqliteCompletionRepository,
};
pub use repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use service::tracker_service::{TrackerError, TrackerResult, TrackerService, XpChange};

/// Service wired to the SQLite store on one connection.
pub type SqliteTrackerService<'conn> = TrackerService<
    SqliteTaskRepository<'conn>,
    SqliteCompletionRepository<'conn>,
    SqliteProfileRepository<'conn>,
>;

/// Opens the SQLite-backed service on an already migrated connection.
pub fn open_sqlite_service<'conn>(
    conn: &'conn rusqlite::Connection,
    rules: LevelingRules,
) -> TrackerResult<SqliteTrackerService<'conn>> {
    TrackerService::load(
        SqliteTaskRepository::try_new(conn)?,
        SqliteCompletionRepository::try_new(conn)?,
        SqliteProfileRepository::try_new(conn)?,
        rules,
        None,
    )
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
