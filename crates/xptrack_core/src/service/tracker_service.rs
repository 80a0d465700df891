//! Tracker use-case service.
//!
//! # Responsibility
//! - Turn user actions (add/edit/reorder tasks, report, log, delete entries)
//!   into validated store writes.
//! - Keep the in-memory catalog, ledger and profile in sync with the store.
//!
//! # Invariants
//! - Local validation runs before any store call; a rejected input never
//!   reaches the store.
//! - In-memory state changes only after the store confirmed the write, by
//!   refetching and replacing the affected collection.
//! - Every XP change goes through the store-side adjustment
//!   (`increment_xp` / `decrement_xp`), never a client-computed write.
//! - A store failure is logged here and returned as `TrackerError::Remote`;
//!   nothing is retried.
//! - A profile confirmed by the store replaces the in-memory one before any
//!   refetch, so a failed refetch never leaves a stale profile behind.

use crate::catalog::{CatalogError, TaskCatalog};
use crate::history::{DaySummary, HistoryError, HistoryIndex};
use crate::ledger::{DateRange, LedgerError, XpLedger};
use crate::leveling::{progress, LevelProgress, LevelingRules};
use crate::model::completion::{CompletionId, CompletionRecord};
use crate::model::profile::{Profile, ProfileId};
use crate::model::task::{
    normalize_title, validate_xp_value, TaskDefinition, TaskId, TaskPatch, TaskValidationError,
};
use crate::repo::completion_repo::CompletionRepository;
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::{RepoError, RepoResult};
use chrono::NaiveDate;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum TrackerError {
    Validation(TaskValidationError),
    TaskNotFound(TaskId),
    EntryNotFound(CompletionId),
    PositionOutOfRange { position: usize, len: usize },
    InvalidMonth { year: i32, month: u32 },
    /// The store rejected or failed a call.
    Remote(RepoError),
}

impl Display for TrackerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::EntryNotFound(id) => write!(f, "ledger entry not found: {id}"),
            Self::PositionOutOfRange { position, len } => {
                write!(f, "position {position} is out of range for {len} tasks")
            }
            Self::InvalidMonth { year, month } => {
                write!(f, "invalid calendar month {year}-{month:02}")
            }
            Self::Remote(err) => write!(f, "store call failed: {err}"),
        }
    }
}

impl Error for TrackerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for TrackerError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CatalogError> for TrackerError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::Validation(err) => Self::Validation(err),
            CatalogError::NotFound(id) => Self::TaskNotFound(id),
            CatalogError::PositionOutOfRange { position, len } => {
                Self::PositionOutOfRange { position, len }
            }
        }
    }
}

impl From<LedgerError> for TrackerError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::NotFound(id) => Self::EntryNotFound(id),
        }
    }
}

impl From<HistoryError> for TrackerError {
    fn from(value: HistoryError) -> Self {
        match value {
            HistoryError::InvalidMonth { year, month } => Self::InvalidMonth { year, month },
        }
    }
}

impl From<RepoError> for TrackerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity: "task", id } => Self::TaskNotFound(id),
            RepoError::NotFound {
                entity: "ledger entry",
                id,
            } => Self::EntryNotFound(id),
            other => Self::Remote(other),
        }
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Profile state around one ledger change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XpChange {
    pub record: CompletionRecord,
    pub before: Profile,
    pub after: Profile,
}

impl XpChange {
    pub fn levels_gained(&self) -> i64 {
        self.after.level - self.before.level
    }
}

/// Tracker facade over the store repositories and in-memory views.
pub struct TrackerService<T, C, P>
where
    T: TaskRepository,
    C: CompletionRepository,
    P: ProfileRepository,
{
    task_repo: T,
    completion_repo: C,
    profile_repo: P,
    rules: LevelingRules,
    catalog: TaskCatalog,
    ledger: XpLedger,
    profile: Profile,
}

impl<T, C, P> TrackerService<T, C, P>
where
    T: TaskRepository,
    C: CompletionRepository,
    P: ProfileRepository,
{
    /// Loads tasks, ledger and profile from the store.
    ///
    /// `profile_id = None` picks the store's first (seeded) profile.
    pub fn load(
        task_repo: T,
        completion_repo: C,
        profile_repo: P,
        rules: LevelingRules,
        profile_id: Option<ProfileId>,
    ) -> TrackerResult<Self> {
        let profile = match profile_id {
            Some(id) => remote("profile_load", profile_repo.get_profile(id))?
                .ok_or(TrackerError::Remote(RepoError::NotFound {
                    entity: "profile",
                    id,
                }))?,
            None => remote("profile_load", profile_repo.first_profile())?,
        };

        let mut service = Self {
            task_repo,
            completion_repo,
            profile_repo,
            rules,
            catalog: TaskCatalog::new(),
            ledger: XpLedger::new(),
            profile,
        };
        service.refresh()?;
        info!(
            "event=tracker_load module=service status=ok tasks={} entries={} level={}",
            service.catalog.len(),
            service.ledger.entries().len(),
            service.profile.level
        );
        Ok(service)
    }

    /// Refetches every collection and replaces the in-memory copies.
    pub fn refresh(&mut self) -> TrackerResult<()> {
        self.refresh_tasks()?;
        self.refresh_ledger()?;
        self.refresh_profile()
    }

    pub fn rules(&self) -> &LevelingRules {
        &self.rules
    }

    pub fn tasks(&self) -> &[TaskDefinition] {
        self.catalog.tasks()
    }

    pub fn task(&self, id: TaskId) -> Option<&TaskDefinition> {
        self.catalog.get(id)
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn progress(&self) -> LevelProgress {
        progress(&self.profile, &self.rules)
    }

    pub fn ledger(&self) -> &XpLedger {
        &self.ledger
    }

    pub fn entries_on(&self, date: NaiveDate) -> Vec<&CompletionRecord> {
        self.ledger.entries_on(date)
    }

    pub fn total_xp(&self, range: Option<DateRange>) -> i64 {
        self.ledger.total_xp(range)
    }

    pub fn history(&self) -> HistoryIndex {
        HistoryIndex::from_records(self.ledger.entries())
    }

    pub fn month(&self, year: i32, month: u32) -> TrackerResult<Vec<DaySummary>> {
        Ok(self.history().month(year, month)?)
    }

    pub fn add_task(
        &mut self,
        title: impl Into<String>,
        xp_value: i64,
    ) -> TrackerResult<TaskDefinition> {
        let mut draft = self.catalog.clone();
        let task = draft.add(title, xp_value)?;
        remote("task_add", self.task_repo.insert_task(&task))?;
        self.refresh_tasks()?;
        info!(
            "event=task_add module=service status=ok task_id={} xp={} position={}",
            task.id, task.xp_value, task.position
        );
        Ok(self.catalog.get(task.id).cloned().unwrap_or(task))
    }

    pub fn update_task(&mut self, id: TaskId, patch: TaskPatch) -> TrackerResult<TaskDefinition> {
        let mut draft = self.catalog.clone();
        let task = draft.update(id, patch)?;
        remote("task_update", self.task_repo.update_task(&task))?;
        self.refresh_tasks()?;
        info!("event=task_update module=service status=ok task_id={id}");
        Ok(self.catalog.get(id).cloned().unwrap_or(task))
    }

    /// Deletes a task definition. Its ledger entries stay untouched.
    pub fn remove_task(&mut self, id: TaskId) -> TrackerResult<TaskDefinition> {
        let mut draft = self.catalog.clone();
        let removed = draft.remove(id)?;
        remote("task_remove", self.task_repo.delete_task(id))?;
        self.refresh_tasks()?;
        info!("event=task_remove module=service status=ok task_id={id}");
        Ok(removed)
    }

    pub fn reorder_task(&mut self, id: TaskId, new_position: usize) -> TrackerResult<()> {
        let mut draft = self.catalog.clone();
        draft.reorder(id, new_position)?;
        remote(
            "task_reorder",
            self.task_repo.reorder_tasks(&draft.ordered_ids()),
        )?;
        self.refresh_tasks()?;
        info!("event=task_reorder module=service status=ok task_id={id} position={new_position}");
        Ok(())
    }

    /// Reports one completion of a catalog task on `date`.
    ///
    /// The task's current title and XP are snapshotted into the entry.
    pub fn report_task(&mut self, task_id: TaskId, date: NaiveDate) -> TrackerResult<XpChange> {
        let task = self
            .catalog
            .get(task_id)
            .cloned()
            .ok_or(TrackerError::TaskNotFound(task_id))?;
        self.record_entry(Some(task.id), task.title, task.xp_value, date)
    }

    /// Logs a free-form entry that is not tied to a catalog task.
    pub fn add_entry(
        &mut self,
        label: impl Into<String>,
        xp: i64,
        date: NaiveDate,
    ) -> TrackerResult<XpChange> {
        let label = normalize_title(label.into())?;
        validate_xp_value(xp)?;
        self.record_entry(None, label, xp, date)
    }

    /// Deletes one ledger entry and reverses its XP.
    pub fn delete_entry(&mut self, id: CompletionId) -> TrackerResult<XpChange> {
        let record = self
            .ledger
            .get(id)
            .cloned()
            .ok_or(TrackerError::EntryNotFound(id))?;
        let mut draft = self.ledger.clone();
        let delta = draft.reverse(id)?;

        let slot = remote("entry_delete", self.completion_repo.delete_completion(id))?;
        let before = self.profile;
        let after = match self
            .profile_repo
            .decrement_xp(before.id, record.xp_awarded, &self.rules)
        {
            Ok(profile) => profile,
            Err(err) => {
                error!(
                    "event=xp_decrement module=service status=error entry_id={id} error={err}"
                );
                if let Err(restore_err) = self.completion_repo.restore_completion(&record, slot) {
                    error!(
                        "event=entry_restore module=service status=error entry_id={id} error={restore_err}"
                    );
                }
                self.refresh_ledger()?;
                return Err(err.into());
            }
        };

        self.profile = after;
        self.refresh_ledger()?;
        info!(
            "event=entry_delete module=service status=ok entry_id={id} delta={delta} level={} xp={}",
            after.level, after.xp
        );
        Ok(XpChange {
            record,
            before,
            after,
        })
    }

    fn record_entry(
        &mut self,
        task_id: Option<TaskId>,
        label: String,
        xp: i64,
        date: NaiveDate,
    ) -> TrackerResult<XpChange> {
        let mut draft = self.ledger.clone();
        let record = draft.record(task_id, label, xp, date);

        remote("entry_insert", self.completion_repo.insert_completion(&record))?;
        let before = self.profile;
        let after = match self
            .profile_repo
            .increment_xp(before.id, record.xp_awarded, &self.rules)
        {
            Ok(profile) => profile,
            Err(err) => {
                error!(
                    "event=xp_increment module=service status=error entry_id={} error={err}",
                    record.id
                );
                if let Err(rollback_err) = self.completion_repo.delete_completion(record.id) {
                    error!(
                        "event=entry_rollback module=service status=error entry_id={} error={rollback_err}",
                        record.id
                    );
                }
                return Err(err.into());
            }
        };

        self.profile = after;
        self.refresh_ledger()?;
        info!(
            "event=entry_insert module=service status=ok entry_id={} delta={xp} level={} xp={}",
            record.id, after.level, after.xp
        );
        Ok(XpChange {
            record,
            before,
            after,
        })
    }

    fn refresh_tasks(&mut self) -> TrackerResult<()> {
        let tasks = remote("task_fetch", self.task_repo.list_tasks())?;
        self.catalog = TaskCatalog::from_definitions(tasks);
        Ok(())
    }

    fn refresh_ledger(&mut self) -> TrackerResult<()> {
        let records = remote("entry_fetch", self.completion_repo.list_completions())?;
        self.ledger = XpLedger::from_records(records);
        Ok(())
    }

    fn refresh_profile(&mut self) -> TrackerResult<()> {
        let id = self.profile.id;
        self.profile = remote("profile_fetch", self.profile_repo.get_profile(id))?
            .ok_or(TrackerError::Remote(RepoError::NotFound {
                entity: "profile",
                id,
            }))?;
        Ok(())
    }
}

/// Logs a failed store call and converts it for callers.
fn remote<V>(event: &'static str, result: RepoResult<V>) -> TrackerResult<V> {
    result.map_err(|err| {
        error!("event={event} module=service status=error error={err}");
        TrackerError::from(err)
    })
}
