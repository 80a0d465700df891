//! Ordered catalog of reusable task definitions.
//!
//! # Responsibility
//! - Validate task input before anything reaches the store.
//! - Own rank bookkeeping for add/remove/reorder.
//!
//! # Invariants
//! - `positions` of all entries are exactly `0..len` with no gaps or
//!   duplicates after every public call returns.
//! - Entries are kept sorted by `position`.

use crate::model::task::{
    normalize_title, validate_xp_value, TaskDefinition, TaskId, TaskPatch, TaskValidationError,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    Validation(TaskValidationError),
    NotFound(TaskId),
    /// Requested rank is outside `[0, len - 1]`.
    PositionOutOfRange { position: usize, len: usize },
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::PositionOutOfRange { position, len } => {
                if *len == 0 {
                    write!(f, "position {position} is out of range for an empty catalog")
                } else {
                    write!(
                        f,
                        "position {position} is out of range, expected 0..={}",
                        len - 1
                    )
                }
            }
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for CatalogError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

/// In-memory task catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCatalog {
    tasks: Vec<TaskDefinition>,
}

impl TaskCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a catalog from a store snapshot.
    ///
    /// Rows are sorted by stored rank (ties broken by id) and renumbered, so
    /// a snapshot with gaps still yields a contiguous catalog.
    pub fn from_definitions(mut tasks: Vec<TaskDefinition>) -> Self {
        tasks.sort_by(|left, right| {
            left.position
                .cmp(&right.position)
                .then_with(|| left.id.cmp(&right.id))
        });
        let mut catalog = Self { tasks };
        catalog.normalize();
        catalog
    }

    /// Tasks in rank order.
    pub fn tasks(&self) -> &[TaskDefinition] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Appends a new task at the end of the catalog.
    pub fn add(
        &mut self,
        title: impl Into<String>,
        xp_value: i64,
    ) -> Result<TaskDefinition, CatalogError> {
        let task = TaskDefinition::new(title, xp_value, self.tasks.len())?;
        self.tasks.push(task.clone());
        Ok(task)
    }

    /// Removes a task and closes the rank gap it leaves.
    pub fn remove(&mut self, id: TaskId) -> Result<TaskDefinition, CatalogError> {
        let index = self.index_of(id)?;
        let removed = self.tasks.remove(index);
        self.normalize();
        Ok(removed)
    }

    /// Applies a partial update. Nothing changes when validation fails.
    ///
    /// A patch without any field is rejected as `EmptyPatch`.
    pub fn update(&mut self, id: TaskId, patch: TaskPatch) -> Result<TaskDefinition, CatalogError> {
        let index = self.index_of(id)?;
        if patch.is_empty() {
            return Err(TaskValidationError::EmptyPatch.into());
        }
        let title = patch.title.map(normalize_title).transpose()?;
        if let Some(xp_value) = patch.xp_value {
            validate_xp_value(xp_value)?;
        }

        let task = &mut self.tasks[index];
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(xp_value) = patch.xp_value {
            task.xp_value = xp_value;
        }
        Ok(task.clone())
    }

    /// Moves one task to `new_position`, shifting the tasks in between by one.
    pub fn reorder(&mut self, id: TaskId, new_position: usize) -> Result<(), CatalogError> {
        let len = self.tasks.len();
        let index = self.index_of(id)?;
        if new_position >= len {
            return Err(CatalogError::PositionOutOfRange {
                position: new_position,
                len,
            });
        }

        let moved = self.tasks.remove(index);
        self.tasks.insert(new_position, moved);
        self.normalize();
        Ok(())
    }

    /// Rewrites ranks to match the current vector order.
    pub fn normalize(&mut self) {
        for (index, task) in self.tasks.iter_mut().enumerate() {
            task.position = index;
        }
    }

    /// Task ids in rank order, the shape the store needs for a bulk reorder.
    pub fn ordered_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|task| task.id).collect()
    }

    fn index_of(&self, id: TaskId) -> Result<usize, CatalogError> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(CatalogError::NotFound(id))
    }
}
