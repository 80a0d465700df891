//! Task definition model.
//!
//! # Responsibility
//! - Define the reusable task shape shown in the catalog and picker.
//! - Own presence checks for title and XP value.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `title` is non-blank after trim.
//! - `xp_value` lies in `0..=MAX_XP_VALUE`, so ledger sums and leveling
//!   arithmetic stay far from `i64` limits.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Largest XP value a single task or ledger entry may award.
pub const MAX_XP_VALUE: i64 = 1_000_000;

/// Stable identifier of a reusable task definition.
pub type TaskId = Uuid;

/// Validation failures for task input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Title is empty or whitespace only.
    EmptyTitle,
    /// XP value is below zero.
    NegativeXp(i64),
    /// XP value is above `MAX_XP_VALUE`.
    XpTooLarge(i64),
    /// Patch carries neither a title nor an XP value.
    EmptyPatch,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be blank"),
            Self::NegativeXp(value) => {
                write!(f, "task xp must be a non-negative integer, got {value}")
            }
            Self::XpTooLarge(value) => {
                write!(f, "task xp must be at most {MAX_XP_VALUE}, got {value}")
            }
            Self::EmptyPatch => write!(f, "task update must change the title or the xp"),
        }
    }
}

impl Error for TaskValidationError {}

/// Reusable task definition with its catalog rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: TaskId,
    pub title: String,
    /// XP awarded each time this task is reported.
    #[serde(rename = "xp")]
    pub xp_value: i64,
    /// Zero-based rank inside the catalog.
    #[serde(rename = "order_index")]
    pub position: usize,
}

impl TaskDefinition {
    /// Builds a validated definition with a generated ID.
    ///
    /// The title is trimmed before it is stored.
    pub fn new(
        title: impl Into<String>,
        xp_value: i64,
        position: usize,
    ) -> Result<Self, TaskValidationError> {
        let title = normalize_title(title.into())?;
        validate_xp_value(xp_value)?;
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            xp_value,
            position,
        })
    }

    /// Re-checks presence rules on an already built definition.
    ///
    /// Used on store read paths so invalid persisted rows are rejected
    /// instead of masked.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.title.trim().is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        validate_xp_value(self.xp_value)
    }
}

/// Partial update for a task definition. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub xp_value: Option<i64>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.xp_value.is_none()
    }
}

pub(crate) fn normalize_title(value: String) -> Result<String, TaskValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_xp_value(value: i64) -> Result<(), TaskValidationError> {
    if value < 0 {
        return Err(TaskValidationError::NegativeXp(value));
    }
    if value > MAX_XP_VALUE {
        return Err(TaskValidationError::XpTooLarge(value));
    }
    Ok(())
}
