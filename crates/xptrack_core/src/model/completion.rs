//! Completion record model (one XP ledger entry).
//!
//! # Invariants
//! - `task_id` is a weak reference: the record outlives its task.
//! - `xp_awarded` is a snapshot taken at record time and is never
//!   recomputed from the current task value.
//! - `occurred_on` has calendar-day granularity only.

use crate::model::task::TaskId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a ledger entry.
pub type CompletionId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub id: CompletionId,
    /// `None` for entries added by hand from the monthly view.
    pub task_id: Option<TaskId>,
    /// Task title at record time, kept for display after the task is gone.
    pub label: String,
    /// Signed; a reversal entry carries a negative amount.
    #[serde(rename = "xp")]
    pub xp_awarded: i64,
    #[serde(rename = "date")]
    pub occurred_on: NaiveDate,
}

impl CompletionRecord {
    /// Creates a record with a generated ID.
    pub fn new(
        task_id: Option<TaskId>,
        label: impl Into<String>,
        xp_awarded: i64,
        occurred_on: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            label: label.into(),
            xp_awarded,
            occurred_on,
        }
    }
}
