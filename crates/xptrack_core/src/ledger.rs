//! Append-only XP ledger.
//!
//! # Responsibility
//! - Keep completion records in insertion order.
//! - Answer per-day and range XP queries for audits and history views.
//!
//! # Invariants
//! - `record` never checks task existence; deleted tasks keep their history.
//! - `reverse` is the only removal path and returns the XP to undo.
//! - Profile XP is not derived from `total_xp`; the profile is mutated
//!   independently and must stay consistent with record/reverse pairs.

use crate::model::completion::{CompletionId, CompletionRecord};
use crate::model::task::TaskId;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    NotFound(CompletionId),
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "ledger entry not found: {id}"),
        }
    }
}

impl Error for LedgerError {}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XpLedger {
    entries: Vec<CompletionRecord>,
}

impl XpLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the ledger from store rows, keeping their order.
    pub fn from_records(entries: Vec<CompletionRecord>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CompletionRecord] {
        &self.entries
    }

    pub fn get(&self, id: CompletionId) -> Option<&CompletionRecord> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Appends one completion with a generated id.
    pub fn record(
        &mut self,
        task_id: Option<TaskId>,
        label: impl Into<String>,
        xp_awarded: i64,
        occurred_on: NaiveDate,
    ) -> CompletionRecord {
        let entry = CompletionRecord::new(task_id, label, xp_awarded, occurred_on);
        self.entries.push(entry.clone());
        entry
    }

    /// Removes one entry and returns the XP delta that undoes it.
    pub fn reverse(&mut self, id: CompletionId) -> Result<i64, LedgerError> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(LedgerError::NotFound(id))?;
        let removed = self.entries.remove(index);
        Ok(-removed.xp_awarded)
    }

    pub fn entries_on(&self, date: NaiveDate) -> Vec<&CompletionRecord> {
        self.entries
            .iter()
            .filter(|entry| entry.occurred_on == date)
            .collect()
    }

    /// Sum of awarded XP, optionally limited to an inclusive date range.
    pub fn total_xp(&self, range: Option<DateRange>) -> i64 {
        sum_xp(
            self.entries
                .iter()
                .filter(|entry| range.map_or(true, |range| range.contains(entry.occurred_on))),
        )
    }
}

/// Saturating XP sum; store rows are not bounded by input validation.
pub(crate) fn sum_xp<'a>(entries: impl IntoIterator<Item = &'a CompletionRecord>) -> i64 {
    entries
        .into_iter()
        .fold(0i64, |total, entry| total.saturating_add(entry.xp_awarded))
}
