//! Day-bucketed read view over ledger entries for calendar/month screens.
//!
//! # Invariants
//! - Days are keyed by calendar date in ascending order.
//! - Entries inside one day keep ledger insertion order.
//! - Building an index never mutates the ledger.

use crate::ledger::sum_xp;
use crate::model::completion::CompletionRecord;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    InvalidMonth { year: i32, month: u32 },
}

impl Display for HistoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMonth { year, month } => {
                write!(f, "invalid calendar month {year}-{month:02}")
            }
        }
    }
}

impl Error for HistoryError {}

/// Groups records by calendar day.
pub fn group_by_day(records: &[CompletionRecord]) -> BTreeMap<NaiveDate, Vec<CompletionRecord>> {
    let mut days: BTreeMap<NaiveDate, Vec<CompletionRecord>> = BTreeMap::new();
    for record in records {
        days.entry(record.occurred_on)
            .or_default()
            .push(record.clone());
    }
    days
}

/// One day of a month view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub entries: Vec<CompletionRecord>,
    pub total_xp: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryIndex {
    days: BTreeMap<NaiveDate, Vec<CompletionRecord>>,
}

impl HistoryIndex {
    pub fn from_records(records: &[CompletionRecord]) -> Self {
        Self {
            days: group_by_day(records),
        }
    }

    pub fn group_by_day(&self) -> &BTreeMap<NaiveDate, Vec<CompletionRecord>> {
        &self.days
    }

    /// Days that carry at least one entry, for calendar highlighting.
    pub fn days_with_activity(&self) -> BTreeSet<NaiveDate> {
        self.days.keys().copied().collect()
    }

    pub fn entries_on(&self, date: NaiveDate) -> &[CompletionRecord] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Active days of one calendar month with their XP totals.
    pub fn month(&self, year: i32, month: u32) -> Result<Vec<DaySummary>, HistoryError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or(HistoryError::InvalidMonth { year, month })?;

        Ok(self
            .days
            .range(first..)
            .take_while(|(date, _)| date.year() == year && date.month() == month)
            .map(|(date, entries)| DaySummary {
                date: *date,
                total_xp: sum_xp(entries),
                entries: entries.clone(),
            })
            .collect())
    }
}
