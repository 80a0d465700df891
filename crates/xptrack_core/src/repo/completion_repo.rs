//! Ledger entry repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Listing is deterministic: `occurred_on ASC, seq ASC` (insertion order
//!   within a day).
//! - `task_id` is stored without a foreign key.
//! - A restored entry takes back the slot it was deleted from.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::completion::{CompletionId, CompletionRecord};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const DATE_FORMAT: &str = "%Y-%m-%d";
const COMPLETION_SELECT_SQL: &str =
    "SELECT id, task_id, label, xp, occurred_on FROM completions";

/// Insertion slot of a ledger row (`completions.seq`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionSlot(pub i64);

/// Row store for the XP ledger.
pub trait CompletionRepository {
    fn list_completions(&self) -> RepoResult<Vec<CompletionRecord>>;
    fn insert_completion(&self, record: &CompletionRecord) -> RepoResult<()>;
    /// Deletes one entry and returns the slot it occupied.
    fn delete_completion(&self, id: CompletionId) -> RepoResult<CompletionSlot>;
    /// Re-inserts a deleted entry at its previous slot.
    fn restore_completion(&self, record: &CompletionRecord, slot: CompletionSlot)
        -> RepoResult<()>;
}

pub struct SqliteCompletionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCompletionRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CompletionRepository for SqliteCompletionRepository<'_> {
    fn list_completions(&self) -> RepoResult<Vec<CompletionRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMPLETION_SELECT_SQL} ORDER BY occurred_on ASC, seq ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_completion_row(row)?);
        }
        Ok(records)
    }

    fn insert_completion(&self, record: &CompletionRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO completions (id, task_id, label, xp, occurred_on)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                record.id.to_string(),
                record.task_id.map(|value| value.to_string()),
                record.label.as_str(),
                record.xp_awarded,
                record.occurred_on.format(DATE_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    fn delete_completion(&self, id: CompletionId) -> RepoResult<CompletionSlot> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let seq: Option<i64> = tx
            .query_row(
                "SELECT seq FROM completions WHERE id = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        let Some(seq) = seq else {
            return Err(RepoError::NotFound {
                entity: "ledger entry",
                id,
            });
        };

        tx.execute("DELETE FROM completions WHERE seq = ?1;", [seq])?;
        tx.commit()?;
        Ok(CompletionSlot(seq))
    }

    fn restore_completion(
        &self,
        record: &CompletionRecord,
        slot: CompletionSlot,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO completions (seq, id, task_id, label, xp, occurred_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                slot.0,
                record.id.to_string(),
                record.task_id.map(|value| value.to_string()),
                record.label.as_str(),
                record.xp_awarded,
                record.occurred_on.format(DATE_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }
}

fn parse_completion_row(row: &Row<'_>) -> RepoResult<CompletionRecord> {
    let id_text: String = row.get("id")?;
    let task_id = row
        .get::<_, Option<String>>("task_id")?
        .map(|value| parse_uuid(&value, "completions.task_id"))
        .transpose()?;

    let date_text: String = row.get("occurred_on")?;
    let occurred_on = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date `{date_text}` in completions.occurred_on"
        ))
    })?;

    Ok(CompletionRecord {
        id: parse_uuid(&id_text, "completions.id")?,
        task_id,
        label: row.get("label")?,
        xp_awarded: row.get("xp")?,
        occurred_on,
    })
}
