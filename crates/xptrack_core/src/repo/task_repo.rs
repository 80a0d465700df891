//! Task definition repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Listing is deterministic: `order_index ASC, id ASC`.
//! - Delete and reorder rewrite `order_index` to `0..n` inside one immediate
//!   transaction, so a failure leaves the previous order intact.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::task::{TaskDefinition, TaskId};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;

const TASK_SELECT_SQL: &str = "SELECT id, title, xp, order_index FROM tasks";

/// Row store for reusable task definitions.
pub trait TaskRepository {
    /// All tasks ordered by rank.
    fn list_tasks(&self) -> RepoResult<Vec<TaskDefinition>>;
    fn insert_task(&self, task: &TaskDefinition) -> RepoResult<()>;
    /// Updates title and XP by id. Rank is owned by `reorder_tasks`.
    fn update_task(&self, task: &TaskDefinition) -> RepoResult<()>;
    /// Deletes one task and closes the rank gap.
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    /// Persists a full ordering; `ordered_ids` must list every task once.
    fn reorder_tasks(&self, ordered_ids: &[TaskId]) -> RepoResult<()>;
}

pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn list_tasks(&self) -> RepoResult<Vec<TaskDefinition>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} ORDER BY order_index ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn insert_task(&self, task: &TaskDefinition) -> RepoResult<()> {
        task.validate()?;
        self.conn.execute(
            "INSERT INTO tasks (id, title, xp, order_index) VALUES (?1, ?2, ?3, ?4);",
            params![
                task.id.to_string(),
                task.title.as_str(),
                task.xp_value,
                position_to_db(task.position)?,
            ],
        )?;
        Ok(())
    }

    fn update_task(&self, task: &TaskDefinition) -> RepoResult<()> {
        task.validate()?;
        let changed = self.conn.execute(
            "UPDATE tasks
             SET title = ?2,
                 xp = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![task.id.to_string(), task.title.as_str(), task.xp_value],
        )?;
        if changed == 0 {
            return Err(not_found(task.id));
        }
        Ok(())
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(not_found(id));
        }

        let remaining = list_ids(&tx)?;
        write_order(&tx, &remaining)?;
        tx.commit()?;
        Ok(())
    }

    fn reorder_tasks(&self, ordered_ids: &[TaskId]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let stored: HashSet<TaskId> = list_ids(&tx)?.into_iter().collect();
        let requested: HashSet<TaskId> = ordered_ids.iter().copied().collect();
        if requested.len() != ordered_ids.len() || requested.len() != stored.len() {
            return Err(RepoError::IncompleteOrder {
                expected: stored.len(),
                actual: ordered_ids.len(),
            });
        }
        if let Some(missing) = requested.difference(&stored).next() {
            return Err(not_found(*missing));
        }

        write_order(&tx, ordered_ids)?;
        tx.commit()?;
        Ok(())
    }
}

fn list_ids(conn: &Connection) -> RepoResult<Vec<TaskId>> {
    let mut stmt = conn.prepare("SELECT id FROM tasks ORDER BY order_index ASC, id ASC;")?;
    let mut rows = stmt.query([])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "tasks.id")?);
    }
    Ok(ids)
}

fn write_order(conn: &Connection, ordered_ids: &[TaskId]) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "UPDATE tasks
         SET order_index = ?2,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1;",
    )?;
    for (index, id) in ordered_ids.iter().enumerate() {
        stmt.execute(params![id.to_string(), position_to_db(index)?])?;
    }
    Ok(())
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<TaskDefinition> {
    let id_text: String = row.get("id")?;
    let order_index: i64 = row.get("order_index")?;
    let position = usize::try_from(order_index).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid order_index `{order_index}` in tasks.order_index"
        ))
    })?;

    let task = TaskDefinition {
        id: parse_uuid(&id_text, "tasks.id")?,
        title: row.get("title")?,
        xp_value: row.get("xp")?,
        position,
    };
    task.validate()?;
    Ok(task)
}

fn position_to_db(position: usize) -> RepoResult<i64> {
    i64::try_from(position)
        .map_err(|_| RepoError::InvalidData(format!("position {position} does not fit i64")))
}

fn not_found(id: TaskId) -> RepoError {
    RepoError::NotFound { entity: "task", id }
}
