//! Profile repository and store-side XP adjustment.
//!
//! # Responsibility
//! - Load the profile row.
//! - Apply XP changes atomically on the store side so concurrent writers
//!   never lose an update through client read-modify-write.
//!
//! # Invariants
//! - `adjust_xp` reads, levels and writes inside one immediate transaction.
//! - Leveling always goes through `crate::leveling::apply_xp`.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::leveling::{apply_xp, LevelingRules};
use crate::model::profile::{Profile, ProfileId};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

pub trait ProfileRepository {
    /// First profile row; the single-user store seeds exactly one.
    fn first_profile(&self) -> RepoResult<Profile>;
    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>>;
    /// Atomically applies `delta` XP and returns the stored result.
    fn adjust_xp(&self, id: ProfileId, delta: i64, rules: &LevelingRules)
        -> RepoResult<Profile>;

    fn increment_xp(
        &self,
        id: ProfileId,
        amount: i64,
        rules: &LevelingRules,
    ) -> RepoResult<Profile> {
        self.adjust_xp(id, amount, rules)
    }

    fn decrement_xp(
        &self,
        id: ProfileId,
        amount: i64,
        rules: &LevelingRules,
    ) -> RepoResult<Profile> {
        self.adjust_xp(id, -amount, rules)
    }
}

pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn first_profile(&self) -> RepoResult<Profile> {
        let row = self
            .conn
            .query_row(
                "SELECT id, level, xp FROM profiles ORDER BY rowid ASC LIMIT 1;",
                [],
                |row| Ok(parse_profile_row(row)),
            )
            .optional()?;
        row.ok_or(RepoError::MissingProfile)?
    }

    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>> {
        load_profile(self.conn, id)
    }

    fn adjust_xp(
        &self,
        id: ProfileId,
        delta: i64,
        rules: &LevelingRules,
    ) -> RepoResult<Profile> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = load_profile(&tx, id)?.ok_or(RepoError::NotFound {
            entity: "profile",
            id,
        })?;
        let next = apply_xp(current, delta, rules);

        tx.execute(
            "UPDATE profiles
             SET level = ?2,
                 xp = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id.to_string(), next.level, next.xp],
        )?;
        tx.commit()?;

        debug!(
            "event=profile_adjust module=repo status=ok delta={delta} level={} xp={}",
            next.level, next.xp
        );
        Ok(next)
    }
}

fn load_profile(conn: &Connection, id: ProfileId) -> RepoResult<Option<Profile>> {
    let row = conn
        .query_row(
            "SELECT id, level, xp FROM profiles WHERE id = ?1;",
            [id.to_string()],
            |row| Ok(parse_profile_row(row)),
        )
        .optional()?;
    row.transpose()
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let id_text: String = row.get("id")?;
    let level: i64 = row.get("level")?;
    let xp: i64 = row.get("xp")?;
    if level < 1 || xp < 0 {
        return Err(RepoError::InvalidData(format!(
            "invalid profile state level={level} xp={xp} for `{id_text}`"
        )));
    }
    Ok(Profile {
        id: parse_uuid(&id_text, "profiles.id")?,
        level,
        xp,
    })
}
