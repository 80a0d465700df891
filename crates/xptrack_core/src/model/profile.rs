//! Player profile model.
//!
//! # Invariants
//! - `level` is at least 1.
//! - `xp` is the remainder inside the current level, `0 <= xp`.
//!   The upper bound depends on the leveling threshold, see
//!   `crate::leveling`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProfileId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub level: i64,
    pub xp: i64,
}

impl Profile {
    /// Fresh level-1 profile with no XP.
    pub fn new(id: ProfileId) -> Self {
        Self { id, level: 1, xp: 0 }
    }
}
