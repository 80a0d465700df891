//! Domain model for tasks, ledger entries and the player profile.
//!
//! # Responsibility
//! - Define the canonical data structures shared by catalog, ledger,
//!   leveling and history logic.
//!
//! # Invariants
//! - Every task and ledger entry is identified by a stable UUID.
//! - Ledger entries reference tasks weakly; no cascade on task delete.

pub mod completion;
pub mod profile;
pub mod task;
