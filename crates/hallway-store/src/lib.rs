//! # hallway-store
//!
//! SQLite persistence for the Hallway message board.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model, plus the two stateful engines of the system: vote transitions
//! (toggle / switch / cast, keeping the denormalized thread counters in sync
//! with the vote ledger) and the institution approval lifecycle.  Both run
//! inside SQLite transactions.

pub mod announcement;
pub mod database;
pub mod institutions;
pub mod migrations;
pub mod models;
pub mod suggestions;
pub mod threads;
pub mod votes;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
