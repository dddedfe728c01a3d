//! The vote ledger and the vote transition engine.
//!
//! One ledger row per (thread, fingerprint) pair, enforced by a unique
//! index.  [`Database::cast_vote`] applies the toggle / switch / cast
//! transition and the matching counter mutation in a single SQLite
//! transaction; the counters are adjusted with in-SQL expressions, never a
//! read-then-write of a cached value, and are floored at zero to absorb any
//! ledger/counter drift.

use chrono::{DateTime, Utc};
use hallway_shared::{validation, VoteKind};
use rusqlite::{params, OptionalExtension, Transaction};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Vote, VoteTally};

impl Database {
    /// Apply a vote transition for `(thread_id, fingerprint)`:
    ///
    /// - no existing vote: record it, bump the matching counter;
    /// - existing vote of the same kind: remove it (un-vote), drop the
    ///   counter;
    /// - existing vote of the other kind: switch it, moving one count from
    ///   the old counter to the new.
    ///
    /// Returns the thread's updated counters and the caller's vote state.
    pub fn cast_vote(
        &mut self,
        thread_id: Uuid,
        fingerprint: &str,
        kind: VoteKind,
    ) -> Result<VoteTally> {
        let fingerprint = validation::fingerprint(fingerprint)?;

        let tx = self.conn_mut().transaction()?;

        let thread_exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM threads WHERE id = ?1",
                params![thread_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if thread_exists.is_none() {
            return Err(StoreError::NotFound);
        }

        let existing: Option<(String, String)> = tx
            .query_row(
                "SELECT id, kind FROM votes WHERE thread_id = ?1 AND fingerprint = ?2",
                params![thread_id.to_string(), fingerprint],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let user_vote = match existing {
            None => {
                tx.execute(
                    "INSERT INTO votes (id, thread_id, fingerprint, kind, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        Uuid::new_v4().to_string(),
                        thread_id.to_string(),
                        fingerprint,
                        kind.as_str(),
                        Utc::now().to_rfc3339(),
                    ],
                )?;
                adjust_counter(&tx, thread_id, kind, 1)?;
                Some(kind)
            }
            Some((vote_id, existing_kind)) => {
                let existing_kind: VoteKind = existing_kind.parse().map_err(|_| {
                    StoreError::InvalidState(format!("corrupt vote kind on {vote_id}"))
                })?;

                if existing_kind == kind {
                    // Same kind again: un-vote.
                    tx.execute("DELETE FROM votes WHERE id = ?1", params![vote_id])?;
                    adjust_counter(&tx, thread_id, kind, -1)?;
                    None
                } else {
                    // Switch: total stays put, distribution moves.
                    tx.execute(
                        "UPDATE votes SET kind = ?2 WHERE id = ?1",
                        params![vote_id, kind.as_str()],
                    )?;
                    adjust_counter(&tx, thread_id, existing_kind, -1)?;
                    adjust_counter(&tx, thread_id, kind, 1)?;
                    Some(kind)
                }
            }
        };

        let (upvotes, downvotes): (i64, i64) = tx.query_row(
            "SELECT upvotes, downvotes FROM threads WHERE id = ?1",
            params![thread_id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        tx.commit()?;

        tracing::debug!(
            thread = %thread_id,
            kind = %kind,
            user_vote = ?user_vote,
            "vote transition applied"
        );

        Ok(VoteTally {
            upvotes,
            downvotes,
            user_vote,
        })
    }

    /// The caller's current vote on a thread, if any.  Pure lookup.
    pub fn get_user_vote(&self, thread_id: Uuid, fingerprint: &str) -> Result<Option<VoteKind>> {
        let kind: Option<String> = self
            .conn()
            .query_row(
                "SELECT kind FROM votes WHERE thread_id = ?1 AND fingerprint = ?2",
                params![thread_id.to_string(), fingerprint.trim()],
                |row| row.get(0),
            )
            .optional()?;

        kind.map(|k| {
            k.parse::<VoteKind>()
                .map_err(|_| StoreError::InvalidState(format!("corrupt vote kind: {k}")))
        })
        .transpose()
    }

    /// All ledger entries for a thread, oldest first.
    pub fn list_votes_for_thread(&self, thread_id: Uuid) -> Result<Vec<Vote>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, thread_id, fingerprint, kind, created_at
             FROM votes WHERE thread_id = ?1 ORDER BY created_at ASC",
        )?;

        let rows = stmt.query_map(params![thread_id.to_string()], row_to_vote)?;

        let mut votes = Vec::new();
        for row in rows {
            votes.push(row?);
        }
        Ok(votes)
    }
}

/// Bump a thread counter by `delta` (+1 or -1) in SQL, floored at zero.
fn adjust_counter(
    tx: &Transaction<'_>,
    thread_id: Uuid,
    kind: VoteKind,
    delta: i64,
) -> Result<()> {
    let column = match kind {
        VoteKind::Upvote => "upvotes",
        VoteKind::Downvote => "downvotes",
    };
    tx.execute(
        &format!("UPDATE threads SET {column} = MAX({column} + ?2, 0) WHERE id = ?1"),
        params![thread_id.to_string(), delta],
    )?;
    Ok(())
}

/// Map a `rusqlite::Row` to a [`Vote`].
fn row_to_vote(row: &rusqlite::Row<'_>) -> rusqlite::Result<Vote> {
    let id_str: String = row.get(0)?;
    let thread_str: String = row.get(1)?;
    let fingerprint: String = row.get(2)?;
    let kind_str: String = row.get(3)?;
    let created_str: String = row.get(4)?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;

    let thread_id = Uuid::parse_str(&thread_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e)))?;

    let kind: VoteKind = kind_str
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e)))?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(Vote {
        id,
        thread_id,
        fingerprint,
        kind,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hallway_shared::{ClassLevel, InstitutionKind, InstitutionStatus};

    fn db_with_thread() -> (Database, Uuid) {
        let mut db = Database::open_in_memory().unwrap();
        let school = db
            .create_institution(
                "Test School",
                "Chennai",
                InstitutionKind::School,
                InstitutionStatus::Approved,
            )
            .unwrap();
        let thread = db
            .create_thread(school.id, "something to vote on!", Some(ClassLevel::Tenth))
            .unwrap();
        (db, thread.id)
    }

    #[test]
    fn first_vote_creates_ledger_entry() {
        let (mut db, thread) = db_with_thread();

        let tally = db.cast_vote(thread, "userA", VoteKind::Upvote).unwrap();
        assert_eq!(tally.upvotes, 1);
        assert_eq!(tally.downvotes, 0);
        assert_eq!(tally.user_vote, Some(VoteKind::Upvote));

        assert_eq!(db.list_votes_for_thread(thread).unwrap().len(), 1);
    }

    #[test]
    fn same_kind_twice_unvotes() {
        let (mut db, thread) = db_with_thread();

        db.cast_vote(thread, "userA", VoteKind::Upvote).unwrap();
        let tally = db.cast_vote(thread, "userA", VoteKind::Upvote).unwrap();

        assert_eq!(tally.upvotes, 0);
        assert_eq!(tally.downvotes, 0);
        assert_eq!(tally.user_vote, None);
        assert!(db.list_votes_for_thread(thread).unwrap().is_empty());
        assert_eq!(db.get_user_vote(thread, "userA").unwrap(), None);
    }

    #[test]
    fn different_kind_switches() {
        let (mut db, thread) = db_with_thread();

        db.cast_vote(thread, "userA", VoteKind::Upvote).unwrap();
        let tally = db.cast_vote(thread, "userA", VoteKind::Downvote).unwrap();

        assert_eq!(tally.upvotes, 0);
        assert_eq!(tally.downvotes, 1);
        assert_eq!(tally.user_vote, Some(VoteKind::Downvote));
        assert_eq!(
            db.get_user_vote(thread, "userA").unwrap(),
            Some(VoteKind::Downvote)
        );
    }

    #[test]
    fn switch_preserves_total() {
        let (mut db, thread) = db_with_thread();

        db.cast_vote(thread, "userA", VoteKind::Upvote).unwrap();
        db.cast_vote(thread, "userB", VoteKind::Upvote).unwrap();
        db.cast_vote(thread, "userC", VoteKind::Downvote).unwrap();

        let before = db.get_thread(thread).unwrap();
        let tally = db.cast_vote(thread, "userB", VoteKind::Downvote).unwrap();

        assert_eq!(
            tally.upvotes + tally.downvotes,
            before.upvotes + before.downvotes
        );
        assert_eq!(tally.upvotes, 1);
        assert_eq!(tally.downvotes, 2);
    }

    #[test]
    fn counters_match_ledger_after_mixed_sequence() {
        let (mut db, thread) = db_with_thread();

        db.cast_vote(thread, "a", VoteKind::Upvote).unwrap();
        db.cast_vote(thread, "b", VoteKind::Downvote).unwrap();
        db.cast_vote(thread, "c", VoteKind::Upvote).unwrap();
        db.cast_vote(thread, "a", VoteKind::Downvote).unwrap(); // switch
        db.cast_vote(thread, "b", VoteKind::Downvote).unwrap(); // un-vote
        db.cast_vote(thread, "d", VoteKind::Upvote).unwrap();
        db.cast_vote(thread, "c", VoteKind::Upvote).unwrap(); // un-vote

        let t = db.get_thread(thread).unwrap();
        assert_eq!(t.upvotes, db.ledger_count(thread, VoteKind::Upvote).unwrap());
        assert_eq!(
            t.downvotes,
            db.ledger_count(thread, VoteKind::Downvote).unwrap()
        );
        assert_eq!((t.upvotes, t.downvotes), (1, 1));
    }

    #[test]
    fn counters_never_go_negative() {
        let (mut db, thread) = db_with_thread();

        db.cast_vote(thread, "userA", VoteKind::Upvote).unwrap();

        // Simulate counter drift: the ledger has one upvote but the counter
        // was clobbered to zero.  Un-voting must clamp at zero, not wrap.
        db.conn()
            .execute(
                "UPDATE threads SET upvotes = 0 WHERE id = ?1",
                params![thread.to_string()],
            )
            .unwrap();

        let tally = db.cast_vote(thread, "userA", VoteKind::Upvote).unwrap();
        assert_eq!(tally.upvotes, 0);
        assert_eq!(tally.downvotes, 0);
    }

    #[test]
    fn vote_on_missing_thread_is_not_found() {
        let (mut db, _) = db_with_thread();
        let err = db
            .cast_vote(Uuid::new_v4(), "userA", VoteKind::Upvote)
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn blank_fingerprint_is_invalid_input() {
        let (mut db, thread) = db_with_thread();
        let err = db.cast_vote(thread, "   ", VoteKind::Upvote).unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[test]
    fn unique_index_blocks_duplicate_ledger_rows() {
        let (mut db, thread) = db_with_thread();
        db.cast_vote(thread, "userA", VoteKind::Upvote).unwrap();

        // A raw second insert for the same pair must violate the index.
        let result = db.conn().execute(
            "INSERT INTO votes (id, thread_id, fingerprint, kind, created_at)
             VALUES (?1, ?2, 'userA', 'downvote', ?3)",
            params![
                Uuid::new_v4().to_string(),
                thread.to_string(),
                Utc::now().to_rfc3339()
            ],
        );
        assert!(result.is_err());
    }

    #[test]
    fn deleting_thread_drops_its_votes() {
        let (mut db, thread) = db_with_thread();
        db.cast_vote(thread, "userA", VoteKind::Upvote).unwrap();
        db.cast_vote(thread, "userB", VoteKind::Downvote).unwrap();

        db.delete_thread(thread).unwrap();

        let orphans: i64 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM votes WHERE thread_id = ?1",
                params![thread.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
