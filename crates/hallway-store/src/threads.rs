//! CRUD operations for [`Thread`] records.
//!
//! Posting is the one public write path: the parent institution must be
//! approved, content is length-checked after trimming, and schools require a
//! class drawn from the institution's class list.  Colleges never carry a
//! class; one supplied by the caller is ignored.

use chrono::{DateTime, Duration, Utc};
use hallway_shared::constants::THREAD_PAGE_LIMIT;
use hallway_shared::{validation, ClassLevel, InstitutionKind, VoteKind};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{BoardStats, Thread, ThreadWithInstitution};

const THREAD_COLUMNS: &str =
    "id, institution_id, class, content, upvotes, downvotes, created_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Post a new thread under an institution.
    ///
    /// The institution must exist and be approved; a pending one is treated
    /// as absent ([`StoreError::NotFound`]).  Counters start at zero.
    pub fn create_thread(
        &mut self,
        institution_id: Uuid,
        content: &str,
        class: Option<ClassLevel>,
    ) -> Result<Thread> {
        let content = validation::thread_content(content)?;
        let institution = self.get_approved_institution(institution_id)?;

        let class = match institution.kind {
            InstitutionKind::School => {
                let class = class.ok_or_else(|| {
                    StoreError::InvalidInput("class is required for school threads".into())
                })?;
                if !institution.classes.contains(&class) {
                    return Err(StoreError::InvalidInput(format!(
                        "class {class} is not offered by this school"
                    )));
                }
                Some(class)
            }
            // Colleges have no classes; drop whatever the caller sent.
            InstitutionKind::College => None,
        };

        let thread = Thread {
            id: Uuid::new_v4(),
            institution_id,
            class,
            content,
            upvotes: 0,
            downvotes: 0,
            created_at: Utc::now(),
        };

        self.conn().execute(
            "INSERT INTO threads (id, institution_id, class, content, upvotes, downvotes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                thread.id.to_string(),
                thread.institution_id.to_string(),
                thread.class.map(|c| c.as_str()),
                thread.content,
                thread.upvotes,
                thread.downvotes,
                thread.created_at.to_rfc3339(),
            ],
        )?;

        tracing::info!(id = %thread.id, institution = %institution_id, "thread posted");
        Ok(thread)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single thread by UUID.
    pub fn get_thread(&self, id: Uuid) -> Result<Thread> {
        self.conn()
            .query_row(
                &format!("SELECT {THREAD_COLUMNS} FROM threads WHERE id = ?1"),
                params![id.to_string()],
                row_to_thread,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List threads for an institution, newest first, optionally filtered by
    /// class, capped at [`THREAD_PAGE_LIMIT`].
    pub fn list_threads(
        &self,
        institution_id: Uuid,
        class: Option<ClassLevel>,
    ) -> Result<Vec<Thread>> {
        let mut out = Vec::new();
        match class {
            Some(class) => {
                let mut stmt = self.conn().prepare(&format!(
                    "SELECT {THREAD_COLUMNS} FROM threads
                     WHERE institution_id = ?1 AND class = ?2
                     ORDER BY created_at DESC LIMIT ?3"
                ))?;
                let rows = stmt.query_map(
                    params![institution_id.to_string(), class.as_str(), THREAD_PAGE_LIMIT],
                    row_to_thread,
                )?;
                for row in rows {
                    out.push(row?);
                }
            }
            None => {
                let mut stmt = self.conn().prepare(&format!(
                    "SELECT {THREAD_COLUMNS} FROM threads
                     WHERE institution_id = ?1
                     ORDER BY created_at DESC LIMIT ?2"
                ))?;
                let rows = stmt.query_map(
                    params![institution_id.to_string(), THREAD_PAGE_LIMIT],
                    row_to_thread,
                )?;
                for row in rows {
                    out.push(row?);
                }
            }
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Update / Delete (admin moderation)
    // ------------------------------------------------------------------

    /// Replace a thread's content (admin edit).  Validated like a new post.
    pub fn update_thread_content(&mut self, id: Uuid, content: &str) -> Result<Thread> {
        let content = validation::thread_content(content)?;

        let affected = self.conn().execute(
            "UPDATE threads SET content = ?2 WHERE id = ?1",
            params![id.to_string(), content],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_thread(id)
    }

    /// Delete a thread by UUID.  Its votes go with it via the foreign key
    /// cascade.  Returns `true` if a row was deleted.
    pub fn delete_thread(&mut self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM threads WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }

    // ------------------------------------------------------------------
    // Admin stats
    // ------------------------------------------------------------------

    /// Aggregate counts and the latest threads for the admin dashboard.
    pub fn board_stats(&self) -> Result<BoardStats> {
        let total_institutions: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM institutions WHERE status = 'approved'",
            [],
            |row| row.get(0),
        )?;

        let total_threads: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM threads", [], |row| row.get(0))?;

        let week_ago = (Utc::now() - Duration::days(7)).to_rfc3339();
        let recent_threads: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM threads WHERE created_at >= ?1",
            params![week_ago],
            |row| row.get(0),
        )?;

        let mut stmt = self.conn().prepare(&format!(
            "SELECT {cols}, i.name
             FROM threads t JOIN institutions i ON i.id = t.institution_id
             ORDER BY t.created_at DESC LIMIT 10",
            cols = "t.id, t.institution_id, t.class, t.content, t.upvotes, t.downvotes, t.created_at",
        ))?;
        let rows = stmt.query_map([], |row| {
            let thread = row_to_thread(row)?;
            let institution_name: String = row.get(7)?;
            Ok(ThreadWithInstitution {
                thread,
                institution_name,
            })
        })?;

        let mut latest = Vec::new();
        for row in rows {
            latest.push(row?);
        }

        Ok(BoardStats {
            total_institutions,
            total_threads,
            recent_threads,
            latest,
        })
    }

    /// Number of ledger entries of `kind` referencing `thread_id`.  Lets the
    /// caller audit the denormalized counters against the ledger.
    pub fn ledger_count(&self, thread_id: Uuid, kind: VoteKind) -> Result<i64> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM votes WHERE thread_id = ?1 AND kind = ?2",
            params![thread_id.to_string(), kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Thread`].
pub(crate) fn row_to_thread(row: &rusqlite::Row<'_>) -> rusqlite::Result<Thread> {
    let id_str: String = row.get(0)?;
    let institution_str: String = row.get(1)?;
    let class_str: Option<String> = row.get(2)?;
    let content: String = row.get(3)?;
    let upvotes: i64 = row.get(4)?;
    let downvotes: i64 = row.get(5)?;
    let created_str: String = row.get(6)?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;

    let institution_id = Uuid::parse_str(&institution_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e)))?;

    let class = class_str
        .map(|s| s.parse::<ClassLevel>())
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e)))?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(Thread {
        id,
        institution_id,
        class,
        content,
        upvotes,
        downvotes,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hallway_shared::InstitutionStatus;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn approved_school(db: &mut Database) -> Uuid {
        db.create_institution(
            "Test School",
            "Chennai",
            InstitutionKind::School,
            InstitutionStatus::Approved,
        )
        .unwrap()
        .id
    }

    fn approved_college(db: &mut Database) -> Uuid {
        db.create_institution(
            "Test College",
            "Chennai",
            InstitutionKind::College,
            InstitutionStatus::Approved,
        )
        .unwrap()
        .id
    }

    #[test]
    fn short_content_rejected() {
        let mut db = db();
        let school = approved_school(&mut db);

        let err = db
            .create_thread(school, "123456789", Some(ClassLevel::Tenth))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[test]
    fn exactly_ten_chars_without_class_rejected() {
        let mut db = db();
        let school = approved_school(&mut db);

        let err = db.create_thread(school, "1234567890", None).unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[test]
    fn school_thread_stores_class_and_zero_counters() {
        let mut db = db();
        let school = approved_school(&mut db);

        let thread = db
            .create_thread(school, "something worth whispering about", Some(ClassLevel::Ninth))
            .unwrap();
        assert_eq!(thread.class, Some(ClassLevel::Ninth));
        assert_eq!((thread.upvotes, thread.downvotes), (0, 0));

        let reread = db.get_thread(thread.id).unwrap();
        assert_eq!(reread, thread);
    }

    #[test]
    fn college_thread_drops_class() {
        let mut db = db();
        let college = approved_college(&mut db);

        let thread = db
            .create_thread(college, "campus gossip goes here", Some(ClassLevel::Ninth))
            .unwrap();
        assert_eq!(thread.class, None);
    }

    #[test]
    fn pending_institution_is_not_found() {
        let mut db = db();
        let pending = db
            .create_institution(
                "Pending School",
                "Chennai",
                InstitutionKind::School,
                InstitutionStatus::Pending,
            )
            .unwrap();

        let err = db
            .create_thread(pending.id, "ten chars at least here", Some(ClassLevel::Tenth))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn listing_is_newest_first_and_class_filterable() {
        let mut db = db();
        let school = approved_school(&mut db);

        let first = db
            .create_thread(school, "first thread content!", Some(ClassLevel::Ninth))
            .unwrap();
        let second = db
            .create_thread(school, "second thread content", Some(ClassLevel::Tenth))
            .unwrap();

        // Force distinct, ordered timestamps.
        db.conn()
            .execute(
                "UPDATE threads SET created_at = ?2 WHERE id = ?1",
                params![first.id.to_string(), (first.created_at - Duration::minutes(5)).to_rfc3339()],
            )
            .unwrap();

        let all = db.list_threads(school, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);

        let ninth = db.list_threads(school, Some(ClassLevel::Ninth)).unwrap();
        assert_eq!(ninth.len(), 1);
        assert_eq!(ninth[0].id, first.id);
    }

    #[test]
    fn edit_and_delete() {
        let mut db = db();
        let school = approved_school(&mut db);
        let thread = db
            .create_thread(school, "original content here", Some(ClassLevel::Tenth))
            .unwrap();

        let updated = db
            .update_thread_content(thread.id, "  moderated content here  ")
            .unwrap();
        assert_eq!(updated.content, "moderated content here");

        assert!(matches!(
            db.update_thread_content(thread.id, "short"),
            Err(StoreError::InvalidInput(_))
        ));

        assert!(db.delete_thread(thread.id).unwrap());
        assert!(!db.delete_thread(thread.id).unwrap());
    }

    #[test]
    fn cascade_delete_removes_threads() {
        let mut db = db();
        let school = approved_school(&mut db);
        let thread = db
            .create_thread(school, "doomed thread content", Some(ClassLevel::Tenth))
            .unwrap();

        db.delete_institution(school).unwrap();
        assert!(matches!(db.get_thread(thread.id), Err(StoreError::NotFound)));
        assert!(db.list_threads(school, None).unwrap().is_empty());
    }

    #[test]
    fn stats_count_and_join() {
        let mut db = db();
        let school = approved_school(&mut db);
        db.create_thread(school, "a fresh thread for stats", Some(ClassLevel::Tenth))
            .unwrap();

        let stats = db.board_stats().unwrap();
        assert_eq!(stats.total_institutions, 1);
        assert_eq!(stats.total_threads, 1);
        assert_eq!(stats.recent_threads, 1);
        assert_eq!(stats.latest.len(), 1);
        assert_eq!(stats.latest[0].institution_name, "Test School");
    }
}
