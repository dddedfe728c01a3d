//! CRUD and lifecycle transitions for [`Institution`] records.
//!
//! Institutions are created pending (self-service) or approved outright
//! (admin path).  `pending -> approved` derives the class list and stamps
//! `approved_at`; `pending -> rejected` deletes the record.  Approved and
//! rejected are both terminal.

use chrono::{DateTime, Utc};
use hallway_shared::{validation, ClassLevel, InstitutionKind, InstitutionStatus};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Institution;

const INSTITUTION_COLUMNS: &str =
    "id, name, city, kind, status, classes, created_at, approved_at";

/// The class list an institution carries in a given (kind, status) pair:
/// the full 7-12 set for approved schools, empty for everything else.
fn derived_classes(kind: InstitutionKind, status: InstitutionStatus) -> Vec<ClassLevel> {
    match (kind, status) {
        (InstitutionKind::School, InstitutionStatus::Approved) => ClassLevel::ALL.to_vec(),
        _ => Vec::new(),
    }
}

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new institution.
    ///
    /// `status` must be `Pending` (self-service request) or `Approved`
    /// (admin creation, which also derives the class list and stamps
    /// `approved_at`).  A record matching the same name, city and kind
    /// (case-insensitive, any status) is a duplicate and yields
    /// [`StoreError::Conflict`] -- pending requests block re-requests too.
    pub fn create_institution(
        &mut self,
        name: &str,
        city: &str,
        kind: InstitutionKind,
        status: InstitutionStatus,
    ) -> Result<Institution> {
        if status == InstitutionStatus::Rejected {
            return Err(StoreError::InvalidInput(
                "cannot create an institution in rejected status".into(),
            ));
        }

        let name = validation::institution_name(name)?;
        let city = validation::city(city)?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        let classes = derived_classes(kind, status);
        let approved_at = (status == InstitutionStatus::Approved).then_some(now);

        let tx = self.conn_mut().transaction()?;

        // Exact case-insensitive equality on (name, city, kind), regardless
        // of status.
        let duplicate: Option<String> = tx
            .query_row(
                "SELECT id FROM institutions
                 WHERE LOWER(name) = LOWER(?1) AND LOWER(city) = LOWER(?2) AND kind = ?3",
                params![name, city, kind.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        if duplicate.is_some() {
            return Err(StoreError::Conflict(format!(
                "{kind} already exists or is pending approval"
            )));
        }

        tx.execute(
            "INSERT INTO institutions (id, name, city, kind, status, classes, created_at, approved_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id.to_string(),
                name,
                city,
                kind.as_str(),
                status.as_str(),
                serde_json::to_string(&classes)?,
                now.to_rfc3339(),
                approved_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        tx.commit()?;

        tracing::info!(id = %id, %kind, %status, "institution created");

        Ok(Institution {
            id,
            name,
            city,
            kind,
            status,
            classes,
            created_at: now,
            approved_at,
        })
    }

    /// Ensure a default approved school exists.  Called once at startup;
    /// a duplicate is not an error.
    pub fn ensure_default_school(&mut self, name: &str, city: &str) -> Result<()> {
        match self.create_institution(
            name,
            city,
            InstitutionKind::School,
            InstitutionStatus::Approved,
        ) {
            Ok(institution) => {
                tracing::info!(id = %institution.id, name, city, "seeded default school");
                Ok(())
            }
            Err(StoreError::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single institution by UUID.
    pub fn get_institution(&self, id: Uuid) -> Result<Institution> {
        self.conn()
            .query_row(
                &format!("SELECT {INSTITUTION_COLUMNS} FROM institutions WHERE id = ?1"),
                params![id.to_string()],
                row_to_institution,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// Fetch an institution that must be approved.  Pending institutions are
    /// invisible to the public API, so absence and non-approval both map to
    /// [`StoreError::NotFound`].
    pub fn get_approved_institution(&self, id: Uuid) -> Result<Institution> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {INSTITUTION_COLUMNS} FROM institutions
                     WHERE id = ?1 AND status = 'approved'"
                ),
                params![id.to_string()],
                row_to_institution,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })
    }

    /// List institutions, optionally filtered by status, newest first.
    pub fn list_institutions(
        &self,
        status: Option<InstitutionStatus>,
    ) -> Result<Vec<Institution>> {
        let mut out = Vec::new();
        match status {
            Some(status) => {
                let mut stmt = self.conn().prepare(&format!(
                    "SELECT {INSTITUTION_COLUMNS} FROM institutions
                     WHERE status = ?1 ORDER BY created_at DESC"
                ))?;
                let rows = stmt.query_map(params![status.as_str()], row_to_institution)?;
                for row in rows {
                    out.push(row?);
                }
            }
            None => {
                let mut stmt = self.conn().prepare(&format!(
                    "SELECT {INSTITUTION_COLUMNS} FROM institutions ORDER BY created_at DESC"
                ))?;
                let rows = stmt.query_map([], row_to_institution)?;
                for row in rows {
                    out.push(row?);
                }
            }
        }
        Ok(out)
    }

    /// List approved institutions with their thread counts, newest first,
    /// optionally filtered by kind.
    pub fn list_approved_with_thread_counts(
        &self,
        kind: Option<InstitutionKind>,
    ) -> Result<Vec<(Institution, i64)>> {
        let sql = format!(
            "SELECT {cols}, COUNT(t.id)
             FROM institutions i LEFT JOIN threads t ON t.institution_id = i.id
             WHERE i.status = 'approved' {kind_filter}
             GROUP BY i.id
             ORDER BY i.created_at DESC",
            cols = "i.id, i.name, i.city, i.kind, i.status, i.classes, i.created_at, i.approved_at",
            kind_filter = if kind.is_some() { "AND i.kind = ?1" } else { "" },
        );

        let mut stmt = self.conn().prepare(&sql)?;
        let map_row = |row: &rusqlite::Row<'_>| {
            let institution = row_to_institution(row)?;
            let count: i64 = row.get(8)?;
            Ok((institution, count))
        };

        let mut out = Vec::new();
        match kind {
            Some(kind) => {
                let rows = stmt.query_map(params![kind.as_str()], map_row)?;
                for row in rows {
                    out.push(row?);
                }
            }
            None => {
                let rows = stmt.query_map([], map_row)?;
                for row in rows {
                    out.push(row?);
                }
            }
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Lifecycle transitions
    // ------------------------------------------------------------------

    /// Approve a pending institution: set status, stamp `approved_at`, and
    /// derive the class list (full 7-12 set for schools, empty for colleges).
    ///
    /// Fails with [`StoreError::NotFound`] if absent and
    /// [`StoreError::InvalidState`] if the institution is not pending.
    pub fn approve_institution(&mut self, id: Uuid) -> Result<Institution> {
        let tx = self.conn_mut().transaction()?;

        let mut institution = tx
            .query_row(
                &format!("SELECT {INSTITUTION_COLUMNS} FROM institutions WHERE id = ?1"),
                params![id.to_string()],
                row_to_institution,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;

        if institution.status != InstitutionStatus::Pending {
            return Err(StoreError::InvalidState(
                "institution is not pending approval".into(),
            ));
        }

        let now = Utc::now();
        institution.status = InstitutionStatus::Approved;
        institution.classes = derived_classes(institution.kind, InstitutionStatus::Approved);
        institution.approved_at = Some(now);

        tx.execute(
            "UPDATE institutions
             SET status = 'approved', classes = ?2, approved_at = ?3
             WHERE id = ?1",
            params![
                id.to_string(),
                serde_json::to_string(&institution.classes)?,
                now.to_rfc3339(),
            ],
        )?;
        tx.commit()?;

        tracing::info!(id = %id, kind = %institution.kind, "institution approved");
        Ok(institution)
    }

    /// Reject a pending institution.  Rejection is destructive and
    /// irreversible: the record is deleted, not marked.
    ///
    /// Same preconditions as [`Database::approve_institution`].
    pub fn reject_institution(&mut self, id: Uuid) -> Result<()> {
        let tx = self.conn_mut().transaction()?;

        let status: String = tx
            .query_row(
                "SELECT status FROM institutions WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
                other => StoreError::Sqlite(other),
            })?;

        if status != InstitutionStatus::Pending.as_str() {
            return Err(StoreError::InvalidState(
                "institution is not pending approval".into(),
            ));
        }

        tx.execute(
            "DELETE FROM institutions WHERE id = ?1",
            params![id.to_string()],
        )?;
        tx.commit()?;

        tracing::info!(id = %id, "institution request rejected and removed");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Update / Delete
    // ------------------------------------------------------------------

    /// Update an institution's name and city (admin edit).
    pub fn update_institution(&mut self, id: Uuid, name: &str, city: &str) -> Result<Institution> {
        let name = validation::institution_name(name)?;
        let city = validation::city(city)?;

        let affected = self.conn().execute(
            "UPDATE institutions SET name = ?2, city = ?3 WHERE id = ?1",
            params![id.to_string(), name, city],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_institution(id)
    }

    /// Delete an institution and, through the `ON DELETE CASCADE` foreign
    /// keys, all of its threads and their votes.  The cascade is a single
    /// SQLite statement, so there is no partial-failure window.
    pub fn delete_institution(&mut self, id: Uuid) -> Result<()> {
        let affected = self.conn().execute(
            "DELETE FROM institutions WHERE id = ?1",
            params![id.to_string()],
        )?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        tracing::info!(id = %id, "institution deleted with its threads");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to an [`Institution`].
fn row_to_institution(row: &rusqlite::Row<'_>) -> rusqlite::Result<Institution> {
    let id_str: String = row.get(0)?;
    let name: String = row.get(1)?;
    let city: String = row.get(2)?;
    let kind_str: String = row.get(3)?;
    let status_str: String = row.get(4)?;
    let classes_json: String = row.get(5)?;
    let created_str: String = row.get(6)?;
    let approved_str: Option<String> = row.get(7)?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;

    let kind: InstitutionKind = kind_str
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e)))?;

    let status: InstitutionStatus = status_str
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?;

    let classes: Vec<ClassLevel> = serde_json::from_str(&classes_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e)))?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e)))?;

    let approved_at = approved_str
        .map(|s| DateTime::parse_from_rfc3339(&s).map(|dt| dt.with_timezone(&Utc)))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(Institution {
        id,
        name,
        city,
        kind,
        status,
        classes,
        created_at,
        approved_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn request_starts_pending_without_classes() {
        let mut db = db();
        let institution = db
            .create_institution(
                "Test School 123",
                "Chennai",
                InstitutionKind::School,
                InstitutionStatus::Pending,
            )
            .unwrap();

        assert_eq!(institution.status, InstitutionStatus::Pending);
        assert!(institution.classes.is_empty());
        assert!(institution.approved_at.is_none());
    }

    #[test]
    fn duplicate_blocked_while_pending() {
        let mut db = db();
        db.create_institution(
            "Test School 123",
            "Chennai",
            InstitutionKind::School,
            InstitutionStatus::Pending,
        )
        .unwrap();

        let err = db
            .create_institution(
                "Test School 123",
                "Chennai",
                InstitutionKind::School,
                InstitutionStatus::Pending,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn duplicate_check_is_case_insensitive() {
        let mut db = db();
        db.create_institution(
            "Test School",
            "Chennai",
            InstitutionKind::School,
            InstitutionStatus::Pending,
        )
        .unwrap();

        let err = db
            .create_institution(
                "TEST SCHOOL",
                "chennai",
                InstitutionKind::School,
                InstitutionStatus::Pending,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn same_name_different_kind_is_not_a_duplicate() {
        let mut db = db();
        db.create_institution(
            "Test School",
            "Chennai",
            InstitutionKind::School,
            InstitutionStatus::Pending,
        )
        .unwrap();

        assert!(db
            .create_institution(
                "Test School",
                "Chennai",
                InstitutionKind::College,
                InstitutionStatus::Pending,
            )
            .is_ok());
    }

    #[test]
    fn approve_derives_classes_and_stamps_time() {
        let mut db = db();
        let pending = db
            .create_institution(
                "Test School",
                "Chennai",
                InstitutionKind::School,
                InstitutionStatus::Pending,
            )
            .unwrap();

        let approved = db.approve_institution(pending.id).unwrap();
        assert_eq!(approved.status, InstitutionStatus::Approved);
        assert_eq!(approved.classes, ClassLevel::ALL.to_vec());
        assert!(approved.approved_at.is_some());

        // Persisted too, not just on the returned value.
        let reread = db.get_institution(pending.id).unwrap();
        assert_eq!(reread, approved);
    }

    #[test]
    fn approved_college_has_no_classes() {
        let mut db = db();
        let pending = db
            .create_institution(
                "Test College",
                "Chennai",
                InstitutionKind::College,
                InstitutionStatus::Pending,
            )
            .unwrap();

        let approved = db.approve_institution(pending.id).unwrap();
        assert!(approved.classes.is_empty());
        assert!(approved.approved_at.is_some());
    }

    #[test]
    fn approve_twice_is_invalid_state() {
        let mut db = db();
        let pending = db
            .create_institution(
                "Test School",
                "Chennai",
                InstitutionKind::School,
                InstitutionStatus::Pending,
            )
            .unwrap();

        db.approve_institution(pending.id).unwrap();
        let err = db.approve_institution(pending.id).unwrap_err();
        assert!(matches!(err, StoreError::InvalidState(_)));
    }

    #[test]
    fn approve_missing_is_not_found() {
        let mut db = db();
        let err = db.approve_institution(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[test]
    fn reject_deletes_the_record() {
        let mut db = db();
        let pending = db
            .create_institution(
                "Test School",
                "Chennai",
                InstitutionKind::School,
                InstitutionStatus::Pending,
            )
            .unwrap();

        db.reject_institution(pending.id).unwrap();
        assert!(matches!(
            db.get_institution(pending.id),
            Err(StoreError::NotFound)
        ));

        // The name is free again after rejection.
        assert!(db
            .create_institution(
                "Test School",
                "Chennai",
                InstitutionKind::School,
                InstitutionStatus::Pending,
            )
            .is_ok());
    }

    #[test]
    fn reject_approved_is_invalid_state() {
        let mut db = db();
        let institution = db
            .create_institution(
                "Test School",
                "Chennai",
                InstitutionKind::School,
                InstitutionStatus::Approved,
            )
            .unwrap();

        let err = db.reject_institution(institution.id).unwrap_err();
        assert!(matches!(err, StoreError::InvalidState(_)));
    }

    #[test]
    fn admin_create_is_approved_with_classes() {
        let mut db = db();
        let school = db
            .create_institution(
                "Test School",
                "Chennai",
                InstitutionKind::School,
                InstitutionStatus::Approved,
            )
            .unwrap();
        assert_eq!(school.classes, ClassLevel::ALL.to_vec());
        assert!(school.approved_at.is_some());

        let college = db
            .create_institution(
                "Test College",
                "Chennai",
                InstitutionKind::College,
                InstitutionStatus::Approved,
            )
            .unwrap();
        assert!(college.classes.is_empty());
    }

    #[test]
    fn classes_invariant_holds_across_lifecycle() {
        let mut db = db();
        for (name, kind, status) in [
            ("Pending School", InstitutionKind::School, InstitutionStatus::Pending),
            ("Approved School", InstitutionKind::School, InstitutionStatus::Approved),
            ("Pending College", InstitutionKind::College, InstitutionStatus::Pending),
            ("Approved College", InstitutionKind::College, InstitutionStatus::Approved),
        ] {
            db.create_institution(name, "Chennai", kind, status).unwrap();
        }

        for institution in db.list_institutions(None).unwrap() {
            let expect_classes = institution.kind == InstitutionKind::School
                && institution.status == InstitutionStatus::Approved;
            assert_eq!(!institution.classes.is_empty(), expect_classes);
        }
    }

    #[test]
    fn pending_invisible_to_public_lookup() {
        let mut db = db();
        let pending = db
            .create_institution(
                "Test School",
                "Chennai",
                InstitutionKind::School,
                InstitutionStatus::Pending,
            )
            .unwrap();

        assert!(matches!(
            db.get_approved_institution(pending.id),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn list_with_thread_counts_filters_kind() {
        let mut db = db();
        db.create_institution(
            "Test School",
            "Chennai",
            InstitutionKind::School,
            InstitutionStatus::Approved,
        )
        .unwrap();
        db.create_institution(
            "Test College",
            "Chennai",
            InstitutionKind::College,
            InstitutionStatus::Approved,
        )
        .unwrap();

        let all = db.list_approved_with_thread_counts(None).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|(_, count)| *count == 0));

        let schools = db
            .list_approved_with_thread_counts(Some(InstitutionKind::School))
            .unwrap();
        assert_eq!(schools.len(), 1);
        assert_eq!(schools[0].0.kind, InstitutionKind::School);
    }

    #[test]
    fn update_trims_and_validates() {
        let mut db = db();
        let institution = db
            .create_institution(
                "Test School",
                "Chennai",
                InstitutionKind::School,
                InstitutionStatus::Approved,
            )
            .unwrap();

        let updated = db
            .update_institution(institution.id, "  New Name  ", " Mylapore ")
            .unwrap();
        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.city, "Mylapore");

        assert!(matches!(
            db.update_institution(institution.id, "ab", "Chennai"),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn seeding_is_idempotent() {
        let mut db = db();
        db.ensure_default_school("Vidya Mandir", "Mylapore").unwrap();
        db.ensure_default_school("Vidya Mandir", "Mylapore").unwrap();

        let all = db.list_institutions(None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, InstitutionStatus::Approved);
    }
}
