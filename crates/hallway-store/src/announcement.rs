//! The site-wide [`Announcement`] singleton.
//!
//! Exactly one row (id = 1) ever exists; it is created lazily on first read.
//! Setting non-empty content activates the banner, setting empty content
//! deactivates it.

use chrono::{DateTime, Utc};
use hallway_shared::validation;
use rusqlite::params;

use crate::database::Database;
use crate::error::Result;
use crate::models::Announcement;

impl Database {
    /// Fetch the announcement, creating an empty inactive one if missing.
    pub fn get_announcement(&mut self) -> Result<Announcement> {
        self.conn().execute(
            "INSERT OR IGNORE INTO announcement (id, content, is_active, updated_at)
             VALUES (1, '', 0, ?1)",
            params![Utc::now().to_rfc3339()],
        )?;

        self.conn()
            .query_row(
                "SELECT content, is_active, updated_at FROM announcement WHERE id = 1",
                [],
                row_to_announcement,
            )
            .map_err(Into::into)
    }

    /// Fetch the announcement only if it is active with content.
    pub fn active_announcement(&mut self) -> Result<Option<Announcement>> {
        let announcement = self.get_announcement()?;
        Ok((announcement.is_active && !announcement.content.is_empty()).then_some(announcement))
    }

    /// Replace the announcement content (up to 200 chars after trimming).
    /// Non-empty content activates the banner; empty content clears it.
    pub fn update_announcement(&mut self, content: &str) -> Result<Announcement> {
        let content = validation::announcement_content(content)?;
        let is_active = !content.is_empty();
        let now = Utc::now();

        self.conn().execute(
            "INSERT OR REPLACE INTO announcement (id, content, is_active, updated_at)
             VALUES (1, ?1, ?2, ?3)",
            params![content, is_active, now.to_rfc3339()],
        )?;

        tracing::info!(is_active, "announcement updated");

        Ok(Announcement {
            content,
            is_active,
            updated_at: now,
        })
    }
}

/// Map a `rusqlite::Row` to an [`Announcement`].
fn row_to_announcement(row: &rusqlite::Row<'_>) -> rusqlite::Result<Announcement> {
    let content: String = row.get(0)?;
    let is_active: bool = row.get(1)?;
    let updated_str: String = row.get(2)?;

    let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&updated_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(Announcement {
        content,
        is_active,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn lazily_created_empty_and_inactive() {
        let mut db = Database::open_in_memory().unwrap();
        let announcement = db.get_announcement().unwrap();
        assert_eq!(announcement.content, "");
        assert!(!announcement.is_active);
        assert!(db.active_announcement().unwrap().is_none());
    }

    #[test]
    fn setting_content_activates() {
        let mut db = Database::open_in_memory().unwrap();
        let announcement = db.update_announcement("  exams next week  ").unwrap();
        assert_eq!(announcement.content, "exams next week");
        assert!(announcement.is_active);

        let active = db.active_announcement().unwrap().unwrap();
        assert_eq!(active.content, "exams next week");
    }

    #[test]
    fn clearing_content_deactivates() {
        let mut db = Database::open_in_memory().unwrap();
        db.update_announcement("exams next week").unwrap();
        db.update_announcement("").unwrap();
        assert!(db.active_announcement().unwrap().is_none());
    }

    #[test]
    fn over_long_content_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.update_announcement(&"x".repeat(201)),
            Err(StoreError::InvalidInput(_))
        ));
    }
}
