//! CRUD operations for [`Suggestion`] records.

use chrono::{DateTime, Utc};
use hallway_shared::validation;
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::Result;
use crate::models::Suggestion;

impl Database {
    /// Insert a new suggestion (10-500 chars after trimming).
    pub fn create_suggestion(&mut self, content: &str) -> Result<Suggestion> {
        let content = validation::suggestion_content(content)?;

        let suggestion = Suggestion {
            id: Uuid::new_v4(),
            content,
            created_at: Utc::now(),
        };

        self.conn().execute(
            "INSERT INTO suggestions (id, content, created_at) VALUES (?1, ?2, ?3)",
            params![
                suggestion.id.to_string(),
                suggestion.content,
                suggestion.created_at.to_rfc3339(),
            ],
        )?;
        Ok(suggestion)
    }

    /// List all suggestions, newest first.
    pub fn list_suggestions(&self) -> Result<Vec<Suggestion>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, content, created_at FROM suggestions ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], row_to_suggestion)?;

        let mut suggestions = Vec::new();
        for row in rows {
            suggestions.push(row?);
        }
        Ok(suggestions)
    }

    /// Delete a suggestion by UUID.  Returns `true` if a row was deleted.
    pub fn delete_suggestion(&mut self, id: Uuid) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM suggestions WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(affected > 0)
    }
}

/// Map a `rusqlite::Row` to a [`Suggestion`].
fn row_to_suggestion(row: &rusqlite::Row<'_>) -> rusqlite::Result<Suggestion> {
    let id_str: String = row.get(0)?;
    let content: String = row.get(1)?;
    let created_str: String = row.get(2)?;

    let id = Uuid::parse_str(&id_str)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e)))?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(Suggestion {
        id,
        content,
        created_at,
    })
}
