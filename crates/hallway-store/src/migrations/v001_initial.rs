//! v001 -- Initial schema creation.
//!
//! Creates the five core tables: `institutions`, `threads`, `votes`,
//! `suggestions`, and `announcement`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Institutions (schools and colleges)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS institutions (
    id          TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    name        TEXT NOT NULL,
    city        TEXT NOT NULL,
    kind        TEXT NOT NULL,               -- 'school' | 'college'
    status      TEXT NOT NULL,               -- 'pending' | 'approved'
    classes     TEXT NOT NULL DEFAULT '[]',  -- JSON array of class labels
    created_at  TEXT NOT NULL,               -- ISO-8601 / RFC-3339
    approved_at TEXT                         -- set once on approval
);

CREATE INDEX IF NOT EXISTS idx_institutions_status ON institutions(status);

-- ----------------------------------------------------------------
-- Threads ("rumors")
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS threads (
    id             TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    institution_id TEXT NOT NULL,              -- FK -> institutions(id)
    class          TEXT,                       -- '7'..'12', NULL for colleges
    content        TEXT NOT NULL,
    upvotes        INTEGER NOT NULL DEFAULT 0,
    downvotes      INTEGER NOT NULL DEFAULT 0,
    created_at     TEXT NOT NULL,

    FOREIGN KEY (institution_id) REFERENCES institutions(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_threads_institution_created
    ON threads(institution_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_threads_institution_class
    ON threads(institution_id, class, created_at DESC);

-- ----------------------------------------------------------------
-- Votes (one per thread per anonymous fingerprint)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS votes (
    id          TEXT PRIMARY KEY NOT NULL,    -- UUID v4
    thread_id   TEXT NOT NULL,                -- FK -> threads(id)
    fingerprint TEXT NOT NULL,                -- opaque anonymous identity
    kind        TEXT NOT NULL,                -- 'upvote' | 'downvote'
    created_at  TEXT NOT NULL,

    FOREIGN KEY (thread_id) REFERENCES threads(id) ON DELETE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_votes_thread_fingerprint
    ON votes(thread_id, fingerprint);

-- ----------------------------------------------------------------
-- Suggestions
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS suggestions (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_suggestions_created ON suggestions(created_at DESC);

-- ----------------------------------------------------------------
-- Announcement (singleton row, id fixed at 1)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS announcement (
    id         INTEGER PRIMARY KEY CHECK (id = 1),
    content    TEXT NOT NULL DEFAULT '',
    is_active  INTEGER NOT NULL DEFAULT 0,    -- boolean 0/1
    updated_at TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
