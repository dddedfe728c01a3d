//! Domain model structs persisted in the SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to the HTTP layer.  Wire field names are camelCase to match the
//! public JSON API.

use chrono::{DateTime, Utc};
use hallway_shared::{ClassLevel, InstitutionKind, InstitutionStatus, VoteKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Institution
// ---------------------------------------------------------------------------

/// A school or college.  Created pending, then approved or rejected by an
/// admin; rejection deletes the record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Institution {
    /// Unique institution identifier.
    pub id: Uuid,
    /// Display name (3-39 chars, trimmed).
    pub name: String,
    /// City (3-14 chars, trimmed).
    pub city: String,
    /// School or college.
    pub kind: InstitutionKind,
    /// Lifecycle status.
    pub status: InstitutionStatus,
    /// Class labels; the full 7-12 set for approved schools, empty otherwise.
    pub classes: Vec<ClassLevel>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the institution was approved, if it has been.
    pub approved_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Thread ("rumor")
// ---------------------------------------------------------------------------

/// An anonymous post scoped to an institution (and, for schools, a class).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Unique thread identifier.
    pub id: Uuid,
    /// The institution this thread belongs to.
    pub institution_id: Uuid,
    /// Class label; present iff the institution is a school.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<ClassLevel>,
    /// Post body (10-10000 chars, trimmed).
    pub content: String,
    /// Denormalized upvote counter, kept in sync with the vote ledger.
    pub upvotes: i64,
    /// Denormalized downvote counter.
    pub downvotes: i64,
    /// When the thread was posted.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Vote
// ---------------------------------------------------------------------------

/// One ledger entry per (thread, fingerprint) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    /// Unique vote identifier.
    pub id: Uuid,
    /// The thread voted on.
    pub thread_id: Uuid,
    /// Opaque anonymous identity of the voter.
    pub fingerprint: String,
    /// Upvote or downvote.
    pub kind: VoteKind,
    /// When the vote was first cast.
    pub created_at: DateTime<Utc>,
}

/// Result of a vote transition: the thread's updated counters and the
/// caller's vote state after the transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub upvotes: i64,
    pub downvotes: i64,
    /// `None` after an un-vote.
    pub user_vote: Option<VoteKind>,
}

// ---------------------------------------------------------------------------
// Suggestion
// ---------------------------------------------------------------------------

/// A timestamped feedback note from a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Announcement
// ---------------------------------------------------------------------------

/// Site-wide banner text.  Singleton; active iff content is non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub content: String,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Admin stats
// ---------------------------------------------------------------------------

/// A thread joined with its institution's name, for the admin overview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ThreadWithInstitution {
    #[serde(flatten)]
    pub thread: Thread,
    pub institution_name: String,
}

/// Aggregate counts shown on the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BoardStats {
    /// Approved institutions.
    pub total_institutions: i64,
    /// All threads.
    pub total_threads: i64,
    /// Threads posted in the last seven days.
    pub recent_threads: i64,
    /// The ten most recent threads with their institution names.
    pub latest: Vec<ThreadWithInstitution>,
}
