use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string value did not match any variant of a domain enum.
#[derive(Debug, Error)]
#[error("unrecognized value: {0}")]
pub struct ParseEnumError(pub String);

// ---------------------------------------------------------------------------
// Institution kind
// ---------------------------------------------------------------------------

/// What sort of institution a record describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InstitutionKind {
    School,
    College,
}

impl InstitutionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstitutionKind::School => "school",
            InstitutionKind::College => "college",
        }
    }
}

impl std::str::FromStr for InstitutionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "school" => Ok(InstitutionKind::School),
            "college" => Ok(InstitutionKind::College),
            other => Err(ParseEnumError(other.to_string())),
        }
    }
}

impl std::fmt::Display for InstitutionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Institution status
// ---------------------------------------------------------------------------

/// Lifecycle state of an institution.
///
/// `Rejected` exists in the vocabulary but is never persisted: rejecting a
/// pending request deletes the record outright.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InstitutionStatus {
    Pending,
    Approved,
    Rejected,
}

impl InstitutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstitutionStatus::Pending => "pending",
            InstitutionStatus::Approved => "approved",
            InstitutionStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for InstitutionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InstitutionStatus::Pending),
            "approved" => Ok(InstitutionStatus::Approved),
            "rejected" => Ok(InstitutionStatus::Rejected),
            other => Err(ParseEnumError(other.to_string())),
        }
    }
}

impl std::fmt::Display for InstitutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Class level
// ---------------------------------------------------------------------------

/// School class labels 7 through 12.  Colleges have none.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ClassLevel {
    #[serde(rename = "7")]
    Seventh,
    #[serde(rename = "8")]
    Eighth,
    #[serde(rename = "9")]
    Ninth,
    #[serde(rename = "10")]
    Tenth,
    #[serde(rename = "11")]
    Eleventh,
    #[serde(rename = "12")]
    Twelfth,
}

impl ClassLevel {
    /// All class levels, in ascending order.  This is the class list every
    /// approved school receives.
    pub const ALL: [ClassLevel; 6] = [
        ClassLevel::Seventh,
        ClassLevel::Eighth,
        ClassLevel::Ninth,
        ClassLevel::Tenth,
        ClassLevel::Eleventh,
        ClassLevel::Twelfth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassLevel::Seventh => "7",
            ClassLevel::Eighth => "8",
            ClassLevel::Ninth => "9",
            ClassLevel::Tenth => "10",
            ClassLevel::Eleventh => "11",
            ClassLevel::Twelfth => "12",
        }
    }
}

impl std::str::FromStr for ClassLevel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7" => Ok(ClassLevel::Seventh),
            "8" => Ok(ClassLevel::Eighth),
            "9" => Ok(ClassLevel::Ninth),
            "10" => Ok(ClassLevel::Tenth),
            "11" => Ok(ClassLevel::Eleventh),
            "12" => Ok(ClassLevel::Twelfth),
            other => Err(ParseEnumError(other.to_string())),
        }
    }
}

impl std::fmt::Display for ClassLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Vote kind
// ---------------------------------------------------------------------------

/// Direction of a vote on a thread.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VoteKind {
    Upvote,
    Downvote,
}

impl VoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteKind::Upvote => "upvote",
            VoteKind::Downvote => "downvote",
        }
    }
}

impl std::str::FromStr for VoteKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upvote" => Ok(VoteKind::Upvote),
            "downvote" => Ok(VoteKind::Downvote),
            other => Err(ParseEnumError(other.to_string())),
        }
    }
}

impl std::fmt::Display for VoteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trip() {
        for kind in [InstitutionKind::School, InstitutionKind::College] {
            assert_eq!(kind.as_str().parse::<InstitutionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn class_level_round_trip() {
        for level in ClassLevel::ALL {
            assert_eq!(level.as_str().parse::<ClassLevel>().unwrap(), level);
        }
    }

    #[test]
    fn class_level_rejects_out_of_range() {
        assert!("6".parse::<ClassLevel>().is_err());
        assert!("13".parse::<ClassLevel>().is_err());
    }

    #[test]
    fn vote_kind_serde_is_lowercase() {
        let json = serde_json::to_string(&VoteKind::Upvote).unwrap();
        assert_eq!(json, "\"upvote\"");
    }
}
