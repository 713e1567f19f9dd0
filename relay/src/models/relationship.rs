//! Relationship rows and the status domain

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Status of a relationship row, as seen by the row's owner.
///
/// "No relationship" is not a variant: it is the absence of a row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    /// Owner sent a request the counterparty has not answered
    Outgoing,
    /// Counterparty sent a request the owner has not answered
    Incoming,
    /// Both sides accepted
    Friend,
    /// Owner blocked the counterparty
    Blocked,
    /// Counterparty blocked the owner
    BlockedOther,
}

impl RelationshipStatus {
    /// Status the mirror row must hold when this row holds `self`.
    pub fn complement(self) -> Self {
        match self {
            Self::Outgoing => Self::Incoming,
            Self::Incoming => Self::Outgoing,
            Self::Friend => Self::Friend,
            Self::Blocked => Self::BlockedOther,
            Self::BlockedOther => Self::Blocked,
        }
    }

    /// Stored representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outgoing => "outgoing",
            Self::Incoming => "incoming",
            Self::Friend => "friend",
            Self::Blocked => "blocked",
            Self::BlockedOther => "blocked_other",
        }
    }
}

impl fmt::Display for RelationshipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "outgoing" => Ok(Self::Outgoing),
            "incoming" => Ok(Self::Incoming),
            "friend" => Ok(Self::Friend),
            "blocked" => Ok(Self::Blocked),
            "blocked_other" => Ok(Self::BlockedOther),
            other => Err(format!("Invalid relationship status: {}", other)),
        }
    }
}

/// One perspective of a logical relationship.
///
/// Every stored row has a mirror with `owner` and `counterparty` swapped and
/// the complementary status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Relationship {
    /// Row identifier
    pub id: Uuid,

    /// Whose perspective this row records
    pub owner: Uuid,

    /// The other participant
    pub counterparty: Uuid,

    /// Status from the owner's point of view
    pub status: RelationshipStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Relationship {
    /// Status of this relationship as seen by `observer`.
    ///
    /// Derived from this single row: the counterparty's view is the
    /// complement of the owner's. Returns `None` when `observer` is not a
    /// participant.
    pub fn status_for(&self, observer: Uuid) -> Option<RelationshipStatus> {
        if self.owner == observer {
            Some(self.status)
        } else if self.counterparty == observer {
            Some(self.status.complement())
        } else {
            None
        }
    }
}
