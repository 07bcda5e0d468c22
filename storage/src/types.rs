//! Domain records shared by every store backend.
//!
//! Enum values are stored as TEXT in both PostgreSQL and SQLite using the
//! same spelling they have on the wire (`NOT_REVIEWED`, `IN_PROGRESS`, ...).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value that does not name any variant of the target enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Upper-cases and maps spaces/hyphens to underscores, so `"in progress"`,
/// `"In-Progress"` and `"IN_PROGRESS"` all read the same.
fn normalize(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

// ============================================================================
// ENUMS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    NotReviewed,
    Approved,
    Denied,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::NotReviewed => "NOT_REVIEWED",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Denied => "DENIED",
        }
    }

    /// Approved and denied requests never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::NotReviewed)
    }
}

impl FromStr for RequestStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "NOT_REVIEWED" => Ok(RequestStatus::NotReviewed),
            "APPROVED" => Ok(RequestStatus::Approved),
            "DENIED" => Ok(RequestStatus::Denied),
            _ => Err(UnknownVariant {
                kind: "request status",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeStatus {
    Unclaimed,
    InProgress,
    Completed,
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeStatus::Unclaimed => "UNCLAIMED",
            ChallengeStatus::InProgress => "IN_PROGRESS",
            ChallengeStatus::Completed => "COMPLETED",
        }
    }

    /// Decides what moving from `self` to `target` means.
    ///
    /// Status only moves forward, except that a claimant may hand an
    /// in-progress challenge back (release), which also clears the claimant.
    /// Leaving `Unclaimed` is only possible through a claim.
    pub fn transition_to(self, target: ChallengeStatus) -> Result<StatusChange, String> {
        use ChallengeStatus::*;

        match (self, target) {
            (from, to) if from == to => Ok(StatusChange::Unchanged),
            (InProgress, Completed) => Ok(StatusChange::Advance),
            (InProgress, Unclaimed) => Ok(StatusChange::Release),
            (Unclaimed, _) => Err(format!(
                "challenge is UNCLAIMED; it must be claimed before moving to {}",
                target
            )),
            (Completed, _) => Err(format!(
                "challenge is COMPLETED and cannot move to {}",
                target
            )),
            (from, to) => Err(format!("cannot move challenge from {} to {}", from, to)),
        }
    }
}

impl FromStr for ChallengeStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "UNCLAIMED" => Ok(ChallengeStatus::Unclaimed),
            "IN_PROGRESS" => Ok(ChallengeStatus::InProgress),
            "COMPLETED" => Ok(ChallengeStatus::Completed),
            _ => Err(UnknownVariant {
                kind: "challenge status",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an accepted status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// Target equals the current status; nothing is written.
    Unchanged,
    /// Status moves forward, claimant kept.
    Advance,
    /// Back to `Unclaimed`, claimant cleared.
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }
}

impl FromStr for Difficulty {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "EASY" => Ok(Difficulty::Easy),
            "MEDIUM" => Ok(Difficulty::Medium),
            "HARD" => Ok(Difficulty::Hard),
            _ => Err(UnknownVariant {
                kind: "difficulty",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// RECORDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub ingredient_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    pub request_id: i64,
    pub requested_by_id: i64,
    pub description: String,
    pub status: RequestStatus,
    pub reviewed_by_id: Option<i64>,
    pub date_submitted: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub challenge_id: i64,
    /// Request this challenge was approved from.
    pub request_id: i64,
    pub description: String,
    pub approved_by_id: i64,
    pub difficulty: Option<Difficulty>,
    pub status: ChallengeStatus,
    pub claimed_by_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Input for a new challenge request. Ingredient ids are expected to be
/// de-duplicated by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChallengeRequest {
    pub requested_by_id: i64,
    pub description: String,
    pub ingredient_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub requested_by_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChallengeFilter {
    pub status: Option<ChallengeStatus>,
    pub difficulty: Option<Difficulty>,
    pub claimed_by_id: Option<i64>,
}
