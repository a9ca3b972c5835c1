//! Approval lifecycle shared by leagues, sports and venues.
//!
//! ```text
//!                 approve
//!    [pending] ──────────► [approved]
//!        │ reject(reason)
//!        └─────────────► [rejected]
//! ```
//!
//! Admins may also revisit a rejection: approving a rejected record clears
//! the reason, and rejecting it again overwrites the reason. Approving an
//! approved record is a no-op. Rejecting an approved (published) record is
//! refused.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{AppError, AppResult};
use crate::models::{GlobalRole, ParseEnumError};

pub const MAX_REJECTION_REASON_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    /// Admin submissions are published immediately.
    pub fn initial_for(role: GlobalRole) -> Self {
        match role {
            GlobalRole::Admin => SubmissionStatus::Approved,
            GlobalRole::User => SubmissionStatus::Pending,
        }
    }

    pub fn approve(self) -> Transition {
        match self {
            SubmissionStatus::Approved => Transition::Unchanged,
            SubmissionStatus::Pending | SubmissionStatus::Rejected => Transition::Apply {
                status: SubmissionStatus::Approved,
                rejection_reason: None,
            },
        }
    }

    pub fn reject(self, reason: &str) -> AppResult<Transition> {
        let reason = validate_rejection_reason(reason)?;
        match self {
            SubmissionStatus::Approved => Err(AppError::Conflict(
                "an approved submission cannot be rejected".into(),
            )),
            SubmissionStatus::Pending | SubmissionStatus::Rejected => Ok(Transition::Apply {
                status: SubmissionStatus::Rejected,
                rejection_reason: Some(reason),
            }),
        }
    }
}

impl FromStr for SubmissionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SubmissionStatus::Pending),
            "approved" => Ok(SubmissionStatus::Approved),
            "rejected" => Ok(SubmissionStatus::Rejected),
            other => Err(ParseEnumError {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for SubmissionStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Apply {
        status: SubmissionStatus,
        rejection_reason: Option<String>,
    },
    Unchanged,
}

pub fn validate_rejection_reason(raw: &str) -> AppResult<String> {
    let reason = raw.trim();
    let len = reason.chars().count();
    if len == 0 {
        return Err(AppError::Validation("rejection_reason is required".into()));
    }
    if len > MAX_REJECTION_REASON_CHARS {
        return Err(AppError::Validation(format!(
            "rejection_reason must be at most {MAX_REJECTION_REASON_CHARS} characters"
        )));
    }
    Ok(reason.to_string())
}

/// The three approvable entity families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    League,
    Sport,
    Venue,
}

impl SubmissionKind {
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionKind::League => "League",
            SubmissionKind::Sport => "Sport",
            SubmissionKind::Venue => "Venue",
        }
    }

    pub fn approved_notification(&self) -> &'static str {
        match self {
            SubmissionKind::League => crate::models::notification::kinds::LEAGUE_APPROVED,
            SubmissionKind::Sport => crate::models::notification::kinds::SPORT_APPROVED,
            SubmissionKind::Venue => crate::models::notification::kinds::VENUE_APPROVED,
        }
    }

    pub fn rejected_notification(&self) -> &'static str {
        match self {
            SubmissionKind::League => crate::models::notification::kinds::LEAGUE_REJECTED,
            SubmissionKind::Sport => crate::models::notification::kinds::SPORT_REJECTED,
            SubmissionKind::Venue => crate::models::notification::kinds::VENUE_REJECTED,
        }
    }
}

/// Common view over a league, sport or venue row.
pub trait Submission {
    const KIND: SubmissionKind;

    fn id(&self) -> i64;
    fn display_name(&self) -> &str;
    fn status(&self) -> SubmissionStatus;
    fn rejection_reason(&self) -> Option<&str>;
    fn created_by(&self) -> &str;
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub rejection_reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_status_depends_on_creator_role() {
        assert_eq!(
            SubmissionStatus::initial_for(GlobalRole::Admin),
            SubmissionStatus::Approved
        );
        assert_eq!(
            SubmissionStatus::initial_for(GlobalRole::User),
            SubmissionStatus::Pending
        );
    }

    #[test]
    fn approve_is_idempotent() {
        let first = SubmissionStatus::Pending.approve();
        assert_eq!(
            first,
            Transition::Apply {
                status: SubmissionStatus::Approved,
                rejection_reason: None
            }
        );
        assert_eq!(SubmissionStatus::Approved.approve(), Transition::Unchanged);
    }

    #[test]
    fn approving_a_rejection_clears_the_reason() {
        assert_eq!(
            SubmissionStatus::Rejected.approve(),
            Transition::Apply {
                status: SubmissionStatus::Approved,
                rejection_reason: None
            }
        );
    }

    #[test]
    fn rejecting_twice_keeps_the_latest_reason() {
        let t = SubmissionStatus::Rejected.reject("  missing venue  ").unwrap();
        assert_eq!(
            t,
            Transition::Apply {
                status: SubmissionStatus::Rejected,
                rejection_reason: Some("missing venue".into())
            }
        );
    }

    #[test]
    fn published_records_cannot_be_rejected() {
        assert!(matches!(
            SubmissionStatus::Approved.reject("late"),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn reason_bounds() {
        assert!(matches!(
            SubmissionStatus::Pending.reject("   "),
            Err(AppError::Validation(_))
        ));
        let long = "x".repeat(MAX_REJECTION_REASON_CHARS + 1);
        assert!(matches!(
            SubmissionStatus::Pending.reject(&long),
            Err(AppError::Validation(_))
        ));
        let max = "x".repeat(MAX_REJECTION_REASON_CHARS);
        assert!(SubmissionStatus::Pending.reject(&max).is_ok());
    }

    #[test]
    fn status_round_trips_through_text_column() {
        for s in ["pending", "approved", "rejected"] {
            assert_eq!(SubmissionStatus::try_from(s.to_string()).unwrap().as_str(), s);
        }
        assert!(SubmissionStatus::try_from("archived".to_string()).is_err());
    }
}
