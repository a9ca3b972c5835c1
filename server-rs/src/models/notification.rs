use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::flexible_datetime;

pub mod kinds {
    pub const LEAGUE_APPROVED: &str = "league_approved";
    pub const LEAGUE_REJECTED: &str = "league_rejected";
    pub const LEAGUE_SUBMITTED: &str = "league_submitted";
    pub const DRAFT_SAVED: &str = "draft_saved";
    pub const TEMPLATE_SAVED: &str = "template_saved";
    pub const SPORT_APPROVED: &str = "sport_approved";
    pub const SPORT_REJECTED: &str = "sport_rejected";
    pub const VENUE_APPROVED: &str = "venue_approved";
    pub const VENUE_REJECTED: &str = "venue_rejected";
}

/// Durable notification row. Serialized camel-case, which is also the
/// broadcast payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub league_id: Option<i64>,
    pub organization_id: Option<Uuid>,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub league_id: Option<i64>,
    pub organization_id: Option<Uuid>,
}

impl NewNotification {
    pub fn new(
        user_id: impl Into<String>,
        kind: &str,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            kind: kind.to_string(),
            title: title.into(),
            message: message.into(),
            league_id: None,
            organization_id: None,
        }
    }

    pub fn league(mut self, league_id: i64) -> Self {
        self.league_id = Some(league_id);
        self
    }

    pub fn organization(mut self, org_id: Uuid) -> Self {
        self.organization_id = Some(org_id);
        self
    }
}

/// Message sent once on the admin-wide channel for a fan-out.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAnnouncement {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub league_id: Option<i64>,
    pub organization_id: Option<Uuid>,
    pub recipients: usize,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub user_id: String,
    pub league_approved: bool,
    pub league_rejected: bool,
    pub league_submitted: bool,
    pub draft_saved: bool,
    pub template_saved: bool,
}

impl NotificationPreferences {
    pub fn all_enabled(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            league_approved: true,
            league_rejected: true,
            league_submitted: true,
            draft_saved: true,
            template_saved: true,
        }
    }

    /// Types without a preference flag are always delivered.
    pub fn allows(&self, kind: &str) -> bool {
        match kind {
            kinds::LEAGUE_APPROVED => self.league_approved,
            kinds::LEAGUE_REJECTED => self.league_rejected,
            kinds::LEAGUE_SUBMITTED => self.league_submitted,
            kinds::DRAFT_SAVED => self.draft_saved,
            kinds::TEMPLATE_SAVED => self.template_saved,
            _ => true,
        }
    }

    pub fn apply(&mut self, changes: &PreferenceChanges) {
        if let Some(v) = changes.league_approved {
            self.league_approved = v;
        }
        if let Some(v) = changes.league_rejected {
            self.league_rejected = v;
        }
        if let Some(v) = changes.league_submitted {
            self.league_submitted = v;
        }
        if let Some(v) = changes.draft_saved {
            self.draft_saved = v;
        }
        if let Some(v) = changes.template_saved {
            self.template_saved = v;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceChanges {
    pub league_approved: Option<bool>,
    pub league_rejected: Option<bool>,
    pub league_submitted: Option<bool>,
    pub draft_saved: Option<bool>,
    pub template_saved: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_types_default_to_enabled() {
        let mut prefs = NotificationPreferences::all_enabled("u1");
        prefs.apply(&PreferenceChanges {
            league_approved: Some(false),
            ..Default::default()
        });
        assert!(!prefs.allows(kinds::LEAGUE_APPROVED));
        assert!(prefs.allows(kinds::LEAGUE_REJECTED));
        assert!(prefs.allows(kinds::SPORT_APPROVED));
        assert!(prefs.allows("something_new"));
    }

    #[test]
    fn serializes_camel_case_with_type_field() {
        let n = Notification {
            id: 7,
            user_id: "u2".into(),
            kind: kinds::LEAGUE_APPROVED.into(),
            title: "League approved".into(),
            message: "ok".into(),
            read: false,
            league_id: Some(3),
            organization_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let v = serde_json::to_value(&n).unwrap();
        assert_eq!(v["type"], "league_approved");
        assert_eq!(v["userId"], "u2");
        assert_eq!(v["leagueId"], 3);
        assert!(v["createdAt"].as_str().unwrap().ends_with('Z'));
    }
}
