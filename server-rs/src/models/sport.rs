use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::flexible_datetime;
use crate::error::{AppError, AppResult};
use crate::models::{Submission, SubmissionKind, SubmissionStatus};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sport {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: SubmissionStatus,
    pub rejection_reason: Option<String>,
    pub created_by: String,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Submission for Sport {
    const KIND: SubmissionKind = SubmissionKind::Sport;

    fn id(&self) -> i64 {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> SubmissionStatus {
        self.status
    }

    fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    fn created_by(&self) -> &str {
        &self.created_by
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSportRequest {
    pub name: String,
    pub description: Option<String>,
}

impl CreateSportRequest {
    pub fn validate(&self) -> AppResult<()> {
        let len = self.name.trim().chars().count();
        if len == 0 || len > 100 {
            return Err(AppError::Validation("name must be 1-100 characters".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewSport {
    pub name: String,
    pub description: Option<String>,
    pub status: SubmissionStatus,
    pub created_by: String,
}

#[derive(Debug, Deserialize)]
pub struct SportExistsQuery {
    #[serde(default)]
    pub name: String,
}
