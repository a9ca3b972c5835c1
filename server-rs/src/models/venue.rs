use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::flexible_datetime;
use crate::error::{AppError, AppResult};
use crate::models::{Submission, SubmissionKind, SubmissionStatus};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[sqlx(try_from = "String")]
    pub status: SubmissionStatus,
    pub rejection_reason: Option<String>,
    pub created_by: String,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Submission for Venue {
    const KIND: SubmissionKind = SubmissionKind::Venue;

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
pub struct CreateVenueRequest {
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CreateVenueRequest {
    pub fn validate(&self) -> AppResult<()> {
        let name_len = self.name.trim().chars().count();
        if name_len == 0 || name_len > 200 {
            return Err(AppError::Validation("name must be 1-200 characters".into()));
        }
        let addr_len = self.address.trim().chars().count();
        if addr_len == 0 || addr_len > 500 {
            return Err(AppError::Validation("address must be 1-500 characters".into()));
        }
        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(AppError::Validation("latitude must be within [-90, 90]".into()));
            }
        }
        if let Some(lng) = self.longitude {
            if !(-180.0..=180.0).contains(&lng) {
                return Err(AppError::Validation(
                    "longitude must be within [-180, 180]".into(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewVenue {
    pub name: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: SubmissionStatus,
    pub created_by: String,
}

#[derive(Debug, Deserialize)]
pub struct VenueExistsQuery {
    #[serde(default)]
    pub address: String,
}
