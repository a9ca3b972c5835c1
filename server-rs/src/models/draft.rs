use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::codec::{ensure_object, flexible_datetime};
use crate::error::{AppError, AppResult};

/// A creator's in-progress league submission. One per (org, creator).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Draft {
    pub id: i64,
    pub org_id: Uuid,
    pub created_by: String,
    pub draft_data: Value,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Template {
    pub id: i64,
    pub org_id: Uuid,
    pub name: String,
    pub template_data: Value,
    pub created_by: String,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SaveDraftRequest {
    pub draft_data: Value,
}

impl SaveDraftRequest {
    pub fn validate(&self) -> AppResult<()> {
        ensure_object(&self.draft_data, "draft_data")
    }
}

#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    pub name: String,
    pub template_data: Value,
}

impl TemplateRequest {
    pub fn validate(&self) -> AppResult<()> {
        let len = self.name.trim().chars().count();
        if len == 0 || len > 200 {
            return Err(AppError::Validation("name must be 1-200 characters".into()));
        }
        ensure_object(&self.template_data, "template_data")
    }
}

#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub org_id: Uuid,
    pub name: String,
    pub template_data: Value,
    pub created_by: String,
}

#[derive(Debug, Deserialize)]
pub struct OrgQuery {
    pub org_id: Uuid,
}
