use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::codec::{flexible_datetime, flexible_datetime_opt};
use crate::models::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobalRole {
    User,
    Admin,
}

impl GlobalRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalRole::User => "user",
            GlobalRole::Admin => "admin",
        }
    }
}

impl FromStr for GlobalRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(GlobalRole::User),
            "admin" => Ok(GlobalRole::Admin),
            other => Err(ParseEnumError {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for GlobalRole {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: GlobalRole,
    pub is_active: bool,
    #[serde(with = "flexible_datetime_opt", default)]
    pub last_login: Option<DateTime<Utc>>,
    pub login_count: i32,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active_admin(&self) -> bool {
        self.is_active && self.role == GlobalRole::Admin
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub role: GlobalRole,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(rename = "clerkID")]
    pub clerk_id: String,
    #[serde(default)]
    pub email: String,
    /// Legacy field: when present the registrant's first organization is created.
    #[serde(rename = "organizationName", default)]
    pub organization_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "sessionID")]
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateActiveRequest {
    pub active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: User,
    pub supabase_token: String,
}
