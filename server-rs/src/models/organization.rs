use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::codec::flexible_datetime;
use crate::error::{AppError, AppResult};
use crate::models::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    Owner,
    Admin,
    Member,
}

impl OrgRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Owner => "owner",
            OrgRole::Admin => "admin",
            OrgRole::Member => "member",
        }
    }

    pub fn can_manage(&self) -> bool {
        matches!(self, OrgRole::Owner | OrgRole::Admin)
    }
}

impl FromStr for OrgRole {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(OrgRole::Owner),
            "admin" => Ok(OrgRole::Admin),
            "member" => Ok(OrgRole::Member),
            other => Err(ParseEnumError {
                kind: "organization role",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for OrgRole {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_by: String,
    pub is_deleted: bool,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrgMembership {
    pub user_id: String,
    pub org_id: Uuid,
    #[sqlx(try_from = "String")]
    pub role: OrgRole,
    pub is_active: bool,
    #[serde(with = "flexible_datetime")]
    pub joined_at: DateTime<Utc>,
}

/// An organization as seen by one of its members.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationWithRole {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub organization: Organization,
    #[sqlx(try_from = "String")]
    pub role: OrgRole,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrgMember {
    pub user_id: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: OrgRole,
    #[serde(with = "flexible_datetime")]
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    pub url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_by: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationChanges {
    pub name: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl OrganizationChanges {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(name) = &self.name {
            validate_org_name(name)?;
        }
        if let Some(email) = &self.email {
            validate_contact_email(email)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub url: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CreateOrganizationRequest {
    pub fn validate(&self) -> AppResult<()> {
        validate_org_name(&self.name)?;
        if let Some(email) = &self.email {
            validate_contact_email(email)?;
        }
        Ok(())
    }

    pub fn into_new(self, created_by: &str) -> NewOrganization {
        NewOrganization {
            name: self.name.trim().to_string(),
            url: blank_to_none(self.url),
            email: blank_to_none(self.email),
            phone: blank_to_none(self.phone),
            address: blank_to_none(self.address),
            created_by: created_by.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JoinOrganizationRequest {
    #[serde(rename = "orgID")]
    pub org_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRoleRequest {
    pub role: String,
}

fn validate_org_name(name: &str) -> AppResult<()> {
    let len = name.trim().chars().count();
    if len == 0 || len > 200 {
        return Err(AppError::Validation(
            "organization name must be 1-200 characters".into(),
        ));
    }
    Ok(())
}

fn validate_contact_email(email: &str) -> AppResult<()> {
    if !email.is_empty() && !email.contains('@') {
        return Err(AppError::Validation("email must be a valid address".into()));
    }
    Ok(())
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
