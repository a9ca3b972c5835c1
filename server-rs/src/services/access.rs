//! Two-layer authorization: the global role on the user record, and the
//! per-organization role on the membership. Every check is a fresh read.

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::store::*;

/// Loads the caller's user record; unregistered subjects are forbidden.
pub async fn registered_user(db: &dyn Store, subject: &str) -> AppResult<User> {
    db.get_user(subject)
        .await?
        .ok_or_else(|| AppError::Forbidden("User is not registered".into()))
}

/// Fails unless the user exists, is active and holds `role`.
pub async fn validate_role(db: &dyn Store, subject: &str, role: GlobalRole) -> AppResult<User> {
    let user = registered_user(db, subject).await?;
    if !user.is_active {
        return Err(AppError::Forbidden("User is inactive".into()));
    }
    if user.role != role {
        return Err(AppError::Forbidden(format!(
            "Requires {} role",
            role.as_str()
        )));
    }
    Ok(user)
}

pub async fn require_global_admin(db: &dyn Store, subject: &str) -> AppResult<User> {
    validate_role(db, subject, GlobalRole::Admin).await
}

pub async fn is_global_admin(db: &dyn Store, subject: &str) -> AppResult<bool> {
    Ok(db
        .get_user(subject)
        .await?
        .is_some_and(|u| u.is_active_admin()))
}

/// Soft-deleted organizations are indistinguishable from missing ones.
pub async fn live_organization(db: &dyn Store, org_id: Uuid) -> AppResult<Organization> {
    db.get_organization(org_id)
        .await?
        .filter(|o| !o.is_deleted)
        .ok_or_else(|| AppError::NotFound("Organization not found".into()))
}

pub async fn require_org_member(
    db: &dyn Store,
    subject: &str,
    org_id: Uuid,
) -> AppResult<OrgMembership> {
    live_organization(db, org_id).await?;
    db.get_membership(subject, org_id)
        .await?
        .filter(|m| m.is_active)
        .ok_or_else(|| AppError::Forbidden("Not a member of this organization".into()))
}

pub async fn require_org_admin(
    db: &dyn Store,
    subject: &str,
    org_id: Uuid,
) -> AppResult<OrgMembership> {
    let membership = require_org_member(db, subject, org_id).await?;
    if !membership.role.can_manage() {
        return Err(AppError::Forbidden(
            "Requires organization owner or admin".into(),
        ));
    }
    Ok(membership)
}

/// Org members pass, and so do global admins.
pub async fn require_org_member_or_admin(
    db: &dyn Store,
    subject: &str,
    org_id: Uuid,
) -> AppResult<()> {
    live_organization(db, org_id).await?;
    if db.user_has_access(subject, org_id).await? || is_global_admin(db, subject).await? {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "Not a member of this organization".into(),
    ))
}
