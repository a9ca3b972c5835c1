use uuid::Uuid;

use crate::db::AnonDb;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::access;
use crate::store::*;

pub async fn create(
    db: &AnonDb,
    subject: &str,
    req: CreateOrganizationRequest,
) -> AppResult<OrganizationWithRole> {
    req.validate()?;
    access::registered_user(db.store(), subject).await?;
    let org = db.create_organization(&req.into_new(subject)).await?;
    tracing::info!(subject, org_id = %org.id, "organization created");
    Ok(OrganizationWithRole {
        organization: org,
        role: OrgRole::Owner,
    })
}

pub async fn get(db: &AnonDb, subject: &str, org_id: Uuid) -> AppResult<OrganizationWithRole> {
    let membership = access::require_org_member(db.store(), subject, org_id).await?;
    let organization = access::live_organization(db.store(), org_id).await?;
    Ok(OrganizationWithRole {
        organization,
        role: membership.role,
    })
}

/// Joining an org you already belong to keeps your current role.
pub async fn join(db: &AnonDb, subject: &str, org_id: Uuid) -> AppResult<OrgMembership> {
    access::registered_user(db.store(), subject).await?;
    access::live_organization(db.store(), org_id).await?;
    if let Some(existing) = db.get_membership(subject, org_id).await? {
        if existing.is_active {
            return Ok(existing);
        }
    }
    let membership = db.link_user(subject, org_id, OrgRole::Member).await?;
    tracing::info!(subject, org_id = %org_id, "joined organization");
    Ok(membership)
}

pub async fn update(
    db: &AnonDb,
    subject: &str,
    org_id: Uuid,
    changes: OrganizationChanges,
) -> AppResult<Organization> {
    changes.validate()?;
    access::require_org_admin(db.store(), subject, org_id).await?;
    db.update_organization(org_id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound("Organization not found".into()))
}

/// Soft delete. Memberships are left as they are; the org simply disappears
/// from every listing and access check.
pub async fn delete(db: &AnonDb, subject: &str, org_id: Uuid) -> AppResult<()> {
    access::require_org_admin(db.store(), subject, org_id).await?;
    if !db.soft_delete_organization(org_id).await? {
        return Err(AppError::NotFound("Organization not found".into()));
    }
    tracing::info!(subject, org_id = %org_id, "organization deleted");
    Ok(())
}

pub async fn members(db: &AnonDb, subject: &str, org_id: Uuid) -> AppResult<Vec<OrgMember>> {
    access::require_org_member(db.store(), subject, org_id).await?;
    db.list_members(org_id).await
}

pub async fn leave(db: &AnonDb, subject: &str, org_id: Uuid) -> AppResult<()> {
    let membership = access::require_org_member(db.store(), subject, org_id).await?;
    if membership.role == OrgRole::Owner {
        let owners = db
            .list_members(org_id)
            .await?
            .iter()
            .filter(|m| m.role == OrgRole::Owner)
            .count();
        if owners <= 1 {
            return Err(AppError::Conflict(
                "The last owner cannot leave the organization".into(),
            ));
        }
    }
    db.remove_user(subject, org_id).await?;
    tracing::info!(subject, org_id = %org_id, "left organization");
    Ok(())
}

/// Owners are made at creation only; this path cannot grant or revoke it.
pub async fn set_member_role(
    db: &AnonDb,
    subject: &str,
    org_id: Uuid,
    target: &str,
    req: UpdateMemberRoleRequest,
) -> AppResult<OrgMembership> {
    let role: OrgRole = req
        .role
        .trim()
        .parse()
        .map_err(|_| AppError::Validation("role must be \"admin\" or \"member\"".into()))?;
    if role == OrgRole::Owner {
        return Err(AppError::Validation("role must be \"admin\" or \"member\"".into()));
    }

    access::require_org_admin(db.store(), subject, org_id).await?;
    let current = db
        .get_membership(target, org_id)
        .await?
        .filter(|m| m.is_active)
        .ok_or_else(|| AppError::NotFound("Member not found".into()))?;
    if current.role == OrgRole::Owner {
        return Err(AppError::Forbidden("The owner's role cannot be changed".into()));
    }

    let updated = db.link_user(target, org_id, role).await?;
    tracing::info!(subject, target, org_id = %org_id, role = role.as_str(), "member role changed");
    Ok(updated)
}
