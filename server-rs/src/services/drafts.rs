//! Per-creator league drafts and shared per-org templates. Payloads are
//! opaque JSON objects.

use uuid::Uuid;

use crate::db::{AnonDb, ServiceDb};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::access;
use crate::services::notifications::Notifier;
use crate::store::*;

pub async fn get_draft(db: &AnonDb, subject: &str, org_id: Uuid) -> AppResult<Draft> {
    access::require_org_member(db.store(), subject, org_id).await?;
    db.get_draft(org_id, subject)
        .await?
        .ok_or_else(|| AppError::NotFound("Draft not found".into()))
}

/// Upserts the caller's single draft for the org.
pub async fn save_draft(
    db: &AnonDb,
    notifier: &Notifier,
    subject: &str,
    org_id: Uuid,
    req: SaveDraftRequest,
) -> AppResult<Draft> {
    req.validate()?;
    access::require_org_member(db.store(), subject, org_id).await?;
    let draft = db.save_draft(org_id, subject, &req.draft_data).await?;
    tracing::info!(subject, org_id = %org_id, draft_id = draft.id, "draft saved");

    notifier
        .deliver(
            NewNotification::new(subject, kinds::DRAFT_SAVED, "Draft saved", "Your league draft was saved.")
                .organization(org_id),
        )
        .await;
    Ok(draft)
}

pub async fn delete_draft(db: &AnonDb, subject: &str, org_id: Uuid, id: i64) -> AppResult<()> {
    access::require_org_member(db.store(), subject, org_id).await?;
    if !db.delete_draft(id, org_id).await? {
        return Err(AppError::NotFound("Draft not found".into()));
    }
    Ok(())
}

pub async fn list_drafts(db: &AnonDb, subject: &str, org_id: Uuid) -> AppResult<Vec<Draft>> {
    access::require_org_member(db.store(), subject, org_id).await?;
    db.list_drafts_by_org(org_id).await
}

pub async fn admin_list_drafts(db: &ServiceDb) -> AppResult<Vec<Draft>> {
    db.list_all_drafts().await
}

pub async fn create_template(
    db: &AnonDb,
    notifier: &Notifier,
    subject: &str,
    org_id: Uuid,
    req: TemplateRequest,
) -> AppResult<Template> {
    req.validate()?;
    access::require_org_member(db.store(), subject, org_id).await?;
    let template = db
        .create_template(&NewTemplate {
            org_id,
            name: req.name.trim().to_string(),
            template_data: req.template_data,
            created_by: subject.to_string(),
        })
        .await?;
    tracing::info!(subject, org_id = %org_id, template_id = template.id, "template created");

    notifier
        .deliver(
            NewNotification::new(
                subject,
                kinds::TEMPLATE_SAVED,
                "Template saved",
                format!("Template \"{}\" was saved.", template.name),
            )
            .organization(org_id),
        )
        .await;
    Ok(template)
}

pub async fn list_templates(db: &AnonDb, subject: &str, org_id: Uuid) -> AppResult<Vec<Template>> {
    access::require_org_member(db.store(), subject, org_id).await?;
    db.list_templates_by_org(org_id).await
}

async fn template_for_member(db: &AnonDb, subject: &str, id: i64) -> AppResult<Template> {
    let template = db
        .get_template(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".into()))?;
    access::require_org_member(db.store(), subject, template.org_id).await?;
    Ok(template)
}

pub async fn get_template(db: &AnonDb, subject: &str, id: i64) -> AppResult<Template> {
    template_for_member(db, subject, id).await
}

pub async fn update_template(
    db: &AnonDb,
    subject: &str,
    id: i64,
    req: TemplateRequest,
) -> AppResult<Template> {
    req.validate()?;
    template_for_member(db, subject, id).await?;
    db.update_template(id, &req.name, &req.template_data)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".into()))
}

/// Members of the owning org may delete, and so may global admins.
pub async fn delete_template(db: &AnonDb, subject: &str, id: i64) -> AppResult<()> {
    let template = db
        .get_template(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Template not found".into()))?;
    access::require_org_member_or_admin(db.store(), subject, template.org_id).await?;
    if !db.delete_template(id).await? {
        return Err(AppError::NotFound("Template not found".into()));
    }
    tracing::info!(subject, template_id = id, "template deleted");
    Ok(())
}
