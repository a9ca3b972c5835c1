//! League submission lifecycle: creation with role-driven initial status,
//! public and org listings, and admin curation.

use uuid::Uuid;

use crate::db::{AnonDb, ServiceDb};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::access;
use crate::services::notifications::Notifier;
use crate::services::review;
use crate::store::*;

pub const DEFAULT_PAGE_SIZE: i64 = 50;

async fn check_references(db: &dyn Store, input: &LeagueInput) -> AppResult<()> {
    if let Some(sport_id) = input.sport_id {
        if db.get_sport(sport_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "sport_id {sport_id} does not exist"
            )));
        }
    }
    if let Some(venue_id) = input.venue_id {
        if db.get_venue(venue_id).await?.is_none() {
            return Err(AppError::Validation(format!(
                "venue_id {venue_id} does not exist"
            )));
        }
    }
    Ok(())
}

pub async fn create(
    db: &AnonDb,
    notifier: &Notifier,
    subject: &str,
    org_id: Uuid,
    input: LeagueInput,
) -> AppResult<League> {
    input.validate()?;
    access::require_org_member(db.store(), subject, org_id).await?;
    let creator = access::registered_user(db.store(), subject).await?;
    check_references(db.store(), &input).await?;

    let status = SubmissionStatus::initial_for(creator.role);
    let league = db
        .create_league(&NewLeague {
            org_id,
            input,
            status,
            created_by: subject.to_string(),
        })
        .await?;
    tracing::info!(subject, league_id = league.id, org_id = %org_id, status = status.as_str(), "league created");

    match league.status {
        SubmissionStatus::Pending => {
            notifier
                .deliver_to_admins(
                    kinds::LEAGUE_SUBMITTED,
                    "New league submitted",
                    &format!("\"{}\" is waiting for review.", league.name),
                    Some(league.id),
                    Some(org_id),
                )
                .await;
            notifier
                .deliver(
                    NewNotification::new(
                        subject,
                        kinds::LEAGUE_SUBMITTED,
                        "League submitted",
                        format!("\"{}\" was submitted for review.", league.name),
                    )
                    .league(league.id)
                    .organization(org_id),
                )
                .await;
        }
        SubmissionStatus::Approved => {
            review::notify_outcome(notifier, &league, Some((league.id, org_id))).await;
        }
        SubmissionStatus::Rejected => {}
    }

    Ok(league)
}

pub async fn list_approved(db: &dyn Store, page: Page) -> AppResult<Paginated<League>> {
    Ok(Paginated::new(db.get_approved_leagues_paginated(page).await?, page))
}

/// Public detail: anything not approved, or owned by a deleted organization,
/// is reported as missing.
pub async fn get_approved(db: &dyn Store, id: i64) -> AppResult<League> {
    let league = db
        .get_league(id)
        .await?
        .filter(|l| l.status == SubmissionStatus::Approved)
        .ok_or_else(|| AppError::NotFound("League not found".into()))?;
    match access::live_organization(db, league.org_id).await {
        Ok(_) => Ok(league),
        Err(AppError::NotFound(_)) => Err(AppError::NotFound("League not found".into())),
        Err(e) => Err(e),
    }
}

pub async fn list_for_org(
    db: &AnonDb,
    subject: &str,
    org_id: Uuid,
    status: Option<&str>,
) -> AppResult<Vec<League>> {
    access::require_org_member(db.store(), subject, org_id).await?;
    match status.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => {
            let status: SubmissionStatus = raw
                .parse()
                .map_err(|e: ParseEnumError| AppError::Validation(e.to_string()))?;
            db.get_leagues_by_org_and_status(org_id, status).await
        }
        None => db.get_leagues_by_org(org_id).await,
    }
}

pub async fn admin_list_all(db: &ServiceDb, page: Page) -> AppResult<Paginated<League>> {
    Ok(Paginated::new(db.get_all_leagues_paginated(page).await?, page))
}

pub async fn admin_list_pending(db: &ServiceDb, page: Page) -> AppResult<Paginated<League>> {
    Ok(Paginated::new(db.get_pending_leagues_paginated(page).await?, page))
}

pub async fn admin_get(db: &ServiceDb, id: i64) -> AppResult<League> {
    db.get_league(id)
        .await?
        .ok_or_else(|| AppError::NotFound("League not found".into()))
}

pub async fn admin_update(db: &ServiceDb, id: i64, input: LeagueInput) -> AppResult<League> {
    input.validate()?;
    check_references(db.store(), &input).await?;
    let league = db
        .update_league(id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound("League not found".into()))?;
    tracing::info!(league_id = id, "league edited by admin");
    Ok(league)
}

/// Approves the league and any still-pending sport/venue it references in one
/// unit. Approving an approved league changes nothing and notifies nobody.
pub async fn approve(
    db: &ServiceDb,
    notifier: &Notifier,
    actor: &str,
    id: i64,
) -> AppResult<League> {
    access::require_global_admin(db.store(), actor).await?;

    match db.approve_league_with_children(id).await? {
        None => Err(AppError::NotFound("League not found".into())),
        Some(Approval::Unchanged(league)) => Ok(league),
        Some(Approval::Applied(approved)) => {
            tracing::info!(actor, league_id = id, "league approved");
            review::notify_outcome(notifier, &approved, Some((approved.id, approved.org_id)))
                .await;
            Ok(approved)
        }
    }
}

pub async fn reject(
    db: &ServiceDb,
    notifier: &Notifier,
    actor: &str,
    id: i64,
    reason: &str,
) -> AppResult<League> {
    access::require_global_admin(db.store(), actor).await?;
    let league = admin_get(db, id).await?;

    let Transition::Apply {
        status,
        rejection_reason,
    } = league.status.reject(reason)?
    else {
        return Ok(league);
    };
    let rejected = db
        .update_league_status(id, league.status, status, rejection_reason.as_deref())
        .await?
        .ok_or_else(|| review::changed_under_review("League"))?;
    tracing::info!(actor, league_id = id, "league rejected");
    review::notify_outcome(notifier, &rejected, Some((rejected.id, rejected.org_id))).await;
    Ok(rejected)
}
