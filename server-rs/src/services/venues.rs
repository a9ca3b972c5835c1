use crate::db::{AnonDb, ServiceDb};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::access;
use crate::services::notifications::Notifier;
use crate::services::review;
use crate::services::sports::Created;
use crate::store::*;

/// Addresses are unique case-insensitively; a known address returns the
/// stored venue untouched.
pub async fn create(db: &AnonDb, subject: &str, req: CreateVenueRequest) -> AppResult<Created<Venue>> {
    req.validate()?;
    let creator = access::registered_user(db.store(), subject).await?;

    if let Some(existing) = db.get_venue_by_address(&req.address).await? {
        return Ok(Created {
            record: existing,
            inserted: false,
        });
    }

    let new = NewVenue {
        name: req.name.trim().to_string(),
        address: req.address.trim().to_string(),
        latitude: req.latitude,
        longitude: req.longitude,
        status: SubmissionStatus::initial_for(creator.role),
        created_by: subject.to_string(),
    };
    match db.create_venue(&new).await {
        Ok(venue) => {
            tracing::info!(subject, venue_id = venue.id, status = venue.status.as_str(), "venue created");
            Ok(Created {
                record: venue,
                inserted: true,
            })
        }
        Err(AppError::Conflict(_)) => {
            let existing = db
                .get_venue_by_address(&new.address)
                .await?
                .ok_or_else(|| AppError::Internal("venue vanished after conflict".into()))?;
            Ok(Created {
                record: existing,
                inserted: false,
            })
        }
        Err(e) => Err(e),
    }
}

pub async fn exists(db: &dyn Store, address: &str) -> AppResult<bool> {
    if address.trim().is_empty() {
        return Err(AppError::Validation("address is required".into()));
    }
    Ok(db.get_venue_by_address(address).await?.is_some())
}

pub async fn list_approved(db: &dyn Store) -> AppResult<Vec<Venue>> {
    db.get_approved_venues().await
}

pub async fn get_approved(db: &dyn Store, id: i64) -> AppResult<Venue> {
    db.get_venue(id)
        .await?
        .filter(|v| v.status == SubmissionStatus::Approved)
        .ok_or_else(|| AppError::NotFound("Venue not found".into()))
}

pub async fn admin_list_pending(db: &ServiceDb) -> AppResult<Vec<Venue>> {
    db.get_pending_venues().await
}

pub async fn approve(db: &ServiceDb, notifier: &Notifier, actor: &str, id: i64) -> AppResult<Venue> {
    access::require_global_admin(db.store(), actor).await?;
    let venue = db
        .get_venue(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Venue not found".into()))?;
    apply(db, notifier, actor, venue.status.approve(), venue).await
}

pub async fn reject(
    db: &ServiceDb,
    notifier: &Notifier,
    actor: &str,
    id: i64,
    reason: &str,
) -> AppResult<Venue> {
    access::require_global_admin(db.store(), actor).await?;
    let venue = db
        .get_venue(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Venue not found".into()))?;
    let transition = venue.status.reject(reason)?;
    apply(db, notifier, actor, transition, venue).await
}

async fn apply(
    db: &ServiceDb,
    notifier: &Notifier,
    actor: &str,
    transition: Transition,
    venue: Venue,
) -> AppResult<Venue> {
    let Transition::Apply {
        status,
        rejection_reason,
    } = transition
    else {
        return Ok(venue);
    };
    let updated = db
        .update_venue_status(venue.id, venue.status, status, rejection_reason.as_deref())
        .await?
        .ok_or_else(|| review::changed_under_review("Venue"))?;
    tracing::info!(actor, venue_id = updated.id, status = status.as_str(), "venue reviewed");
    review::notify_outcome(notifier, &updated, None).await;
    Ok(updated)
}
