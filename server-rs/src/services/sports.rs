use crate::db::{AnonDb, ServiceDb};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::access;
use crate::services::notifications::Notifier;
use crate::services::review;
use crate::store::*;

pub struct Created<T> {
    pub record: T,
    /// False when an existing row was returned instead.
    pub inserted: bool,
}

/// Names are unique case-insensitively; creating an existing name returns the
/// stored row untouched.
pub async fn create(db: &AnonDb, subject: &str, req: CreateSportRequest) -> AppResult<Created<Sport>> {
    req.validate()?;
    let creator = access::registered_user(db.store(), subject).await?;

    if let Some(existing) = db.get_sport_by_name(&req.name).await? {
        return Ok(Created {
            record: existing,
            inserted: false,
        });
    }

    let new = NewSport {
        name: req.name.trim().to_string(),
        description: req.description,
        status: SubmissionStatus::initial_for(creator.role),
        created_by: subject.to_string(),
    };
    match db.create_sport(&new).await {
        Ok(sport) => {
            tracing::info!(subject, sport_id = sport.id, status = sport.status.as_str(), "sport created");
            Ok(Created {
                record: sport,
                inserted: true,
            })
        }
        // Lost a race with a concurrent insert of the same name.
        Err(AppError::Conflict(_)) => {
            let existing = db
                .get_sport_by_name(&new.name)
                .await?
                .ok_or_else(|| AppError::Internal("sport vanished after conflict".into()))?;
            Ok(Created {
                record: existing,
                inserted: false,
            })
        }
        Err(e) => Err(e),
    }
}

pub async fn exists(db: &dyn Store, name: &str) -> AppResult<bool> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    Ok(db.get_sport_by_name(name).await?.is_some())
}

pub async fn list_approved(db: &dyn Store) -> AppResult<Vec<Sport>> {
    db.get_approved_sports().await
}

pub async fn get_approved(db: &dyn Store, id: i64) -> AppResult<Sport> {
    db.get_sport(id)
        .await?
        .filter(|s| s.status == SubmissionStatus::Approved)
        .ok_or_else(|| AppError::NotFound("Sport not found".into()))
}

pub async fn admin_list_pending(db: &ServiceDb) -> AppResult<Vec<Sport>> {
    db.get_pending_sports().await
}

pub async fn approve(db: &ServiceDb, notifier: &Notifier, actor: &str, id: i64) -> AppResult<Sport> {
    access::require_global_admin(db.store(), actor).await?;
    let sport = db
        .get_sport(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Sport not found".into()))?;
    apply(db, notifier, actor, sport.status.approve(), sport).await
}

pub async fn reject(
    db: &ServiceDb,
    notifier: &Notifier,
    actor: &str,
    id: i64,
    reason: &str,
) -> AppResult<Sport> {
    access::require_global_admin(db.store(), actor).await?;
    let sport = db
        .get_sport(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Sport not found".into()))?;
    let transition = sport.status.reject(reason)?;
    apply(db, notifier, actor, transition, sport).await
}

async fn apply(
    db: &ServiceDb,
    notifier: &Notifier,
    actor: &str,
    transition: Transition,
    sport: Sport,
) -> AppResult<Sport> {
    let Transition::Apply {
        status,
        rejection_reason,
    } = transition
    else {
        return Ok(sport);
    };
    let updated = db
        .update_sport_status(sport.id, sport.status, status, rejection_reason.as_deref())
        .await?
        .ok_or_else(|| review::changed_under_review("Sport"))?;
    tracing::info!(actor, sport_id = updated.id, status = status.as_str(), "sport reviewed");
    review::notify_outcome(notifier, &updated, None).await;
    Ok(updated)
}
