//! Creator notifications for curation outcomes, shared by every submission
//! family.

use uuid::Uuid;

use crate::error::AppError;
use crate::models::*;
use crate::services::notifications::Notifier;

/// Submissions are never deleted, so a compare-and-set miss after a successful
/// read means another review moved the row first.
pub fn changed_under_review(label: &str) -> AppError {
    AppError::Conflict(format!("{label} was reviewed concurrently; reload and retry"))
}

pub fn approved_notification<T: Submission>(record: &T) -> NewNotification {
    NewNotification::new(
        record.created_by(),
        T::KIND.approved_notification(),
        format!("{} approved", T::KIND.label()),
        format!(
            "Your {} \"{}\" has been approved.",
            T::KIND.label().to_lowercase(),
            record.display_name()
        ),
    )
}

pub fn rejected_notification<T: Submission>(record: &T, reason: &str) -> NewNotification {
    NewNotification::new(
        record.created_by(),
        T::KIND.rejected_notification(),
        format!("{} rejected", T::KIND.label()),
        format!(
            "Your {} \"{}\" was rejected: {}",
            T::KIND.label().to_lowercase(),
            record.display_name(),
            reason
        ),
    )
}

/// Notifies the creator after a committed transition.
pub async fn notify_outcome<T: Submission>(
    notifier: &Notifier,
    record: &T,
    league: Option<(i64, Uuid)>,
) {
    let n = match record.status() {
        SubmissionStatus::Approved => approved_notification(record),
        SubmissionStatus::Rejected => {
            rejected_notification(record, record.rejection_reason().unwrap_or_default())
        }
        SubmissionStatus::Pending => return,
    };
    let n = match league {
        Some((league_id, org_id)) => n.league(league_id).organization(org_id),
        None => n,
    };
    notifier.deliver(n).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sport(status: SubmissionStatus) -> Sport {
        Sport {
            id: 3,
            name: "Pickleball".into(),
            description: None,
            status,
            rejection_reason: Some("duplicate of Paddle".into()),
            created_by: "u2".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn messages_name_the_family_and_record() {
        let approved = approved_notification(&sport(SubmissionStatus::Approved));
        assert_eq!(approved.kind, kinds::SPORT_APPROVED);
        assert_eq!(approved.user_id, "u2");
        assert!(approved.message.contains("sport \"Pickleball\""));

        let rejected = rejected_notification(&sport(SubmissionStatus::Rejected), "duplicate");
        assert_eq!(rejected.kind, kinds::SPORT_REJECTED);
        assert!(rejected.message.ends_with("duplicate"));
    }
}
