//! Notification engine: durable rows first, then a best-effort broadcast.

use chrono::Utc;
use std::sync::Arc;

use crate::db::ServiceDb;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::broadcast::{user_topic, Broadcaster, ADMIN_TOPIC};
use crate::store::*;

pub const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Clone)]
pub struct Notifier {
    db: ServiceDb,
    broadcaster: Arc<dyn Broadcaster>,
}

impl Notifier {
    pub fn new(db: ServiceDb, broadcaster: Arc<dyn Broadcaster>) -> Self {
        Self { db, broadcaster }
    }

    async fn preferences(&self, user_id: &str) -> AppResult<NotificationPreferences> {
        Ok(self
            .db
            .get_preferences(user_id)
            .await?
            .unwrap_or_else(|| NotificationPreferences::all_enabled(user_id)))
    }

    /// Returns `None` when the recipient opted out of this type; nothing is
    /// written or sent in that case.
    pub async fn emit(&self, n: NewNotification) -> AppResult<Option<Notification>> {
        if !self.preferences(&n.user_id).await?.allows(&n.kind) {
            tracing::debug!(subject = %n.user_id, kind = %n.kind, "notification suppressed by preference");
            return Ok(None);
        }

        let row = self.db.insert_notification(&n).await?;

        let topic = user_topic(&row.user_id);
        match serde_json::to_value(&row) {
            Ok(payload) => {
                if let Err(e) = self.broadcaster.broadcast(&topic, &payload).await {
                    tracing::warn!(topic = %topic, error = %e, "notification broadcast failed");
                }
            }
            Err(e) => tracing::warn!(topic = %topic, error = %e, "notification payload encode failed"),
        }

        Ok(Some(row))
    }

    /// Emits to every active admin, then announces once on the admin channel.
    /// Returns how many rows were written.
    pub async fn emit_to_admins(
        &self,
        kind: &str,
        title: &str,
        message: &str,
        league_id: Option<i64>,
        organization_id: Option<uuid::Uuid>,
    ) -> AppResult<usize> {
        let admins = self.db.list_active_admins().await?;
        let mut delivered = 0;
        for admin in &admins {
            let mut n = NewNotification::new(&admin.id, kind, title, message);
            n.league_id = league_id;
            n.organization_id = organization_id;
            match self.emit(n).await {
                Ok(Some(_)) => delivered += 1,
                Ok(None) => {}
                Err(e) => tracing::warn!(subject = %admin.id, error = %e, "admin notification failed"),
            }
        }

        let announcement = AdminAnnouncement {
            kind: kind.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            league_id,
            organization_id,
            recipients: delivered,
            created_at: Utc::now(),
        };
        match serde_json::to_value(&announcement) {
            Ok(payload) => {
                if let Err(e) = self.broadcaster.broadcast(ADMIN_TOPIC, &payload).await {
                    tracing::warn!(topic = ADMIN_TOPIC, error = %e, "admin broadcast failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "admin payload encode failed"),
        }

        Ok(delivered)
    }

    /// Post-commit delivery: the triggering write already succeeded, so a
    /// failure here is logged instead of failing the request.
    pub async fn deliver(&self, n: NewNotification) {
        let subject = n.user_id.clone();
        if let Err(e) = self.emit(n).await {
            tracing::warn!(subject = %subject, error = %e, "notification delivery failed");
        }
    }

    pub async fn deliver_to_admins(
        &self,
        kind: &str,
        title: &str,
        message: &str,
        league_id: Option<i64>,
        organization_id: Option<uuid::Uuid>,
    ) {
        if let Err(e) = self
            .emit_to_admins(kind, title, message, league_id, organization_id)
            .await
        {
            tracing::warn!(kind, error = %e, "admin fan-out failed");
        }
    }

    pub async fn list(&self, user_id: &str, page: Page) -> AppResult<Paginated<Notification>> {
        let rows = self.db.list_notifications(user_id, page).await?;
        Ok(Paginated::new(rows, page))
    }

    pub async fn mark_read(&self, id: i64, user_id: &str) -> AppResult<Notification> {
        self.db
            .mark_read(id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".into()))
    }

    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        self.db.mark_all_read(user_id).await
    }

    pub async fn unread_count(&self, user_id: &str) -> AppResult<i64> {
        self.db.unread_count(user_id).await
    }

    pub async fn get_preferences(&self, user_id: &str) -> AppResult<NotificationPreferences> {
        self.preferences(user_id).await
    }

    pub async fn update_preferences(
        &self,
        user_id: &str,
        changes: &PreferenceChanges,
    ) -> AppResult<NotificationPreferences> {
        let mut prefs = self.preferences(user_id).await?;
        prefs.apply(changes);
        self.db.upsert_preferences(&prefs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::Value;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, Value)>>,
        fail: bool,
    }

    #[async_trait]
    impl Broadcaster for Recorder {
        async fn broadcast(&self, topic: &str, payload: &Value) -> AppResult<()> {
            self.sent.lock().await.push((topic.to_string(), payload.clone()));
            if self.fail {
                return Err(AppError::Upstream("bus down".into()));
            }
            Ok(())
        }
    }

    async fn setup(fail: bool) -> (Notifier, Arc<MemoryStore>, Arc<Recorder>) {
        let store = Arc::new(MemoryStore::new());
        for (id, role) in [("u1", GlobalRole::Admin), ("u2", GlobalRole::User)] {
            store
                .create_user(&NewUser {
                    id: id.into(),
                    email: format!("{id}@x.test"),
                    role,
                })
                .await
                .unwrap();
        }
        let recorder = Arc::new(Recorder {
            fail,
            ..Default::default()
        });
        let notifier = Notifier::new(ServiceDb::new(store.clone()), recorder.clone());
        (notifier, store, recorder)
    }

    #[tokio::test]
    async fn disabled_preference_writes_nothing() {
        let (notifier, _store, recorder) = setup(false).await;
        notifier
            .update_preferences(
                "u2",
                &PreferenceChanges {
                    draft_saved: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let out = notifier
            .emit(NewNotification::new("u2", kinds::DRAFT_SAVED, "Draft saved", "ok"))
            .await
            .unwrap();
        assert!(out.is_none());
        assert_eq!(notifier.unread_count("u2").await.unwrap(), 0);
        assert!(recorder.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn broadcast_failure_keeps_the_durable_row() {
        let (notifier, _store, recorder) = setup(true).await;
        let row = notifier
            .emit(NewNotification::new("u2", kinds::LEAGUE_APPROVED, "Approved", "yay").league(4))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.league_id, Some(4));
        assert_eq!(notifier.unread_count("u2").await.unwrap(), 1);

        let sent = recorder.sent.lock().await;
        assert_eq!(sent[0].0, "notifications:user:u2");
        assert_eq!(sent[0].1["type"], "league_approved");
    }

    #[tokio::test]
    async fn admin_fan_out_announces_once() {
        let (notifier, _store, recorder) = setup(false).await;
        let delivered = notifier
            .emit_to_admins(kinds::LEAGUE_SUBMITTED, "New league", "review me", Some(1), None)
            .await
            .unwrap();
        assert_eq!(delivered, 1);

        let sent = recorder.sent.lock().await;
        let topics: Vec<&str> = sent.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(topics, vec!["notifications:user:u1", "notifications:admins"]);
        assert_eq!(sent[1].1["recipients"], 1);
    }

    #[tokio::test]
    async fn mark_read_is_scoped_to_recipient() {
        let (notifier, _store, _) = setup(false).await;
        let row = notifier
            .emit(NewNotification::new("u2", kinds::LEAGUE_REJECTED, "Rejected", "no"))
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(
            notifier.mark_read(row.id, "u1").await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(notifier.unread_count("u2").await.unwrap(), 1);

        let read = notifier.mark_read(row.id, "u2").await.unwrap();
        assert!(read.read);
        // Idempotent.
        assert!(notifier.mark_read(row.id, "u2").await.unwrap().read);
    }
}
