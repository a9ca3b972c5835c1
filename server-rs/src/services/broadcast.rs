use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::SupabaseConfig;
use crate::error::{AppError, AppResult};

pub const NOTIFICATION_EVENT: &str = "notification";
pub const ADMIN_TOPIC: &str = "notifications:admins";

pub fn user_topic(subject: &str) -> String {
    format!("notifications:user:{subject}")
}

/// Ephemeral real-time bus. Delivery is best-effort.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    async fn broadcast(&self, topic: &str, payload: &Value) -> AppResult<()>;
}

/// Supabase Realtime REST broadcast endpoint.
#[derive(Clone)]
pub struct SupabaseBroadcaster {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

impl SupabaseBroadcaster {
    pub fn new(config: &SupabaseConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            url: config.broadcast_url.clone(),
            api_key: config.api_key.clone(),
            client,
        })
    }

    fn is_configured(&self) -> bool {
        self.url.starts_with("http") && !self.api_key.is_empty()
    }
}

#[async_trait]
impl Broadcaster for SupabaseBroadcaster {
    async fn broadcast(&self, topic: &str, payload: &Value) -> AppResult<()> {
        if !self.is_configured() {
            tracing::debug!(topic, "broadcast bus not configured, skipping");
            return Ok(());
        }

        let body = json!({
            "messages": [{
                "topic": topic,
                "event": NOTIFICATION_EVENT,
                "payload": payload,
            }]
        });

        let resp = self
            .client
            .post(&self.url)
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "broadcast to {topic} returned {status}: {text}"
            )));
        }
        Ok(())
    }
}
