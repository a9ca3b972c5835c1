use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::ClerkConfig;
use crate::error::{AppError, AppResult};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(5);

/// The external identity provider, as seen by this service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verifies a session token and returns its subject.
    async fn verify_token(&self, token: &str) -> AppResult<String>;
    /// Resolves a session id to the subject that owns it.
    async fn resolve_session(&self, session_id: &str) -> AppResult<String>;
    /// Mirrors role and organization name into the provider's public metadata.
    async fn sync_metadata(&self, subject: &str, role: &str, organization_name: &str)
        -> AppResult<()>;
    async fn fetch_primary_email(&self, subject: &str) -> AppResult<String>;
}

/// Thin Clerk Backend API client over raw HTTP.
#[derive(Clone)]
pub struct ClerkClient {
    base_url: String,
    secret_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct VerifiedToken {
    #[serde(default)]
    sub: String,
}

#[derive(Debug, Deserialize)]
struct Session {
    #[serde(default)]
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ClerkUser {
    #[serde(default)]
    primary_email_address_id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    id: String,
    email_address: String,
}

impl ClerkUser {
    fn primary_email(&self) -> Option<&str> {
        let primary = self.primary_email_address_id.as_deref().and_then(|pid| {
            self.email_addresses
                .iter()
                .find(|e| e.id == pid)
                .map(|e| e.email_address.as_str())
        });
        primary.or_else(|| self.email_addresses.first().map(|e| e.email_address.as_str()))
    }
}

impl ClerkClient {
    pub fn new(config: &ClerkConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request and decodes a 2xx body. Non-2xx bodies are logged and
    /// turned into `reject`, so provider detail never reaches clients.
    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        what: &str,
        reject: fn(String) -> AppError,
    ) -> AppResult<T> {
        let resp = req.bearer_auth(&self.secret_key).send().await.map_err(|e| {
            tracing::warn!(error = %e, "Clerk {what} request failed");
            AppError::Upstream(format!("Clerk {what} request failed"))
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %body, "Clerk {what} rejected");
            return Err(reject(format!("Clerk {what} failed")));
        }

        resp.json::<T>().await.map_err(|e| {
            tracing::warn!(error = %e, "Clerk {what} response parse failed");
            AppError::Upstream(format!("Clerk {what} response parse failed"))
        })
    }
}

#[async_trait]
impl IdentityProvider for ClerkClient {
    async fn verify_token(&self, token: &str) -> AppResult<String> {
        let req = self
            .client
            .post(self.url("/tokens/verify"))
            .json(&json!({ "token": token }));
        let verified: VerifiedToken = self
            .send(req, "token verification", |_| {
                AppError::Unauthorized("Invalid token".into())
            })
            .await?;
        if verified.sub.is_empty() {
            return Err(AppError::Unauthorized("Invalid token".into()));
        }
        Ok(verified.sub)
    }

    async fn resolve_session(&self, session_id: &str) -> AppResult<String> {
        let req = self.client.get(self.url(&format!("/sessions/{session_id}")));
        let session: Session = self
            .send(req, "session lookup", |_| {
                AppError::Unauthorized("Invalid session".into())
            })
            .await?;
        if session.user_id.is_empty() {
            return Err(AppError::Unauthorized("Session has no user".into()));
        }
        Ok(session.user_id)
    }

    async fn sync_metadata(
        &self,
        subject: &str,
        role: &str,
        organization_name: &str,
    ) -> AppResult<()> {
        let req = self
            .client
            .patch(self.url(&format!("/users/{subject}")))
            .json(&json!({
                "public_metadata": {
                    "role": role,
                    "organizationName": organization_name,
                }
            }));
        let _: Value = self.send(req, "metadata sync", AppError::Upstream).await?;
        Ok(())
    }

    async fn fetch_primary_email(&self, subject: &str) -> AppResult<String> {
        let req = self.client.get(self.url(&format!("/users/{subject}")));
        let user: ClerkUser = self.send(req, "user lookup", AppError::Upstream).await?;
        user.primary_email()
            .map(str::to_string)
            .ok_or_else(|| AppError::Upstream(format!("Clerk user {subject} has no email")))
    }
}

/// Best-effort metadata mirror. The database stays authoritative.
pub async fn sync_metadata_best_effort(
    identity: &dyn IdentityProvider,
    subject: &str,
    role: &str,
    organization_name: &str,
) {
    if let Err(e) = identity.sync_metadata(subject, role, organization_name).await {
        tracing::warn!(subject, error = %e, "Clerk metadata sync failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(raw: Value) -> ClerkUser {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn primary_email_prefers_the_flagged_address() {
        let u = user(json!({
            "primary_email_address_id": "idn_2",
            "email_addresses": [
                {"id": "idn_1", "email_address": "old@x.test"},
                {"id": "idn_2", "email_address": "main@x.test"}
            ]
        }));
        assert_eq!(u.primary_email(), Some("main@x.test"));
    }

    #[test]
    fn primary_email_falls_back_to_first() {
        let u = user(json!({
            "primary_email_address_id": "idn_missing",
            "email_addresses": [{"id": "idn_1", "email_address": "only@x.test"}]
        }));
        assert_eq!(u.primary_email(), Some("only@x.test"));
        assert_eq!(user(json!({})).primary_email(), None);
    }
}
