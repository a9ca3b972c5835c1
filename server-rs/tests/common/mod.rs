#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use league_api::config::{ClerkConfig, Config, DbConfig, SupabaseConfig};
use league_api::error::{AppError, AppResult};
use league_api::services::broadcast::Broadcaster;
use league_api::services::clerk_service::IdentityProvider;
use league_api::store::MemoryStore;
use league_api::{build_router, AppState};

pub const JWT_SECRET: &str = "test-jwt-secret";

pub fn test_config(env: &str) -> Config {
    Config {
        port: 0,
        env: env.to_string(),
        cors_origins: vec!["http://localhost:3000".into()],
        request_timeout_secs: 10,
        db: DbConfig {
            url: String::new(),
            service_url: String::new(),
            pool_max: 1,
        },
        clerk: ClerkConfig {
            api_url: "http://clerk.invalid".into(),
            secret_key: "sk_test".into(),
            publishable_key: "pk_test".into(),
        },
        supabase: SupabaseConfig {
            url: String::new(),
            broadcast_url: String::new(),
            api_key: String::new(),
            jwt_secret: JWT_SECRET.into(),
        },
    }
}

/// Identity provider that knows tokens and sessions of the form
/// `token-<subject>` / `session-<subject>`.
#[derive(Default)]
pub struct FakeIdentity {
    pub emails: Mutex<HashMap<String, String>>,
    pub synced: Mutex<Vec<(String, String, String)>>,
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn verify_token(&self, token: &str) -> AppResult<String> {
        token
            .strip_prefix("token-")
            .map(str::to_string)
            .ok_or_else(|| AppError::Unauthorized("Invalid token".into()))
    }

    async fn resolve_session(&self, session_id: &str) -> AppResult<String> {
        session_id
            .strip_prefix("session-")
            .map(str::to_string)
            .ok_or_else(|| AppError::Unauthorized("Invalid session".into()))
    }

    async fn sync_metadata(&self, subject: &str, role: &str, org: &str) -> AppResult<()> {
        self.synced
            .lock()
            .unwrap()
            .push((subject.into(), role.into(), org.into()));
        Ok(())
    }

    async fn fetch_primary_email(&self, subject: &str) -> AppResult<String> {
        self.emails
            .lock()
            .unwrap()
            .get(subject)
            .cloned()
            .ok_or_else(|| AppError::Upstream("no email".into()))
    }
}

#[derive(Default)]
pub struct RecordingBroadcaster {
    pub sent: Mutex<Vec<(String, Value)>>,
}

#[async_trait]
impl Broadcaster for RecordingBroadcaster {
    async fn broadcast(&self, topic: &str, payload: &Value) -> AppResult<()> {
        self.sent
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.clone()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub identity: Arc<FakeIdentity>,
    pub broadcaster: Arc<RecordingBroadcaster>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_env("development")
    }

    pub fn with_env(env: &str) -> Self {
        let store = MemoryStore::new();
        let identity = Arc::new(FakeIdentity::default());
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let state = AppState::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            test_config(env),
            identity.clone(),
            broadcaster.clone(),
        );
        Self {
            router: build_router(state),
            store,
            identity,
            broadcaster,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        subject: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(subject) = subject {
            builder = builder.header("x-clerk-user-id", subject);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.request(builder.body(body).unwrap()).await
    }

    pub async fn request(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    pub async fn get(&self, uri: &str, subject: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, subject, None).await
    }

    pub async fn post(&self, uri: &str, subject: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, subject, Some(body)).await
    }

    pub async fn put(&self, uri: &str, subject: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, subject, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, subject: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, subject, body).await
    }

    pub async fn register(&self, subject: &str, org: &str) -> Value {
        let (status, body) = self
            .post(
                "/v1/auth/register",
                None,
                serde_json::json!({
                    "clerkID": subject,
                    "email": format!("{subject}@example.test"),
                    "organizationName": org,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {subject}: {body}");
        body
    }

    /// Registers `subject` with an organization and returns the org id.
    pub async fn register_with_org(&self, subject: &str, org: &str) -> String {
        let body = self.register(subject, org).await;
        body["organization"]["id"].as_str().unwrap().to_string()
    }

    pub async fn submit_league(&self, subject: &str, org_id: &str, name: &str) -> Value {
        let (status, body) = self
            .post(
                &format!("/v1/leagues?org_id={org_id}"),
                Some(subject),
                league_body(name),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create league: {body}");
        body["league"].clone()
    }
}

pub fn league_body(name: &str) -> Value {
    serde_json::json!({
        "name": name,
        "season_start_date": "2025-09-01",
        "season_end_date": "2025-12-01T00:00:00Z",
        "pricing_strategy": "per_team",
        "pricing_amount": 250.0,
        "minimum_team_players": 6,
    })
}

pub fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .map(|rows| rows.iter().filter_map(|r| r["id"].as_i64()).collect())
        .unwrap_or_default()
}
