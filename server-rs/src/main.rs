use std::net::SocketAddr;
use std::sync::Arc;

use league_api::config::Config;
use league_api::services::broadcast::SupabaseBroadcaster;
use league_api::services::clerk_service::ClerkClient;
use league_api::store::PgStore;
use league_api::{build_router, db, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .json()
        .init();

    let anon_pool = db::create_pool(&config.db.url, config.db.pool_max).await?;
    let service_pool = db::create_pool(&config.db.service_url, config.db.pool_max).await?;
    sqlx::migrate!("./migrations").run(&service_pool).await?;

    let identity = ClerkClient::new(&config.clerk)?;
    let broadcaster = SupabaseBroadcaster::new(&config.supabase)?;
    if config.clerk.secret_key.is_empty() {
        tracing::warn!("CLERK_SECRET_KEY is not set, bearer tokens will be rejected");
    }
    if config.supabase.jwt_secret.is_empty() {
        tracing::warn!("SUPABASE_JWT_SECRET is not set, login will fail");
    }
    if !config.is_production() {
        tracing::warn!(
            env = %config.env,
            "not running in production: a bare X-Clerk-User-ID header is trusted"
        );
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let env = config.env.clone();

    let state = AppState::new(
        Arc::new(PgStore::new(anon_pool)),
        Arc::new(PgStore::new(service_pool)),
        config,
        Arc::new(identity),
        Arc::new(broadcaster),
    );
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, env = %env, "league directory API listening");
    axum::serve(listener, router).await?;
    Ok(())
}
