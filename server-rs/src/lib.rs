use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_mw,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use config::Config;
use db::{AnonDb, ServiceDb};
use services::broadcast::Broadcaster;
use services::clerk_service::IdentityProvider;
use services::notifications::Notifier;
use store::Store;

#[derive(Clone)]
pub struct AppState {
    pub db: AnonDb,
    pub service_db: ServiceDb,
    pub config: Arc<Config>,
    pub identity: Arc<dyn IdentityProvider>,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(
        anon: Arc<dyn Store>,
        service: Arc<dyn Store>,
        config: Config,
        identity: Arc<dyn IdentityProvider>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        let service_db = ServiceDb::new(service);
        Self {
            db: AnonDb::new(anon),
            notifier: Notifier::new(service_db.clone(), broadcaster),
            service_db,
            config: Arc::new(config),
            identity,
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origin = if config.is_production() {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    } else {
        AllowOrigin::mirror_request()
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            middleware::auth::SUBJECT_HEADER,
        ])
}

pub fn build_router(state: AppState) -> Router {
    // --- Public routes ---
    let public_routes = Router::new()
        .route("/", get(routes::health::health))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/user/:id", get(routes::auth::get_user))
        .route("/sports", get(routes::sports::list_sports))
        .route("/sports/exists", get(routes::sports::sport_exists))
        .route("/sports/:id", get(routes::sports::get_sport))
        .route("/venues", get(routes::venues::list_venues))
        .route("/venues/exists", get(routes::venues::venue_exists))
        .route("/venues/:id", get(routes::venues::get_venue))
        .route("/leagues", get(routes::leagues::list_leagues))
        .route("/leagues/:id", get(routes::leagues::get_league));

    // --- Authenticated routes ---
    let member_routes = Router::new()
        .route("/organizations", post(routes::organizations::create_org))
        .route("/organizations/user", get(routes::organizations::list_my_orgs))
        .route("/organizations/join", post(routes::organizations::join_org))
        .route(
            "/organizations/:id",
            get(routes::organizations::get_org)
                .put(routes::organizations::update_org)
                .delete(routes::organizations::delete_org),
        )
        .route(
            "/organizations/:id/members",
            get(routes::organizations::list_members),
        )
        .route(
            "/organizations/:id/members/:userId/role",
            put(routes::organizations::set_member_role),
        )
        .route("/organizations/:id/leave", post(routes::organizations::leave_org))
        .route("/sports", post(routes::sports::create_sport))
        .route("/venues", post(routes::venues::create_venue))
        .route("/leagues", post(routes::leagues::create_league))
        .route("/leagues/org/:orgId", get(routes::leagues::list_org_leagues))
        .route(
            "/leagues/drafts",
            get(routes::leagues::get_draft).post(routes::leagues::save_draft),
        )
        .route(
            "/leagues/drafts/:id",
            axum::routing::delete(routes::leagues::delete_draft),
        )
        .route(
            "/leagues/drafts/org/:orgId",
            get(routes::leagues::list_org_drafts),
        )
        .route(
            "/leagues/templates",
            get(routes::leagues::list_templates).post(routes::leagues::create_template),
        )
        .route(
            "/leagues/templates/:id",
            get(routes::leagues::get_template)
                .put(routes::leagues::update_template)
                .delete(routes::leagues::delete_template),
        )
        .route(
            "/notifications",
            get(routes::notifications::list_notifications),
        )
        .route(
            "/notifications/unread-count",
            get(routes::notifications::unread_count),
        )
        .route(
            "/notifications/read-all",
            patch(routes::notifications::mark_all_read),
        )
        .route(
            "/notifications/preferences",
            get(routes::notifications::get_preferences)
                .put(routes::notifications::update_preferences),
        )
        .route(
            "/notifications/:id/read",
            patch(routes::notifications::mark_read),
        )
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    // --- Global admin routes ---
    let admin_routes = Router::new()
        .route("/auth/user/:id/role", patch(routes::auth::update_role))
        .route("/auth/user/:id/active", patch(routes::auth::set_active))
        .route("/organizations", get(routes::organizations::list_all_orgs))
        .route(
            "/sports/admin/pending",
            get(routes::sports::list_pending_sports),
        )
        .route("/sports/:id/approve", put(routes::sports::approve_sport))
        .route("/sports/:id/reject", put(routes::sports::reject_sport))
        .route(
            "/venues/admin/pending",
            get(routes::venues::list_pending_venues),
        )
        .route("/venues/:id/approve", put(routes::venues::approve_venue))
        .route("/venues/:id/reject", put(routes::venues::reject_venue))
        .route("/leagues/admin", get(routes::leagues::admin_list_leagues))
        .route(
            "/leagues/admin/pending",
            get(routes::leagues::admin_list_pending),
        )
        .route(
            "/leagues/admin/drafts",
            get(routes::leagues::admin_list_drafts),
        )
        .route(
            "/leagues/admin/:id",
            get(routes::leagues::admin_get_league).put(routes::leagues::admin_update_league),
        )
        .route("/leagues/:id/approve", put(routes::leagues::approve_league))
        .route("/leagues/:id/reject", put(routes::leagues::reject_league))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::admin::require_admin,
        ))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::authenticate,
        ));

    // --- Compose full API ---
    let api = public_routes.merge(member_routes).merge(admin_routes);

    Router::new()
        .nest("/v1", api)
        .route("/v1/", get(routes::health::health))
        .route("/health", get(routes::health::health))
        // Global middleware
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.request_timeout_secs,
        )))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
