use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::middleware::auth::AuthUser;
use crate::services::access;
use crate::AppState;

/// Middleware: requires an active global admin. Layer inside `authenticate`.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

    access::require_global_admin(state.service_db.store(), &user.subject).await?;

    Ok(next.run(req).await)
}
