use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::extract::ValidJson;
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::services::users;
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let reg = users::register(&state.service_db, state.identity.as_ref(), body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered",
            "user": reg.user,
            "organization": reg.organization,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let resp = users::login(
        &state.service_db,
        state.identity.as_ref(),
        &state.config.supabase.jwt_secret,
        body,
    )
    .await?;
    Ok(Json(resp))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<User>> {
    Ok(Json(users::get_user(state.db.store(), &id).await?))
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateRoleRequest>,
) -> AppResult<Json<Value>> {
    let user = users::update_role(&state.service_db, state.identity.as_ref(), &id, body).await?;
    Ok(Json(json!({ "message": "Role updated", "user": user })))
}

pub async fn set_active(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateActiveRequest>,
) -> AppResult<Json<Value>> {
    let user = users::set_active(&state.service_db, &actor.subject, &id, body.active).await?;
    Ok(Json(json!({ "message": "User updated", "user": user })))
}
