use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::extract::{ValidJson, ValidQuery};
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::services::sports;
use crate::AppState;

pub async fn list_sports(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let sports = sports::list_approved(state.db.store()).await?;
    Ok(Json(json!({ "sports": sports })))
}

pub async fn get_sport(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let sport = sports::get_approved(state.db.store(), id).await?;
    Ok(Json(json!({ "sport": sport })))
}

pub async fn sport_exists(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<SportExistsQuery>,
) -> AppResult<Json<Value>> {
    let exists = sports::exists(state.db.store(), &q.name).await?;
    Ok(Json(json!({ "exists": exists })))
}

/// 201 with the new row, or 200 with the existing one for a known name.
pub async fn create_sport(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidJson(body): ValidJson<CreateSportRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let created = sports::create(&state.db, &user.subject, body).await?;
    let (code, message) = if created.inserted {
        (StatusCode::CREATED, "Sport created")
    } else {
        (StatusCode::OK, "Sport already exists")
    };
    Ok((code, Json(json!({ "message": message, "sport": created.record }))))
}

pub async fn list_pending_sports(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let sports = sports::admin_list_pending(&state.service_db).await?;
    Ok(Json(json!({ "sports": sports })))
}

pub async fn approve_sport(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let sport = sports::approve(&state.service_db, &state.notifier, &user.subject, id).await?;
    Ok(Json(json!({ "message": "Sport approved", "sport": sport })))
}

pub async fn reject_sport(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    ValidJson(body): ValidJson<RejectRequest>,
) -> AppResult<Json<Value>> {
    let sport = sports::reject(
        &state.service_db,
        &state.notifier,
        &user.subject,
        id,
        &body.rejection_reason,
    )
    .await?;
    Ok(Json(json!({ "message": "Sport rejected", "sport": sport })))
}
