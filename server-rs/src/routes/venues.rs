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
use crate::services::venues;
use crate::AppState;

pub async fn list_venues(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let venues = venues::list_approved(state.db.store()).await?;
    Ok(Json(json!({ "venues": venues })))
}

pub async fn get_venue(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let venue = venues::get_approved(state.db.store(), id).await?;
    Ok(Json(json!({ "venue": venue })))
}

pub async fn venue_exists(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<VenueExistsQuery>,
) -> AppResult<Json<Value>> {
    let exists = venues::exists(state.db.store(), &q.address).await?;
    Ok(Json(json!({ "exists": exists })))
}

pub async fn create_venue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidJson(body): ValidJson<CreateVenueRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let created = venues::create(&state.db, &user.subject, body).await?;
    let (code, message) = if created.inserted {
        (StatusCode::CREATED, "Venue created")
    } else {
        (StatusCode::OK, "Venue already exists")
    };
    Ok((code, Json(json!({ "message": message, "venue": created.record }))))
}

pub async fn list_pending_venues(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let venues = venues::admin_list_pending(&state.service_db).await?;
    Ok(Json(json!({ "venues": venues })))
}

pub async fn approve_venue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let venue = venues::approve(&state.service_db, &state.notifier, &user.subject, id).await?;
    Ok(Json(json!({ "message": "Venue approved", "venue": venue })))
}

pub async fn reject_venue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    ValidJson(body): ValidJson<RejectRequest>,
) -> AppResult<Json<Value>> {
    let venue = venues::reject(
        &state.service_db,
        &state.notifier,
        &user.subject,
        id,
        &body.rejection_reason,
    )
    .await?;
    Ok(Json(json!({ "message": "Venue rejected", "venue": venue })))
}
