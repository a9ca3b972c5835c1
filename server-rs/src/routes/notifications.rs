use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::extract::{ValidJson, ValidQuery};
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::services::notifications::DEFAULT_PAGE_SIZE;
use crate::AppState;

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidQuery(q): ValidQuery<PageQuery>,
) -> AppResult<Json<Paginated<Notification>>> {
    let page = q.resolve(DEFAULT_PAGE_SIZE)?;
    Ok(Json(state.notifier.list(&user.subject, page).await?))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let notification = state.notifier.mark_read(id, &user.subject).await?;
    Ok(Json(json!({ "notification": notification })))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Value>> {
    let updated = state.notifier.mark_all_read(&user.subject).await?;
    Ok(Json(json!({ "updated": updated })))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Value>> {
    let count = state.notifier.unread_count(&user.subject).await?;
    Ok(Json(json!({ "count": count })))
}

pub async fn get_preferences(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<NotificationPreferences>> {
    Ok(Json(state.notifier.get_preferences(&user.subject).await?))
}

pub async fn update_preferences(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidJson(body): ValidJson<PreferenceChanges>,
) -> AppResult<Json<NotificationPreferences>> {
    Ok(Json(
        state
            .notifier
            .update_preferences(&user.subject, &body)
            .await?,
    ))
}
