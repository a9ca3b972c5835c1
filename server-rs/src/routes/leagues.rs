use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::{ValidJson, ValidQuery};
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::services::{drafts, leagues};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    pub status: Option<String>,
}

// --- Public ---

pub async fn list_leagues(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<PageQuery>,
) -> AppResult<Json<Paginated<League>>> {
    let page = q.resolve(leagues::DEFAULT_PAGE_SIZE)?;
    Ok(Json(leagues::list_approved(state.db.store(), page).await?))
}

pub async fn get_league(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let league = leagues::get_approved(state.db.store(), id).await?;
    Ok(Json(json!({ "league": league })))
}

// --- Members ---

pub async fn create_league(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidQuery(q): ValidQuery<OrgQuery>,
    ValidJson(body): ValidJson<LeagueInput>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let league = leagues::create(&state.db, &state.notifier, &user.subject, q.org_id, body).await?;
    let message = match league.status {
        SubmissionStatus::Approved => "League created and approved",
        _ => "League submitted for review",
    };
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": message, "league": league })),
    ))
}

pub async fn list_org_leagues(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
    ValidQuery(q): ValidQuery<StatusFilter>,
) -> AppResult<Json<Value>> {
    let leagues =
        leagues::list_for_org(&state.db, &user.subject, org_id, q.status.as_deref()).await?;
    Ok(Json(json!({ "leagues": leagues })))
}

// --- Drafts ---

pub async fn get_draft(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidQuery(q): ValidQuery<OrgQuery>,
) -> AppResult<Json<Value>> {
    let draft = drafts::get_draft(&state.db, &user.subject, q.org_id).await?;
    Ok(Json(json!({ "draft": draft })))
}

pub async fn save_draft(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidQuery(q): ValidQuery<OrgQuery>,
    ValidJson(body): ValidJson<SaveDraftRequest>,
) -> AppResult<Json<Value>> {
    let draft = drafts::save_draft(&state.db, &state.notifier, &user.subject, q.org_id, body).await?;
    Ok(Json(json!({ "message": "Draft saved", "draft": draft })))
}

pub async fn delete_draft(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    ValidQuery(q): ValidQuery<OrgQuery>,
) -> AppResult<Json<Value>> {
    drafts::delete_draft(&state.db, &user.subject, q.org_id, id).await?;
    Ok(Json(json!({ "message": "Draft deleted" })))
}

pub async fn list_org_drafts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(org_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let drafts = drafts::list_drafts(&state.db, &user.subject, org_id).await?;
    Ok(Json(json!({ "drafts": drafts })))
}

// --- Templates ---

pub async fn list_templates(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidQuery(q): ValidQuery<OrgQuery>,
) -> AppResult<Json<Value>> {
    let templates = drafts::list_templates(&state.db, &user.subject, q.org_id).await?;
    Ok(Json(json!({ "templates": templates })))
}

pub async fn create_template(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidQuery(q): ValidQuery<OrgQuery>,
    ValidJson(body): ValidJson<TemplateRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let template =
        drafts::create_template(&state.db, &state.notifier, &user.subject, q.org_id, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Template created", "template": template })),
    ))
}

pub async fn get_template(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let template = drafts::get_template(&state.db, &user.subject, id).await?;
    Ok(Json(json!({ "template": template })))
}

pub async fn update_template(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    ValidJson(body): ValidJson<TemplateRequest>,
) -> AppResult<Json<Value>> {
    let template = drafts::update_template(&state.db, &user.subject, id, body).await?;
    Ok(Json(json!({ "message": "Template updated", "template": template })))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    drafts::delete_template(&state.db, &user.subject, id).await?;
    Ok(Json(json!({ "message": "Template deleted" })))
}

// --- Admin ---

pub async fn admin_list_leagues(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<PageQuery>,
) -> AppResult<Json<Paginated<League>>> {
    let page = q.resolve(leagues::DEFAULT_PAGE_SIZE)?;
    Ok(Json(leagues::admin_list_all(&state.service_db, page).await?))
}

pub async fn admin_list_pending(
    State(state): State<AppState>,
    ValidQuery(q): ValidQuery<PageQuery>,
) -> AppResult<Json<Paginated<League>>> {
    let page = q.resolve(leagues::DEFAULT_PAGE_SIZE)?;
    Ok(Json(leagues::admin_list_pending(&state.service_db, page).await?))
}

pub async fn admin_get_league(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let league = leagues::admin_get(&state.service_db, id).await?;
    Ok(Json(json!({ "league": league })))
}

pub async fn admin_update_league(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidJson(body): ValidJson<LeagueInput>,
) -> AppResult<Json<Value>> {
    let league = leagues::admin_update(&state.service_db, id, body).await?;
    Ok(Json(json!({ "message": "League updated", "league": league })))
}

pub async fn admin_list_drafts(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let drafts = drafts::admin_list_drafts(&state.service_db).await?;
    Ok(Json(json!({ "drafts": drafts })))
}

pub async fn approve_league(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let league = leagues::approve(&state.service_db, &state.notifier, &user.subject, id).await?;
    Ok(Json(json!({ "message": "League approved", "league": league })))
}

pub async fn reject_league(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    ValidJson(body): ValidJson<RejectRequest>,
) -> AppResult<Json<Value>> {
    let league = leagues::reject(
        &state.service_db,
        &state.notifier,
        &user.subject,
        id,
        &body.rejection_reason,
    )
    .await?;
    Ok(Json(json!({ "message": "League rejected", "league": league })))
}
