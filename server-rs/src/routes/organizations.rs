use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppResult;
use crate::extract::ValidJson;
use crate::middleware::auth::AuthUser;
use crate::models::*;
use crate::services::organizations;
use crate::store::*;
use crate::AppState;

pub async fn create_org(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidJson(body): ValidJson<CreateOrganizationRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let org = organizations::create(&state.db, &user.subject, body).await?;
    Ok((StatusCode::CREATED, Json(json!({ "organization": org }))))
}

pub async fn list_my_orgs(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> AppResult<Json<Value>> {
    let orgs = state.db.list_organizations_for_user(&user.subject).await?;
    Ok(Json(json!({ "organizations": orgs })))
}

pub async fn list_all_orgs(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let orgs = state.service_db.list_organizations().await?;
    Ok(Json(json!({ "organizations": orgs })))
}

pub async fn get_org(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let org = organizations::get(&state.db, &user.subject, id).await?;
    Ok(Json(json!({ "organization": org })))
}

pub async fn join_org(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidJson(body): ValidJson<JoinOrganizationRequest>,
) -> AppResult<Json<Value>> {
    let membership = organizations::join(&state.db, &user.subject, body.org_id).await?;
    Ok(Json(json!({ "message": "Joined organization", "membership": membership })))
}

pub async fn update_org(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    ValidJson(body): ValidJson<OrganizationChanges>,
) -> AppResult<Json<Value>> {
    let org = organizations::update(&state.db, &user.subject, id, body).await?;
    Ok(Json(json!({ "organization": org })))
}

pub async fn delete_org(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    organizations::delete(&state.db, &user.subject, id).await?;
    Ok(Json(json!({ "message": "Organization deleted" })))
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let members = organizations::members(&state.db, &user.subject, id).await?;
    Ok(Json(json!({ "members": members })))
}

pub async fn leave_org(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    organizations::leave(&state.db, &user.subject, id).await?;
    Ok(Json(json!({ "message": "Left organization" })))
}

pub async fn set_member_role(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((id, member_id)): Path<(Uuid, String)>,
    ValidJson(body): ValidJson<UpdateMemberRoleRequest>,
) -> AppResult<Json<Value>> {
    let membership =
        organizations::set_member_role(&state.db, &user.subject, id, &member_id, body).await?;
    Ok(Json(json!({ "membership": membership })))
}
