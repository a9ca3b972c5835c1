use crate::db::ServiceDb;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::mint_supabase_token;
use crate::models::*;
use crate::services::clerk_service::{sync_metadata_best_effort, IdentityProvider};
use crate::store::*;

pub struct Registration {
    pub user: User,
    pub organization: Option<Organization>,
}

/// Registers a subject. The first registrant ever becomes the global admin.
pub async fn register(
    db: &ServiceDb,
    identity: &dyn IdentityProvider,
    req: RegisterRequest,
) -> AppResult<Registration> {
    let subject = req.clerk_id.trim().to_string();
    if subject.is_empty() {
        return Err(AppError::Validation("clerkID is required".into()));
    }
    if db.user_exists(&subject).await? {
        return Err(AppError::Conflict("User already exists".into()));
    }

    let mut email = req.email.trim().to_string();
    if email.is_empty() {
        email = identity.fetch_primary_email(&subject).await.map_err(|e| {
            tracing::warn!(subject = %subject, error = %e, "primary email lookup failed");
            AppError::Validation("email is required".into())
        })?;
    }

    // Two concurrent first registrations may both see no admin; accepted.
    let role = if db.admin_exists().await? {
        GlobalRole::User
    } else {
        GlobalRole::Admin
    };

    let user = db
        .create_user(&NewUser {
            id: subject.clone(),
            email,
            role,
        })
        .await?;
    tracing::info!(subject = %subject, role = role.as_str(), "user registered");

    let org_name = req.organization_name.trim();
    let organization = if org_name.is_empty() {
        None
    } else {
        let org = db
            .create_organization(&NewOrganization {
                name: org_name.to_string(),
                url: None,
                email: None,
                phone: None,
                address: None,
                created_by: subject.clone(),
            })
            .await?;
        tracing::info!(subject = %subject, org_id = %org.id, "organization created at registration");
        Some(org)
    };

    sync_metadata_best_effort(identity, &subject, role.as_str(), org_name).await;

    Ok(Registration { user, organization })
}

/// Resolves the session, records the login and issues a Supabase token.
pub async fn login(
    db: &ServiceDb,
    identity: &dyn IdentityProvider,
    jwt_secret: &str,
    req: LoginRequest,
) -> AppResult<LoginResponse> {
    if req.session_id.trim().is_empty() {
        return Err(AppError::Validation("sessionID is required".into()));
    }
    let subject = identity.resolve_session(req.session_id.trim()).await?;
    if !get_user(db.store(), &subject).await?.is_active {
        return Err(AppError::Forbidden("User is inactive".into()));
    }
    let user = db
        .update_last_login(&subject)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let supabase_token = mint_supabase_token(&user.id, &user.email, user.role, jwt_secret)?;
    tracing::info!(subject = %user.id, login_count = user.login_count, "user logged in");
    Ok(LoginResponse {
        user,
        supabase_token,
    })
}

pub async fn get_user(db: &dyn Store, id: &str) -> AppResult<User> {
    db.get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

pub async fn update_role(
    db: &ServiceDb,
    identity: &dyn IdentityProvider,
    id: &str,
    req: UpdateRoleRequest,
) -> AppResult<User> {
    let role: GlobalRole = req
        .role
        .trim()
        .parse()
        .map_err(|_| AppError::Validation("role must be \"user\" or \"admin\"".into()))?;
    let user = db
        .update_role(id, role)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let org_name = db
        .list_organizations_for_user(id)
        .await?
        .into_iter()
        .next()
        .map(|o| o.organization.name)
        .unwrap_or_default();
    sync_metadata_best_effort(identity, id, role.as_str(), &org_name).await;

    tracing::info!(subject = %id, role = role.as_str(), "role updated");
    Ok(user)
}

/// Activates or deactivates an account. Admins cannot deactivate themselves.
pub async fn set_active(db: &ServiceDb, actor: &str, id: &str, active: bool) -> AppResult<User> {
    if actor == id && !active {
        return Err(AppError::Conflict("Admins cannot deactivate themselves".into()));
    }
    let user = db
        .set_user_active(id, active)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    tracing::info!(subject = %id, active, "user activation changed");
    Ok(user)
}
