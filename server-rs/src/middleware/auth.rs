use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::GlobalRole;
use crate::AppState;

/// Carries the verified subject to downstream handlers.
pub const SUBJECT_HEADER: HeaderName = HeaderName::from_static("x-clerk-user-id");

const SUPABASE_ISSUER: &str = "https://supabase.io/auth/v1";
const SUPABASE_AUDIENCE: &str = "authenticated";
const SUPABASE_TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseClaims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub subject: String,
}

/// HS256 token the frontend presents to Supabase directly. Refuses to sign
/// with an empty secret.
pub fn mint_supabase_token(
    subject: &str,
    email: &str,
    role: GlobalRole,
    secret: &str,
) -> AppResult<String> {
    if secret.is_empty() {
        return Err(AppError::Internal(
            "SUPABASE_JWT_SECRET is not configured".into(),
        ));
    }
    let now = Utc::now().timestamp();
    let claims = SupabaseClaims {
        sub: subject.to_string(),
        email: email.to_string(),
        role: role.as_str().to_string(),
        exp: now + SUPABASE_TOKEN_TTL_SECS,
        iat: now,
        iss: SUPABASE_ISSUER.to_string(),
        aud: SUPABASE_AUDIENCE.to_string(),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

fn forwarded_subject(req: &Request) -> Option<String> {
    req.headers()
        .get(&SUBJECT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Middleware: resolves the caller's subject and sets `AuthUser`.
///
/// A bearer token is always verified with the identity provider and its
/// subject overwrites any forwarded `X-Clerk-User-ID`. Outside production a
/// bare `X-Clerk-User-ID` is accepted for local tooling.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let has_auth_header = req.headers().contains_key(axum::http::header::AUTHORIZATION);
    let bearer = req.headers().typed_get::<Authorization<Bearer>>();

    let subject = match bearer {
        Some(Authorization(bearer)) => state.identity.verify_token(bearer.token()).await?,
        None if has_auth_header => {
            return Err(AppError::Unauthorized("Malformed authorization header".into()))
        }
        None if !state.config.is_production() => forwarded_subject(&req)
            .ok_or_else(|| AppError::Unauthorized("No token provided".into()))?,
        None => return Err(AppError::Unauthorized("No token provided".into())),
    };

    let value = HeaderValue::from_str(&subject)
        .map_err(|_| AppError::Unauthorized("Invalid token subject".into()))?;
    req.headers_mut().insert(SUBJECT_HEADER, value);
    req.extensions_mut().insert(AuthUser { subject });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn supabase_token_carries_expected_claims() {
        let token = mint_supabase_token("user_1", "a@x.test", GlobalRole::Admin, "s3cret").unwrap();

        let mut validation = Validation::default();
        validation.set_audience(&["authenticated"]);
        validation.set_issuer(&["https://supabase.io/auth/v1"]);
        let claims = decode::<SupabaseClaims>(
            &token,
            &DecodingKey::from_secret(b"s3cret"),
            &validation,
        )
        .unwrap()
        .claims;

        assert_eq!(claims.sub, "user_1");
        assert_eq!(claims.email, "a@x.test");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn empty_secret_is_refused() {
        let err = mint_supabase_token("user_1", "a@x.test", GlobalRole::User, "").unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
