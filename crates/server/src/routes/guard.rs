use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use service::auth::TokenService;

use crate::errors::ApiError;

pub const AUTH_COOKIE: &str = "auth_token";

/// State for [`require_roles`]: who may pass.
///
/// An empty role list admits any authenticated caller.
#[derive(Clone)]
pub struct RoleGuard {
    tokens: Arc<TokenService>,
    allowed_roles: Arc<[String]>,
}

impl RoleGuard {
    pub fn new<I, S>(tokens: Arc<TokenService>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed_roles: Vec<String> = roles.into_iter().map(Into::into).collect();
        Self { tokens, allowed_roles: allowed_roles.into() }
    }

    pub fn authenticated(tokens: Arc<TokenService>) -> Self {
        Self::new(tokens, Vec::<String>::new())
    }
}

/// `Authorization: Bearer <token>`, falling back to the `auth_token` cookie.
fn extract_token(headers: &HeaderMap) -> Result<String, ApiError> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let raw = value.to_str().map_err(|_| ApiError::unauthorized("malformed Authorization header"))?;
        return match raw.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(ApiError::unauthorized("expected a Bearer token")),
        };
    }
    CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))
}

/// 401 without a valid access token, 403 when none of the allowed roles is held.
/// On success the verified `UserClaims` are available as a request extension.
pub async fn require_roles(
    State(guard): State<RoleGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    let token = extract_token(req.headers()).map_err(|e| {
        tracing::warn!(path = %path, reason = %e.message, "request rejected");
        e
    })?;

    let claims = guard.tokens.validate_access_token(&token).map_err(|e| {
        tracing::warn!(path = %path, err = ?e, "token validation failed");
        ApiError::unauthorized("invalid token")
    })?;

    if !claims.has_any_role(&guard.allowed_roles[..]) {
        tracing::warn!(path = %path, user_id = claims.user_id, "role check failed");
        return Err(ApiError::forbidden());
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
