use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

use service::auth::domain::UserView;
use service::auth::{AuthService, AuthTokens, PasswordHasher, TokenService, UserClaims, UserRepository};

use super::guard::AUTH_COOKIE;
use crate::errors::ApiError;

#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService<dyn UserRepository>>,
    pub tokens: Arc<TokenService>,
    pub secure_cookies: bool,
}

impl ServerState {
    pub fn new(
        repo: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenService>,
        secure_cookies: bool,
    ) -> Self {
        let auth = Arc::new(AuthService::new(repo, hasher, Arc::clone(&tokens)));
        Self { auth, tokens, secure_cookies }
    }
}

/// Missing fields deserialize as empty and are rejected by the service.
#[derive(Debug, Deserialize)]
pub struct CredentialsInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshInput {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileInput {
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterOutput {
    pub token: String,
}

pub async fn register(
    State(state): State<ServerState>,
    WithRejection(Json(input), _): WithRejection<Json<CredentialsInput>, ApiError>,
) -> Result<(StatusCode, Json<RegisterOutput>), ApiError> {
    let token = state.auth.register(&input.email, &input.password).await?;
    Ok((StatusCode::CREATED, Json(RegisterOutput { token })))
}

pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    WithRejection(Json(input), _): WithRejection<Json<CredentialsInput>, ApiError>,
) -> Result<(CookieJar, Json<AuthTokens>), ApiError> {
    let pair = state.auth.login(&input.email, &input.password).await?;
    let mut cookie = Cookie::new(AUTH_COOKIE, pair.access_token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(state.secure_cookies);
    cookie.set_same_site(SameSite::Lax);
    Ok((jar.add(cookie), Json(pair)))
}

pub async fn refresh(
    State(state): State<ServerState>,
    WithRejection(Json(input), _): WithRejection<Json<RefreshInput>, ApiError>,
) -> Result<Json<AuthTokens>, ApiError> {
    Ok(Json(state.auth.refresh(&input.refresh_token).await?))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

pub async fn me(Extension(claims): Extension<UserClaims>) -> Json<UserClaims> {
    Json(claims)
}

pub async fn update_profile(
    State(state): State<ServerState>,
    Extension(claims): Extension<UserClaims>,
    WithRejection(Json(input), _): WithRejection<Json<ProfileInput>, ApiError>,
) -> Result<Json<UserView>, ApiError> {
    let user = state
        .auth
        .update_profile(&claims.email, &input.first_name, &input.last_name)
        .await?;
    Ok(Json(UserView::from(&user)))
}
