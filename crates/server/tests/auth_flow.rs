use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use server::routes::{self, auth::ServerState};
use service::auth::{BcryptHasher, InMemoryUserRepository, TokenConfig, TokenService, User, UserRepository};

const SECRET: &str = "test-secret";

fn cors() -> tower_http::cors::CorsLayer {
    tower_http::cors::CorsLayer::very_permissive()
}

fn tokens() -> Arc<TokenService> {
    Arc::new(TokenService::new(&TokenConfig {
        secret: SECRET.into(),
        access_ttl: Duration::from_secs(3600),
        refresh_ttl: Duration::from_secs(86400),
    }))
}

fn build_app() -> (Router, Arc<InMemoryUserRepository>) {
    let repo = Arc::new(InMemoryUserRepository::new());
    let state = ServerState::new(repo.clone(), Arc::new(BcryptHasher::new(4)), tokens(), false);
    (routes::build_router(state, cors()), repo)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_bearer(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json");
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    builder.body(body).unwrap()
}

async fn json_body(resp: axum::response::Response) -> anyhow::Result<Value> {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn login(app: &Router, email: &str, password: &str) -> anyhow::Result<Value> {
    let resp = app
        .clone()
        .oneshot(post_json("/auth/login", json!({"email": email, "password": password})))
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    json_body(resp).await
}

/// Register through the API, then promote the user in the store.
async fn admin_token(app: &Router, repo: &InMemoryUserRepository) -> anyhow::Result<String> {
    let resp = app
        .clone()
        .oneshot(post_json("/auth/register", json!({"email": "admin@example.com", "password": "Adm1n-pw"})))
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let mut admin: User = repo.get_user_by_email("admin@example.com").await?.expect("registered admin");
    admin.roles = vec!["admin".into()];
    repo.update_user(&admin).await?;
    let pair = login(app, "admin@example.com", "Adm1n-pw").await?;
    Ok(pair["accessToken"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn health_is_public() -> anyhow::Result<()> {
    let (app, _repo) = build_app();
    let resp = app.oneshot(Request::builder().uri("/health").body(Body::empty())?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await?, json!({"status": "ok"}));
    Ok(())
}

#[tokio::test]
async fn register_login_refresh_flow() -> anyhow::Result<()> {
    let (app, _repo) = build_app();

    let resp = app
        .clone()
        .oneshot(post_json("/auth/register", json!({"email": "reader@example.com", "password": "S3curePass!"})))
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let registered = json_body(resp).await?;
    let claims = tokens().validate_access_token(registered["token"].as_str().unwrap_or_default())?;
    assert_eq!(claims.email, "reader@example.com");

    let resp = app
        .clone()
        .oneshot(post_json("/auth/login", json!({"email": "reader@example.com", "password": "S3curePass!"})))
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = resp.headers().get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    assert!(cookie.starts_with("auth_token="), "cookie: {cookie}");
    assert!(cookie.contains("HttpOnly"));
    let pair = json_body(resp).await?;
    let access = pair["accessToken"].as_str().unwrap_or_default().to_string();
    let refresh = pair["refreshToken"].as_str().unwrap_or_default().to_string();

    let resp = app.clone().oneshot(with_bearer("GET", "/auth/me", &access, None)).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let me = json_body(resp).await?;
    assert_eq!(me["email"], "reader@example.com");
    assert_eq!(me["roles"], json!(["user"]));

    let resp = app
        .clone()
        .oneshot(post_json("/auth/refresh", json!({"refreshToken": refresh})))
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let next = json_body(resp).await?;
    assert!(next["accessToken"].as_str().is_some_and(|t| !t.is_empty()));

    // an access token is not a refresh token
    let resp = app
        .clone()
        .oneshot(post_json("/auth/refresh", json!({"refreshToken": access})))
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn cookie_authenticates_when_header_is_absent() -> anyhow::Result<()> {
    let (app, _repo) = build_app();
    app.clone()
        .oneshot(post_json("/auth/register", json!({"email": "cookie@example.com", "password": "pw-123"})))
        .await?;
    let pair = login(&app, "cookie@example.com", "pw-123").await?;
    let access = pair["accessToken"].as_str().unwrap_or_default();

    let req = Request::builder()
        .uri("/auth/me")
        .header(header::COOKIE, format!("auth_token={access}"))
        .body(Body::empty())?;
    let resp = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.oneshot(post_json("/auth/logout", json!({}))).await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(resp.headers().get(header::SET_COOKIE).is_some());
    Ok(())
}

#[tokio::test]
async fn duplicate_registration_conflicts() -> anyhow::Result<()> {
    let (app, _repo) = build_app();
    let body = json!({"email": "dup@example.com", "password": "pw1"});
    let first = app.clone().oneshot(post_json("/auth/register", body.clone())).await?;
    assert_eq!(first.status(), StatusCode::CREATED);
    let second = app.oneshot(post_json("/auth/register", body)).await?;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(second).await?, json!({"error": "Email already registered"}));
    Ok(())
}

#[tokio::test]
async fn bad_input_and_bad_credentials() -> anyhow::Result<()> {
    let (app, _repo) = build_app();

    let resp = app.clone().oneshot(post_json("/auth/register", json!({"email": "x@example.com"}))).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await?["error"], "Email and password are required");

    let resp = app.clone().oneshot(post_json("/auth/register", json!({"email": "nope", "password": "pw"}))).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await?["error"], "Email must be a valid email address.");

    let resp = app
        .clone()
        .oneshot(post_json("/auth/login", json!({"email": "ghost@example.com", "password": "pw"})))
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await?["error"], "Invalid email and password");
    Ok(())
}

#[tokio::test]
async fn guarded_routes_require_a_valid_token() -> anyhow::Result<()> {
    let (app, _repo) = build_app();

    let resp = app.clone().oneshot(Request::builder().uri("/auth/me").body(Body::empty())?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.clone().oneshot(with_bearer("GET", "/auth/me", "not.a.token", None)).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let other = TokenService::new(&TokenConfig {
        secret: "someone-else".into(),
        access_ttl: Duration::from_secs(60),
        refresh_ttl: Duration::from_secs(60),
    });
    let forged = other.generate_access_token(&service::auth::UserClaims {
        user_id: 1,
        email: "x@example.com".into(),
        roles: vec!["admin".into()],
        first_name: String::new(),
        last_name: String::new(),
    })?;
    let resp = app.oneshot(with_bearer("GET", "/auth/users", &forged, None)).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn admin_routes_forbid_plain_users() -> anyhow::Result<()> {
    let (app, _repo) = build_app();
    let resp = app
        .clone()
        .oneshot(post_json("/auth/register", json!({"email": "plain@example.com", "password": "pw1"})))
        .await?;
    let token = json_body(resp).await?["token"].as_str().unwrap_or_default().to_string();

    let resp = app.clone().oneshot(with_bearer("GET", "/auth/users", &token, None)).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = app.oneshot(with_bearer("DELETE", "/auth/users/1", &token, None)).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn admin_manages_users() -> anyhow::Result<()> {
    let (app, repo) = build_app();
    let admin = admin_token(&app, &repo).await?;

    let resp = app
        .clone()
        .oneshot(with_bearer(
            "POST",
            "/auth/users",
            &admin,
            Some(json!({"firstName": "Grace", "lastName": "Hopper", "email": "grace@example.com", "password": "cobol-59"})),
        ))
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json_body(resp).await?;
    assert!(created.get("password").is_none() && created.get("salt").is_none());
    let id = created["id"].as_i64().unwrap_or_default();

    let resp = app
        .clone()
        .oneshot(with_bearer(
            "PUT",
            &format!("/auth/users/{id}"),
            &admin,
            Some(json!({"firstName": "Grace", "lastName": "Murray", "email": "grace@example.com", "isAdmin": true})),
        ))
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await?["roles"], json!(["admin"]));

    let resp = app.clone().oneshot(with_bearer("GET", "/auth/users", &admin, None)).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let list = json_body(resp).await?;
    let emails: Vec<&str> = list.as_array().map(|a| a.iter().filter_map(|u| u["email"].as_str()).collect()).unwrap_or_default();
    assert_eq!(emails, vec!["admin@example.com", "grace@example.com"]);

    let resp = app.clone().oneshot(with_bearer("DELETE", &format!("/auth/users/{id}"), &admin, None)).await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = app.oneshot(with_bearer("DELETE", &format!("/auth/users/{id}"), &admin, None)).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn profile_update_uses_token_identity() -> anyhow::Result<()> {
    let (app, _repo) = build_app();
    let resp = app
        .clone()
        .oneshot(post_json("/auth/register", json!({"email": "me@example.com", "password": "pw1"})))
        .await?;
    let token = json_body(resp).await?["token"].as_str().unwrap_or_default().to_string();

    let resp = app
        .clone()
        .oneshot(with_bearer("PUT", "/auth/profile", &token, Some(json!({"firstName": "Hedy", "lastName": "Lamarr"}))))
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let view = json_body(resp).await?;
    assert_eq!(view["email"], "me@example.com");
    assert_eq!(view["lastName"], "Lamarr");

    let resp = app
        .oneshot(with_bearer("PUT", "/auth/profile", &token, Some(json!({"firstName": "H", "lastName": "Lamarr"}))))
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn passwords_past_bcrypt_limit_are_not_truncated() -> anyhow::Result<()> {
    let (app, repo) = build_app();
    let prefix = "z".repeat(72);

    let resp = app
        .clone()
        .oneshot(post_json("/auth/register", json!({"email": "long@example.com", "password": format!("{prefix}-right")})))
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await?["error"], "Password is too long");
    assert!(repo.get_user_by_email("long@example.com").await?.is_none());

    let mut user = User::with_email("legacy@example.com", vec!["user".into()]);
    // Hash from a bcrypt that silently keeps only the first 72 bytes.
    user.set_password_hash(bcrypt::hash(format!("{prefix}-right"), 4)?);
    repo.add_user(&mut user).await?;
    let resp = app
        .oneshot(post_json("/auth/login", json!({"email": "legacy@example.com", "password": format!("{prefix}-WRONG")})))
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await?["error"], "Invalid email and password");
    Ok(())
}

#[tokio::test]
async fn undecodable_bodies_use_the_error_shape() -> anyhow::Result<()> {
    let (app, repo) = build_app();
    let admin = admin_token(&app, &repo).await?;

    let malformed = Request::builder()
        .method("POST")
        .uri("/auth/users")
        .header(header::AUTHORIZATION, format!("Bearer {admin}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))?;
    let resp = app.clone().oneshot(malformed).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await?["error"].is_string());

    let untyped = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .body(Body::from(json!({"email": "a@example.com", "password": "pw"}).to_string()))?;
    let resp = app.clone().oneshot(untyped).await?;
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(json_body(resp).await?["error"].is_string());

    let wrong_type = with_bearer("PUT", "/auth/users/1", &admin, Some(json!({"isAdmin": "yes"})));
    let resp = app.clone().oneshot(wrong_type).await?;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(resp).await?["error"].is_string());

    // Missing fields decode as empty and fail validation instead.
    let resp = app
        .clone()
        .oneshot(with_bearer("POST", "/auth/users", &admin, Some(json!({"email": "n@example.com"}))))
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await?["error"], "Email and password are required");

    let resp = app.oneshot(with_bearer("PUT", "/auth/profile", &admin, Some(json!({})))).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await?["error"].is_string());
    Ok(())
}
