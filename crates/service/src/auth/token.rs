use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::domain::UserClaims;

#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, wrong algorithm, expired, malformed or wrong token kind.
    #[error("invalid token")]
    InvalidToken(#[source] JwtError),
    #[error("token encoding failed: {0}")]
    Encoding(#[source] JwtError),
}

#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TokenKind {
    Access,
    Refresh,
}

/// Wire claim set. Key names are shared with existing clients.
#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    #[serde(rename = "userId")]
    user_id: i64,
    email: String,
    roles: Vec<String>,
    firstname: String,
    lastname: String,
    typ: TokenKind,
    iat: i64,
    exp: i64,
    jti: String,
}

impl TokenPayload {
    fn into_claims(self) -> UserClaims {
        UserClaims {
            user_id: self.user_id,
            email: self.email,
            roles: self.roles,
            first_name: self.firstname,
            last_name: self.lastname,
        }
    }
}

/// Issues and verifies HS256 access/refresh tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

fn secs(d: Duration) -> i64 {
    i64::try_from(d.as_secs()).unwrap_or(i64::MAX)
}

impl TokenService {
    pub fn new(cfg: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            validation,
            access_ttl_secs: secs(cfg.access_ttl),
            refresh_ttl_secs: secs(cfg.refresh_ttl),
        }
    }

    pub fn generate_access_token(&self, claims: &UserClaims) -> Result<String, TokenError> {
        self.issue(claims, TokenKind::Access, self.access_ttl_secs)
    }

    pub fn generate_refresh_token(&self, claims: &UserClaims) -> Result<String, TokenError> {
        self.issue(claims, TokenKind::Refresh, self.refresh_ttl_secs)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<UserClaims, TokenError> {
        self.verify(token, TokenKind::Access)
    }

    pub fn validate_refresh_token(&self, token: &str) -> Result<UserClaims, TokenError> {
        self.verify(token, TokenKind::Refresh)
    }

    fn issue(&self, claims: &UserClaims, typ: TokenKind, ttl_secs: i64) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let payload = TokenPayload {
            user_id: claims.user_id,
            email: claims.email.clone(),
            roles: claims.roles.clone(),
            firstname: claims.first_name.clone(),
            lastname: claims.last_name.clone(),
            typ,
            iat: now,
            exp: now.saturating_add(ttl_secs),
            jti: Uuid::new_v4().to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding).map_err(TokenError::Encoding)
    }

    fn verify(&self, token: &str, expected: TokenKind) -> Result<UserClaims, TokenError> {
        let data = decode::<TokenPayload>(token, &self.decoding, &self.validation)
            .map_err(TokenError::InvalidToken)?;
        let payload = data.claims;
        // The library accepts `exp == now`; a token must expire strictly in the future.
        if payload.exp <= Utc::now().timestamp() {
            return Err(TokenError::InvalidToken(ErrorKind::ExpiredSignature.into()));
        }
        if payload.typ != expected {
            return Err(TokenError::InvalidToken(ErrorKind::InvalidToken.into()));
        }
        Ok(payload.into_claims())
    }
}
