use thiserror::Error;

use super::hasher::HashError;
use super::token::TokenError;
use super::validation::ValidationError;

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Email and password are required")]
    MissingCredentials,
    #[error("Email already registered")]
    EmailAlreadyRegistered,
    /// Unknown email and wrong password share this variant and message.
    #[error("Invalid email and password")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken(#[source] TokenError),
    #[error("stored password hash is malformed")]
    InvalidHashFormat,
    #[error("User not found")]
    NotFound,
    #[error("Password is too long")]
    PasswordTooLong,
    #[error("hashing error: {0}")]
    Hashing(String),
    #[error("token error: {0}")]
    TokenIssue(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::MissingCredentials => 1002,
            AuthError::EmailAlreadyRegistered => 1003,
            AuthError::InvalidCredentials => 1004,
            AuthError::InvalidToken(_) => 1005,
            AuthError::NotFound => 1006,
            AuthError::PasswordTooLong => 1007,
            AuthError::InvalidHashFormat => 1100,
            AuthError::Hashing(_) => 1101,
            AuthError::TokenIssue(_) => 1102,
            AuthError::Repository(_) => 1200,
        }
    }
}

impl From<HashError> for AuthError {
    fn from(err: HashError) -> Self {
        match err {
            HashError::InvalidHashFormat(_) => AuthError::InvalidHashFormat,
            HashError::PasswordTooLong => AuthError::PasswordTooLong,
            HashError::Hashing(msg) => AuthError::Hashing(msg),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken(_) => AuthError::InvalidToken(err),
            TokenError::Encoding(e) => AuthError::TokenIssue(e.to_string()),
        }
    }
}
