#![cfg(test)]
use std::sync::Arc;
use std::time::Duration;

use crate::auth::domain::{User, ROLE_USER};
use crate::auth::repo::seaorm::SeaOrmUserRepository;
use crate::auth::{AuthService, BcryptHasher, InMemoryUserRepository, TokenConfig, TokenService};

pub const TEST_SECRET: &str = "test-signing-secret";

/// Lowest bcrypt cost; keeps hashing tests fast.
pub fn fast_hasher() -> BcryptHasher {
    BcryptHasher::new(4)
}

/// A user that passes every validation rule.
pub fn valid_user() -> User {
    User {
        id: 1,
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: "ada@example.com".into(),
        password: format!("$2b$10$abcdefghijklmnopqrstuv{}", "w".repeat(31)),
        salt: "$2b$10$abcdefghijklmnopqrstuv".into(),
        roles: vec![ROLE_USER.into()],
    }
}

pub fn token_config() -> TokenConfig {
    TokenConfig {
        secret: TEST_SECRET.into(),
        access_ttl: Duration::from_secs(3600),
        refresh_ttl: Duration::from_secs(7 * 24 * 3600),
    }
}

pub fn token_service() -> Arc<TokenService> {
    Arc::new(TokenService::new(&token_config()))
}

pub fn auth_service() -> (AuthService<InMemoryUserRepository>, Arc<InMemoryUserRepository>) {
    let repo = Arc::new(InMemoryUserRepository::new());
    let svc = AuthService::new(repo.clone(), Arc::new(fast_hasher()), token_service());
    (svc, repo)
}

/// Relational repository over a fresh in-memory SQLite database.
pub async fn sqlite_repo() -> Result<SeaOrmUserRepository, anyhow::Error> {
    let db = models::db::connect_in_memory().await?;
    Ok(SeaOrmUserRepository::new(db))
}
