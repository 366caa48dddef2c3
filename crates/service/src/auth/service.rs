use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::domain::{AuthTokens, NewUser, NewUserInput, UpdateUserInput, User, UserClaims, ROLE_ADMIN, ROLE_USER};
use super::errors::AuthError;
use super::hasher::PasswordHasher;
use super::repository::UserRepository;
use super::token::TokenService;

/// Auth business service independent of web framework
pub struct AuthService<R: UserRepository + ?Sized> {
    repo: Arc<R>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<TokenService>,
}

impl<R: UserRepository + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, hasher: Arc<dyn PasswordHasher>, tokens: Arc<TokenService>) -> Self {
        Self { repo, hasher, tokens }
    }

    /// Register a new user and return an access token for it.
    ///
    /// # Examples
    /// ```
    /// use std::{sync::Arc, time::Duration};
    /// use service::auth::{AuthService, BcryptHasher, InMemoryUserRepository, TokenConfig, TokenService};
    /// let tokens = Arc::new(TokenService::new(&TokenConfig {
    ///     secret: "secret".into(),
    ///     access_ttl: Duration::from_secs(3600),
    ///     refresh_ttl: Duration::from_secs(86400),
    /// }));
    /// let svc = AuthService::new(Arc::new(InMemoryUserRepository::new()), Arc::new(BcryptHasher::new(4)), tokens.clone());
    /// let token = tokio_test::block_on(svc.register("reader@example.com", "Passw0rd")).unwrap();
    /// let claims = tokens.validate_access_token(&token).unwrap();
    /// assert_eq!(claims.email, "reader@example.com");
    /// assert_eq!(claims.roles, vec!["user"]);
    /// ```
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<String, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if self.repo.get_user_by_email(email).await?.is_some() {
            debug!("email already registered");
            return Err(AuthError::EmailAlreadyRegistered);
        }

        let mut user = User::with_email(email, vec![ROLE_USER.to_string()]);
        let hash = self.hash_password(password).await?;
        user.set_password_hash(hash);
        user.validate_credentials()?;

        self.repo.add_user(&mut user).await?;
        info!(user_id = user.id, "user_registered");
        Ok(self.tokens.generate_access_token(&user.to_claims())?)
    }

    /// Authenticate and issue an access + refresh pair.
    ///
    /// # Examples
    /// ```
    /// use std::{sync::Arc, time::Duration};
    /// use service::auth::{AuthService, BcryptHasher, InMemoryUserRepository, TokenConfig, TokenService};
    /// let tokens = Arc::new(TokenService::new(&TokenConfig {
    ///     secret: "secret".into(),
    ///     access_ttl: Duration::from_secs(3600),
    ///     refresh_ttl: Duration::from_secs(86400),
    /// }));
    /// let svc = AuthService::new(Arc::new(InMemoryUserRepository::new()), Arc::new(BcryptHasher::new(4)), tokens.clone());
    /// tokio_test::block_on(svc.register("u@example.com", "Passw0rd")).unwrap();
    /// let pair = tokio_test::block_on(svc.login("u@example.com", "Passw0rd")).unwrap();
    /// assert!(tokens.validate_refresh_token(&pair.refresh_token).is_ok());
    /// ```
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthTokens, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let Some(user) = self.repo.get_user_by_email(email).await? else {
            warn!("login_rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };
        if !self.verify_password(password, user.password.clone()).await? {
            warn!(user_id = user.id, "login_rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.issue_pair(&user.to_claims())?;
        info!(user_id = user.id, "user_logged_in");
        Ok(pair)
    }

    /// Exchange a refresh token for a fresh pair carrying the same claims.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let claims = self.tokens.validate_refresh_token(refresh_token)?;
        let pair = self.issue_pair(&claims)?;
        info!(user_id = claims.user_id, "tokens_refreshed");
        Ok(pair)
    }

    pub async fn get_all_users(&self) -> Result<Vec<User>, AuthError> {
        self.repo.get_all_users().await
    }

    /// Admin-side creation; every field is required and fully validated.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: NewUserInput) -> Result<User, AuthError> {
        if input.email.is_empty() || input.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if self.repo.get_user_by_email(&input.email).await?.is_some() {
            return Err(AuthError::EmailAlreadyRegistered);
        }
        let password_hash = self.hash_password(&input.password).await?;
        let mut user = User::try_new(NewUser {
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            password_hash,
            roles: vec![ROLE_USER.to_string()],
        })?;
        self.repo.add_user(&mut user).await?;
        info!(user_id = user.id, "user_created");
        Ok(user)
    }

    #[instrument(skip(self, input), fields(email = %input.email, is_admin = input.is_admin))]
    pub async fn update_user(&self, id: i64, input: UpdateUserInput) -> Result<User, AuthError> {
        let mut user = self.repo.get_user_by_id(id).await?.ok_or(AuthError::NotFound)?;
        user.first_name = input.first_name;
        user.last_name = input.last_name;
        user.email = input.email;
        user.roles = vec![if input.is_admin { ROLE_ADMIN } else { ROLE_USER }.to_string()];
        user.validate()?;
        self.repo.update_user(&user).await?;
        info!(user_id = user.id, "user_updated");
        Ok(user)
    }

    /// Update the caller's own names; `email` comes from verified claims.
    #[instrument(skip(self, first_name, last_name))]
    pub async fn update_profile(&self, email: &str, first_name: &str, last_name: &str) -> Result<User, AuthError> {
        let mut user = self.repo.get_user_by_email(email).await?.ok_or(AuthError::NotFound)?;
        user.first_name = first_name.to_string();
        user.last_name = last_name.to_string();
        user.validate()?;
        self.repo.update_user(&user).await?;
        info!(user_id = user.id, "profile_updated");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> Result<(), AuthError> {
        if !self.repo.delete_user(id).await? {
            return Err(AuthError::NotFound);
        }
        info!(user_id = id, "user_deleted");
        Ok(())
    }

    fn issue_pair(&self, claims: &UserClaims) -> Result<AuthTokens, AuthError> {
        Ok(AuthTokens {
            access_token: self.tokens.generate_access_token(claims)?,
            refresh_token: self.tokens.generate_refresh_token(claims)?,
        })
    }

    // bcrypt is CPU-bound; keep it off the async workers.
    async fn hash_password(&self, plaintext: &str) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let plaintext = plaintext.to_owned();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))??;
        Ok(hash)
    }

    async fn verify_password(&self, plaintext: &str, hash: String) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let plaintext = plaintext.to_owned();
        let matches = tokio::task::spawn_blocking(move || hasher.compare(&plaintext, &hash))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))??;
        Ok(matches)
    }
}
