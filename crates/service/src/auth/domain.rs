use serde::{Deserialize, Serialize};

use super::hasher::{salt_of, HashError, PasswordHasher};

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Identity record.
///
/// `id == 0` means "not persisted yet"; the repository assigns the real id.
/// Construction does not validate: call [`User::validate`] (or build through
/// [`User::try_new`]) once the password has been hashed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// bcrypt hash, never the plaintext once `save_password` has run.
    pub password: String,
    pub salt: String,
    pub roles: Vec<String>,
}

/// Fully specified user, consumed by [`User::try_new`].
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<String>,
}

impl User {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unsaved user carrying only an email and roles.
    pub fn with_email(email: impl Into<String>, roles: Vec<String>) -> Self {
        Self { email: email.into(), roles, ..Self::default() }
    }

    /// Checked constructor: the returned user has passed [`User::validate`].
    pub fn try_new(input: NewUser) -> Result<Self, super::validation::ValidationError> {
        let salt = salt_of(&input.password_hash).unwrap_or_default().to_string();
        let user = Self {
            id: 0,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            password: input.password_hash,
            salt,
            roles: input.roles,
        };
        user.validate()?;
        Ok(user)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Replace the password with its hash and record the salt embedded in it.
    pub fn save_password(&mut self, plaintext: &str, hasher: &dyn PasswordHasher) -> Result<(), HashError> {
        let hash = hasher.hash(plaintext)?;
        self.set_password_hash(hash);
        Ok(())
    }

    pub fn set_password_hash(&mut self, hash: String) {
        self.salt = salt_of(&hash).unwrap_or_default().to_string();
        self.password = hash;
    }

    pub fn check_password(&self, plaintext: &str, hasher: &dyn PasswordHasher) -> Result<bool, HashError> {
        hasher.compare(plaintext, &self.password)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn to_claims(&self) -> UserClaims {
        UserClaims {
            user_id: self.id,
            email: self.email.clone(),
            roles: self.roles.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

/// The part of a user embedded in tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaims {
    pub user_id: i64,
    pub email: String,
    pub roles: Vec<String>,
    pub first_name: String,
    pub last_name: String,
}

impl UserClaims {
    /// True when `allowed` is empty or the claims hold at least one of its roles.
    pub fn has_any_role<S: AsRef<str>>(&self, allowed: &[S]) -> bool {
        allowed.is_empty()
            || allowed
                .iter()
                .any(|a| self.roles.iter().any(|r| r == a.as_ref()))
    }
}

/// Access + refresh pair returned by login and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Admin-side user creation input. Absent fields arrive empty and fail validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewUserInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Admin-side user update input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateUserInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

/// Public view of a user; never carries the hash or salt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            email: u.email.clone(),
            roles: u.roles.clone(),
        }
    }
}
