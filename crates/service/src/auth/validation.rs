//! Field rules for [`User`].
//!
//! Rules run in a fixed order and the first failure wins; nothing is
//! aggregated. Success is `Ok(())`, failure is always a [`ValidationError`].

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::domain::User;

pub const MAX_EMAIL_LEN: usize = 254;
pub const PASSWORD_HASH_LEN: usize = 60;

pub const MSG_ID_NON_NEGATIVE: &str = "User id must be a non negative number";
pub const MSG_FIRST_NAME: &str =
    "First name must be between 2 and 50 characters and contain valid characters.";
pub const MSG_LAST_NAME: &str =
    "Last name must be between 2 and 50 characters and contain valid characters.";
pub const MSG_EMAIL_INVALID: &str = "Email must be a valid email address.";
pub const MSG_EMAIL_TOO_LONG: &str = "Email cannot exceed 254 characters.";
pub const MSG_PASSWORD_HASH: &str = "Invalid hash password";
pub const MSG_SALT: &str = "Invalid salt";

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z' -]{2,50}$").expect("name pattern"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]{1,64}@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern")
});
// `$2a$`/`$2b$`/`$2y$`, two digit cost, `$`, 22 chars of bcrypt base64.
static SALT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$2[aby]\$[0-9]{2}\$[./A-Za-z0-9]{22}$").expect("salt pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Id,
    FirstName,
    LastName,
    Email,
    Password,
    Salt,
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserField::Id => "id",
            UserField::FirstName => "firstName",
            UserField::LastName => "lastName",
            UserField::Email => "email",
            UserField::Password => "password",
            UserField::Salt => "salt",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: UserField,
    pub message: &'static str,
}

impl ValidationError {
    fn new(field: UserField, message: &'static str) -> Self {
        Self { field, message }
    }
}

fn check_id(id: i64) -> Result<(), ValidationError> {
    if id < 0 {
        return Err(ValidationError::new(UserField::Id, MSG_ID_NON_NEGATIVE));
    }
    Ok(())
}

fn check_name(value: &str, field: UserField, message: &'static str) -> Result<(), ValidationError> {
    if value.is_empty() || !NAME_RE.is_match(value) {
        return Err(ValidationError::new(field, message));
    }
    Ok(())
}

pub fn check_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || !EMAIL_RE.is_match(email) {
        return Err(ValidationError::new(UserField::Email, MSG_EMAIL_INVALID));
    }
    // The pattern bounds the local part only.
    if email.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::new(UserField::Email, MSG_EMAIL_TOO_LONG));
    }
    Ok(())
}

fn check_password_hash(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() != PASSWORD_HASH_LEN {
        return Err(ValidationError::new(UserField::Password, MSG_PASSWORD_HASH));
    }
    Ok(())
}

fn check_salt(salt: &str) -> Result<(), ValidationError> {
    if salt.is_empty() || !SALT_RE.is_match(salt) {
        return Err(ValidationError::new(UserField::Salt, MSG_SALT));
    }
    Ok(())
}

impl User {
    /// Validate every field: id, first name, last name, email, password hash, salt.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id(self.id)?;
        check_name(&self.first_name, UserField::FirstName, MSG_FIRST_NAME)?;
        check_name(&self.last_name, UserField::LastName, MSG_LAST_NAME)?;
        self.validate_credentials()
    }

    /// The same rules minus the names, for records created by self-registration.
    pub fn validate_credentials(&self) -> Result<(), ValidationError> {
        check_id(self.id)?;
        check_email(&self.email)?;
        check_password_hash(&self.password)?;
        check_salt(&self.salt)
    }
}
