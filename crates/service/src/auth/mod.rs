//! Auth module: domain, validation, hashing, tokens, repository and service.
//!
//! The service is the only place that combines the other parts; each of them
//! can be used and tested on its own.

pub mod domain;
pub mod errors;
pub mod hasher;
pub mod repo;
pub mod repository;
pub mod service;
pub mod token;
pub mod validation;

pub use domain::{AuthTokens, NewUser, User, UserClaims};
pub use errors::AuthError;
pub use hasher::{BcryptHasher, HashError, PasswordHasher};
pub use repository::{memory::InMemoryUserRepository, UserRepository};
pub use service::AuthService;
pub use token::{TokenConfig, TokenError, TokenService};
pub use validation::{UserField, ValidationError};
