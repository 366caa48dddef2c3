//! Identity core for the library catalog.
//! - Password hashing, signed claim tokens and the user entity rules.
//! - Registration, login, token refresh and user administration over an
//!   abstract user repository.
//! - Framework independent: the HTTP surface lives in the `server` crate.

pub mod auth;
#[cfg(test)]
pub mod test_support;
