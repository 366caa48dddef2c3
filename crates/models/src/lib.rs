//! Persistence models for the identity store.
//!
//! Entities here are storage rows only; the domain `User` and its validation
//! rules live in the `service` crate.

pub mod errors;
pub mod db;
pub mod user;
