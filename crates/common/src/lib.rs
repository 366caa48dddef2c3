//! Pieces shared by every crate in the workspace: logging setup and small
//! wire types that are not owned by a single service.

pub mod types;
pub mod utils;
