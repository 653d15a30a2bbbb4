//! Data models for the fleet dashboard.
//!
//! These models match the backend JSON documents; field names stay camelCase on the wire.

mod pagination;
mod robot;
mod user;

#[cfg(test)]
pub(crate) mod fixtures;

pub use pagination::*;
pub use robot::*;
pub use user::*;
