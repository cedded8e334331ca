//! `prediction-core`: shared domain primitives.
//!
//! Identifiers and the domain error model. No HTTP or storage concerns.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult, FieldErrors};
pub use id::{GroupId, UserId};
