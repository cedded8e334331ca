//! `prediction-accounts`: the User and Group record types.
//!
//! Records, their write inputs, and field-level validation. Uniqueness and
//! reference checks need the full record set and live in the store.

pub mod fields;
pub mod group;
pub mod user;

pub use group::{Group, GroupInput, GroupPatch, NewGroup};
pub use user::{NewUser, User, UserInput, UserPatch};
