//! Record storage for users and groups.
//!
//! Handlers talk to an [`AccountStore`]; the in-memory implementation backs
//! dev/test runs and the Postgres one (feature `postgres`) backs deployments.
//!
//! ## Contract
//!
//! - `list_users` is ordered by `date_joined` descending, ties by id descending.
//! - `list_groups` is ordered by id ascending (creation order).
//! - Missing records yield `DomainError::NotFound`.
//! - Duplicate usernames / group names and references to unknown groups yield
//!   `DomainError::Validation` keyed by the offending field.
//! - Deleting a group removes it from every user's `groups`.

use chrono::{DateTime, Utc};

use prediction_accounts::{Group, NewGroup, NewUser, User, UserPatch, GroupPatch};
use prediction_core::{DomainResult, GroupId, UserId};

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryAccountStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresAccountStore;

#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    async fn list_users(&self) -> DomainResult<Vec<User>>;

    async fn get_user(&self, id: UserId) -> DomainResult<User>;

    async fn create_user(&self, new: NewUser, date_joined: DateTime<Utc>) -> DomainResult<User>;

    async fn update_user(&self, id: UserId, patch: UserPatch) -> DomainResult<User>;

    async fn delete_user(&self, id: UserId) -> DomainResult<()>;

    async fn list_groups(&self) -> DomainResult<Vec<Group>>;

    async fn get_group(&self, id: GroupId) -> DomainResult<Group>;

    async fn create_group(&self, new: NewGroup) -> DomainResult<Group>;

    async fn update_group(&self, id: GroupId, patch: GroupPatch) -> DomainResult<Group>;

    async fn delete_group(&self, id: GroupId) -> DomainResult<()>;
}

/// Newest-first ordering used by `list_users`.
pub(crate) fn sort_users_newest_first(users: &mut [User]) {
    users.sort_by(|a, b| b.date_joined.cmp(&a.date_joined).then_with(|| b.id.cmp(&a.id)));
}
