//! Infrastructure layer: record storage backends.

pub mod store;

pub use store::{AccountStore, InMemoryAccountStore};
#[cfg(feature = "postgres")]
pub use store::PostgresAccountStore;
