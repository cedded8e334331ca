use std::sync::Arc;

use prediction_infra::{AccountStore, InMemoryAccountStore};

use crate::config::StoreConfig;

/// Shared handler dependencies.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn AccountStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryAccountStore::new()))
    }

    pub fn store(&self) -> &dyn AccountStore {
        self.store.as_ref()
    }
}

pub async fn build_services(store: &StoreConfig) -> anyhow::Result<AppServices> {
    match store {
        StoreConfig::InMemory => {
            tracing::info!("using in-memory account store");
            Ok(AppServices::in_memory())
        }
        StoreConfig::Postgres { database_url } => build_persistent_services(database_url).await,
    }
}

#[cfg(feature = "postgres")]
async fn build_persistent_services(database_url: &str) -> anyhow::Result<AppServices> {
    let store = prediction_infra::PostgresAccountStore::connect(database_url).await?;
    store.migrate().await?;
    tracing::info!("using postgres account store");
    Ok(AppServices::new(Arc::new(store)))
}

#[cfg(not(feature = "postgres"))]
async fn build_persistent_services(_database_url: &str) -> anyhow::Result<AppServices> {
    tracing::warn!("USE_PERSISTENT_STORES=true but postgres feature not enabled, falling back to in-memory");
    Ok(AppServices::in_memory())
}
