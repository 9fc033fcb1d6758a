//! Service wiring: picks the store backend and builds the application services.

use std::sync::Arc;

use shopfront_infra::{
    config::AppConfig,
    services::{AddressBook, ProductCatalog, ServiceSettings, ShoppingCarts},
    store::{InMemoryStore, PostgresStore, StoreResult},
};

/// Everything the handlers need; shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AppServices {
    pub catalog: ProductCatalog,
    pub carts: ShoppingCarts,
    pub addresses: AddressBook,
}

impl AppServices {
    /// All services over one process-local store (dev and tests).
    pub fn in_memory(settings: ServiceSettings) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::over(store, settings)
    }

    pub fn postgres(store: PostgresStore, settings: ServiceSettings) -> Self {
        Self::over(Arc::new(store), settings)
    }

    fn over<S>(store: Arc<S>, settings: ServiceSettings) -> Self
    where
        S: shopfront_infra::store::ProductStore
            + shopfront_infra::store::CartStore
            + shopfront_infra::store::AddressStore
            + 'static,
    {
        Self {
            catalog: ProductCatalog::new(store.clone(), settings),
            carts: ShoppingCarts::new(store.clone(), store.clone(), settings),
            addresses: AddressBook::new(store, settings),
        }
    }
}

/// Build services from configuration.
///
/// With `DATABASE_URL` set this connects to Postgres and applies the schema;
/// otherwise everything lives in memory and is lost on restart.
pub async fn build_services(config: &AppConfig) -> StoreResult<Arc<AppServices>> {
    let settings = config.service_settings();

    let services = match &config.database_url {
        Some(url) => {
            let store =
                PostgresStore::connect(url, config.db_max_connections, config.store_timeout).await?;
            store.migrate().await?;
            tracing::info!(max_connections = config.db_max_connections, "using postgres store");
            AppServices::postgres(store, settings)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store");
            AppServices::in_memory(settings)
        }
    };

    Ok(Arc::new(services))
}
