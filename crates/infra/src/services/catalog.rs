//! Product catalog service.
//!
//! Product ids are never reserved ahead of time: a candidate is drawn outside
//! the currently persisted ids and the store's uniqueness constraint decides.
//! A conflict means another writer won the race, so a new candidate is drawn,
//! up to [`IdentityGenerator::max_attempts`] times.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use shopfront_catalog::{
    IdentityGenerator, ListingScope, NewProduct, Product, ProductDraft, RecordId, StockLevels,
    Visibility,
};
use shopfront_core::ProductId;

use super::{ServiceError, ServiceResult, ServiceSettings, timed};
use crate::store::{ProductStore, StoreError};

#[derive(Clone)]
pub struct ProductCatalog {
    store: Arc<dyn ProductStore>,
    ids: IdentityGenerator,
    op_timeout: Duration,
}

impl std::fmt::Debug for ProductCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductCatalog")
            .field("ids", &self.ids)
            .field("op_timeout", &self.op_timeout)
            .finish_non_exhaustive()
    }
}

impl ProductCatalog {
    pub fn new(store: Arc<dyn ProductStore>, settings: ServiceSettings) -> Self {
        Self::with_generator(store, IdentityGenerator::new(settings.id_max_attempts), settings)
    }

    pub fn with_generator(
        store: Arc<dyn ProductStore>,
        ids: IdentityGenerator,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            store,
            ids,
            op_timeout: settings.op_timeout,
        }
    }

    /// Propose a product id not assigned to any persisted product.
    ///
    /// The id is not reserved; [`ProductCatalog::create_product`] is the only
    /// way to claim one.
    pub async fn generate_id(&self) -> ServiceResult<ProductId> {
        let taken = timed(self.op_timeout, self.store.product_ids()).await?;
        self.ids
            .candidate(&taken)
            .ok_or(ServiceError::GenerationExhausted { attempts: 1 })
    }

    #[instrument(skip(self, draft), fields(name = %draft.name, category = %draft.category), err)]
    pub async fn create_product(&self, draft: ProductDraft) -> ServiceResult<Product> {
        let product = NewProduct::validate(draft)?;
        let attempts = self.ids.max_attempts();
        let mut collided = HashSet::new();

        for attempt in 1..=attempts {
            let mut taken = timed(self.op_timeout, self.store.product_ids()).await?;
            taken.extend(collided.iter().cloned());

            let Some(candidate) = self.ids.candidate(&taken) else {
                warn!(attempt, "no free product id candidate");
                break;
            };

            match timed(self.op_timeout, self.store.insert(&candidate, product.clone())).await {
                Ok(created) => {
                    info!(product_id = %candidate, attempt, "product created");
                    return Ok(created);
                }
                Err(StoreError::Conflict(_)) => {
                    warn!(product_id = %candidate, attempt, "product id already taken; retrying");
                    collided.insert(candidate);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::GenerationExhausted { attempts })
    }

    pub async fn list_products(&self, scope: ListingScope) -> ServiceResult<Vec<Product>> {
        let products = timed(self.op_timeout, self.store.list()).await?;
        Ok(products.into_iter().filter(|p| scope.includes(p)).collect())
    }

    /// Visibility is ignored here: hidden products stay reachable by id.
    pub async fn get_product(&self, product_id: &ProductId) -> ServiceResult<Product> {
        timed(self.op_timeout, self.store.get(product_id))
            .await?
            .ok_or_else(|| ServiceError::not_found("product"))
    }

    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn set_visibility(
        &self,
        product_id: &ProductId,
        visibility: Visibility,
    ) -> ServiceResult<Product> {
        let updated = timed(self.op_timeout, self.store.set_visibility(product_id, visibility))
            .await?
            .ok_or_else(|| ServiceError::not_found("product"))?;
        info!(visibility = visibility.as_str(), "visibility updated");
        Ok(updated)
    }

    /// Overwrite both counters. Never creates a product.
    #[instrument(skip(self), fields(product_id = %product_id), err)]
    pub async fn update_stock(&self, product_id: &ProductId, stock: StockLevels) -> ServiceResult<Product> {
        let updated = timed(self.op_timeout, self.store.update_stock(product_id, stock))
            .await?
            .ok_or_else(|| ServiceError::not_found("product"))?;
        info!(
            in_stock = stock.in_stock_value,
            sold = stock.sold_stock_value,
            "stock updated"
        );
        Ok(updated)
    }

    /// Give every product lacking an id a fresh one. Returns the records that
    /// were assigned by this call; a rerun with nothing pending returns none.
    #[instrument(skip(self), err)]
    pub async fn backfill_identifiers(&self) -> ServiceResult<Vec<Product>> {
        let mut taken = timed(self.op_timeout, self.store.product_ids()).await?;
        let pending = timed(self.op_timeout, self.store.list_unassigned()).await?;

        let mut assigned = Vec::with_capacity(pending.len());
        for record in pending {
            if let Some(product) = self.assign_one(record.record_id, &mut taken).await? {
                assigned.push(product);
            }
        }

        info!(assigned = assigned.len(), "backfill finished");
        Ok(assigned)
    }

    async fn assign_one(
        &self,
        record: RecordId,
        taken: &mut HashSet<ProductId>,
    ) -> ServiceResult<Option<Product>> {
        let attempts = self.ids.max_attempts();

        for attempt in 1..=attempts {
            let Some(candidate) = self.ids.candidate(taken) else {
                break;
            };
            taken.insert(candidate.clone());

            match timed(self.op_timeout, self.store.assign_product_id(record, &candidate)).await {
                Ok(Some(product)) => return Ok(Some(product)),
                Ok(None) => {
                    // Assigned concurrently or gone; the candidate stays unused.
                    taken.remove(&candidate);
                    debug!(record = %record, "record no longer needs an id");
                    return Ok(None);
                }
                Err(StoreError::Conflict(_)) => {
                    warn!(record = %record, product_id = %candidate, attempt, "product id already taken; retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::GenerationExhausted { attempts })
    }
}
