use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use shopfront_addresses::{Address, AddressText};
use shopfront_core::UserId;

use super::{ServiceError, ServiceResult, ServiceSettings, timed};
use crate::store::AddressStore;

/// One shipping address per user; saving again overwrites it.
#[derive(Clone)]
pub struct AddressBook {
    store: Arc<dyn AddressStore>,
    op_timeout: Duration,
}

impl std::fmt::Debug for AddressBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressBook")
            .field("op_timeout", &self.op_timeout)
            .finish_non_exhaustive()
    }
}

impl AddressBook {
    pub fn new(store: Arc<dyn AddressStore>, settings: ServiceSettings) -> Self {
        Self {
            store,
            op_timeout: settings.op_timeout,
        }
    }

    #[instrument(skip(self, address), fields(user_id = %user_id), err)]
    pub async fn upsert_address(&self, user_id: &UserId, address: &str) -> ServiceResult<Address> {
        let address = AddressText::new(address)?;
        let saved = timed(self.op_timeout, self.store.upsert(user_id, address)).await?;
        info!("address saved");
        Ok(saved)
    }

    pub async fn get_address(&self, user_id: &UserId) -> ServiceResult<Address> {
        timed(self.op_timeout, self.store.get(user_id))
            .await?
            .ok_or_else(|| ServiceError::not_found("address"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ErrorKind;
    use crate::store::InMemoryStore;

    fn book() -> AddressBook {
        AddressBook::new(Arc::new(InMemoryStore::new()), ServiceSettings::default())
    }

    #[tokio::test]
    async fn second_save_overwrites_the_first() {
        let book = book();
        let user = UserId::parse("u1").unwrap();

        book.upsert_address(&user, "12 Main St").await.unwrap();
        let saved = book.upsert_address(&user, "  34 Side Rd ").await.unwrap();
        assert_eq!(saved.address.as_str(), "34 Side Rd");
        assert_eq!(book.get_address(&user).await.unwrap().address.as_str(), "34 Side Rd");
    }

    #[tokio::test]
    async fn blank_address_is_a_validation_error() {
        let book = book();
        let user = UserId::parse("u1").unwrap();

        let err = book.upsert_address(&user, "   ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(book.get_address(&user).await.unwrap_err().kind(), ErrorKind::NotFound);
    }
}
