//! Application services: the catalog, shopping carts and address book.
//!
//! Services validate input, call the store exactly once per state change and
//! translate store failures into [`ServiceError`]. They hold no mutable state
//! of their own; every write is serialized by the store.
//!
//! ## Error Mapping
//!
//! | StoreError | ServiceError |
//! |---|---|
//! | `Domain` | `Domain` |
//! | `Conflict` (outside id retry loops) | `PersistenceUnavailable` |
//! | `Unavailable` / elapsed timeout | `PersistenceUnavailable` |
//! | `Corrupt` | `PersistenceUnavailable` |

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use shopfront_core::DomainError;

use crate::store::{StoreError, StoreResult};

pub mod addresses;
pub mod carts;
pub mod catalog;

pub use addresses::AddressBook;
pub use carts::ShoppingCarts;
pub use catalog::ProductCatalog;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// No free product id was found within the configured number of attempts.
    #[error("could not assign a unique product id after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },

    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(String),
}

/// Coarse classification used by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    GenerationExhausted,
    PersistenceUnavailable,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Domain(DomainError::NotFound(_)) => ErrorKind::NotFound,
            ServiceError::Domain(_) => ErrorKind::Validation,
            ServiceError::GenerationExhausted { .. } => ErrorKind::GenerationExhausted,
            ServiceError::PersistenceUnavailable(_) => ErrorKind::PersistenceUnavailable,
        }
    }

    pub fn not_found(what: &'static str) -> Self {
        ServiceError::Domain(DomainError::not_found(what))
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(e) => ServiceError::Domain(e),
            StoreError::Conflict(msg) => ServiceError::PersistenceUnavailable(msg),
            StoreError::Unavailable(msg) => ServiceError::PersistenceUnavailable(msg),
            StoreError::Corrupt(msg) => ServiceError::PersistenceUnavailable(msg),
        }
    }
}

/// Tunables shared by all services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Upper bound for a single store call.
    pub op_timeout: Duration,
    /// Insert attempts per product id assignment.
    pub id_max_attempts: u32,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_secs(5),
            id_max_attempts: 5,
        }
    }
}

/// Run a store call under `op_timeout`.
pub(crate) async fn timed<T, F>(op_timeout: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(op_timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Unavailable(format!(
            "store call timed out after {}ms",
            op_timeout.as_millis()
        ))),
    }
}
