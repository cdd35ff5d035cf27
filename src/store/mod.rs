//! Persistence of payments keyed by their identifier.
//!
//! [`PaymentStore`] is the seam between the service and the storage technology. A store
//! distinguishes three outcomes: found, not found (`Ok(None)` / `Ok(false)`), and
//! [`StoreError`]. Absent records are never reported as errors.
//!
//! | Backend | Module | Feature |
//! |---------|--------|---------|
//! | [`InMemoryPaymentStore`] | [`memory`] | - |
//! | `MongoPaymentStore` | `mongo` | `mongodb` |
//!
//! Both backends persist the document shape defined in [`document`].

use async_trait::async_trait;
use std::sync::Arc;

use crate::types::{Payment, PaymentAttributes};

pub mod document;
pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongo;

pub use document::*;
pub use memory::*;
#[cfg(feature = "mongodb")]
pub use mongo::*;

/// Errors raised by a [`PaymentStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record with the same primary key already exists.
    #[error("Payment {0} already exists")]
    DuplicateKey(String),
    /// A persisted document does not have the expected payment shape.
    #[error("Corrupt payment record {id}: {reason}")]
    CorruptRecord { id: String, reason: String },
    /// A payment could not be converted into its document form.
    #[error("Can not encode payment {id}: {reason}")]
    Encode { id: String, reason: String },
    /// The document store driver failed.
    #[cfg(feature = "mongodb")]
    #[error(transparent)]
    Driver(#[from] mongodb::error::Error),
}

/// Create, read, update and delete operations over payment documents.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a payment whose identifier has already been assigned.
    async fn create(&self, payment: Payment) -> Result<Payment, StoreError>;

    /// Atomically increments the version by one and replaces the attributes.
    ///
    /// Returns `Ok(None)` when no payment has this identifier.
    async fn update(
        &self,
        id: &str,
        attributes: PaymentAttributes,
    ) -> Result<Option<Payment>, StoreError>;

    /// Removes the payment. `true` iff exactly one record was removed.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Payment>, StoreError>;

    /// Every payment, in store-defined order. An empty store yields an empty vector.
    async fn get_all(&self) -> Result<Vec<Payment>, StoreError>;
}

#[async_trait]
impl<T: PaymentStore + ?Sized> PaymentStore for Arc<T> {
    async fn create(&self, payment: Payment) -> Result<Payment, StoreError> {
        self.as_ref().create(payment).await
    }

    async fn update(
        &self,
        id: &str,
        attributes: PaymentAttributes,
    ) -> Result<Option<Payment>, StoreError> {
        self.as_ref().update(id, attributes).await
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.as_ref().delete(id).await
    }

    async fn get(&self, id: &str) -> Result<Option<Payment>, StoreError> {
        self.as_ref().get(id).await
    }

    async fn get_all(&self) -> Result<Vec<Payment>, StoreError> {
        self.as_ref().get_all().await
    }
}
