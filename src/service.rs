//! Business-level orchestration of payments, independent of the storage technology.
//!
//! [`PaymentService`] owns the identifier policy and the per-request deadline; everything else is
//! delegated to a [`PaymentStore`] unchanged. It performs no content validation: callers validate
//! before invoking a mutating operation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;
use uuid::Uuid;

use crate::store::{PaymentStore, StoreError};
use crate::types::{Payment, PaymentAttributes};

/// Failure to produce a fresh payment identifier.
#[derive(Debug, thiserror::Error)]
#[error("Can not generate payment identifier: {0}")]
pub struct IdGenerationError(pub String);

/// Source of payment identifiers.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Result<String, IdGenerationError>;
}

/// Random (version 4) UUIDs: unique, not sequential, not guessable.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> Result<String, IdGenerationError> {
        Ok(Uuid::new_v4().to_string())
    }
}

/// Represents all the ways a service call can fail. Absent payments are not failures.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    IdGeneration(#[from] IdGenerationError),
    /// The store did not answer within the request deadline.
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn PaymentStore>,
    ids: Arc<dyn IdGenerator>,
    timeout: Duration,
}

impl PaymentService {
    pub fn new(store: Arc<dyn PaymentStore>, timeout: Duration) -> Self {
        Self::with_id_generator(store, Arc::new(UuidGenerator), timeout)
    }

    pub fn with_id_generator(
        store: Arc<dyn PaymentStore>,
        ids: Arc<dyn IdGenerator>,
        timeout: Duration,
    ) -> Self {
        PaymentService {
            store,
            ids,
            timeout,
        }
    }

    /// Runs a store operation under the deadline. On expiry the operation is dropped.
    async fn deadline<T>(
        &self,
        operation: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, ServiceError> {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                tracing::error!(timeout = ?self.timeout, "Store operation timed out");
                Err(ServiceError::Timeout(self.timeout))
            }
        }
    }

    /// Assigns a new identifier, replacing any caller-supplied one, and stores the payment.
    #[instrument(skip_all, err)]
    pub async fn create_payment(&self, mut payment: Payment) -> Result<Payment, ServiceError> {
        payment.id = self.ids.generate()?;
        tracing::debug!(payment_id = %payment.id, "Creating payment");
        self.deadline(self.store.create(payment)).await
    }

    #[instrument(skip(self, attributes), err)]
    pub async fn update_payment(
        &self,
        id: &str,
        attributes: PaymentAttributes,
    ) -> Result<Option<Payment>, ServiceError> {
        self.deadline(self.store.update(id, attributes)).await
    }

    #[instrument(skip(self), err)]
    pub async fn delete_payment(&self, id: &str) -> Result<bool, ServiceError> {
        self.deadline(self.store.delete(id)).await
    }

    #[instrument(skip(self), err)]
    pub async fn get_payment(&self, id: &str) -> Result<Option<Payment>, ServiceError> {
        self.deadline(self.store.get(id)).await
    }

    #[instrument(skip_all, err)]
    pub async fn get_payments(&self) -> Result<Vec<Payment>, ServiceError> {
        self.deadline(self.store.get_all()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryPaymentStore;
    use crate::types::{PaymentParty, PaymentType};
    use async_trait::async_trait;
    use std::collections::HashSet;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn party() -> PaymentParty {
        PaymentParty {
            bank_id: "id".to_string(),
            bank_id_code: "code".to_string(),
            name: "name".to_string(),
        }
    }

    fn attributes(amount: f64) -> PaymentAttributes {
        PaymentAttributes {
            amount,
            beneficiary_party: party(),
            debtor_party: party(),
            end_to_end_reference: "ref".to_string(),
        }
    }

    fn payment(id: &str) -> Payment {
        Payment {
            payment_type: PaymentType,
            id: id.to_string(),
            version: 0,
            organisation_id: "org".to_string(),
            attributes: Some(attributes(3.0)),
        }
    }

    fn service() -> PaymentService {
        PaymentService::new(Arc::new(InMemoryPaymentStore::new()), TIMEOUT)
    }

    struct FailingGenerator;

    impl IdGenerator for FailingGenerator {
        fn generate(&self) -> Result<String, IdGenerationError> {
            Err(IdGenerationError("entropy source unavailable".to_string()))
        }
    }

    /// Store whose every operation hangs forever.
    struct StalledStore;

    #[async_trait]
    impl PaymentStore for StalledStore {
        async fn create(&self, _payment: Payment) -> Result<Payment, StoreError> {
            std::future::pending().await
        }

        async fn update(
            &self,
            _id: &str,
            _attributes: PaymentAttributes,
        ) -> Result<Option<Payment>, StoreError> {
            std::future::pending().await
        }

        async fn delete(&self, _id: &str) -> Result<bool, StoreError> {
            std::future::pending().await
        }

        async fn get(&self, _id: &str) -> Result<Option<Payment>, StoreError> {
            std::future::pending().await
        }

        async fn get_all(&self) -> Result<Vec<Payment>, StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn create_overwrites_caller_id() {
        let service = service();
        let created = service.create_payment(payment("caller-chosen")).await.unwrap();
        assert_ne!(created.id, "caller-chosen");
        assert!(!created.id.is_empty());
        assert!(Uuid::parse_str(&created.id).is_ok());
        let fetched = service.get_payment(&created.id).await.unwrap();
        assert_eq!(fetched, Some(created));
        assert_eq!(service.get_payment("caller-chosen").await.unwrap(), None);
    }

    #[tokio::test]
    async fn created_ids_are_distinct() {
        let service = service();
        let mut ids = HashSet::new();
        for _ in 0..50 {
            let created = service.create_payment(payment("")).await.unwrap();
            assert!(ids.insert(created.id));
        }
        assert_eq!(service.get_payments().await.unwrap().len(), 50);
    }

    #[tokio::test]
    async fn id_generation_failure_is_reported() {
        let store = Arc::new(InMemoryPaymentStore::new());
        let service =
            PaymentService::with_id_generator(store.clone(), Arc::new(FailingGenerator), TIMEOUT);
        let error = service.create_payment(payment("")).await.unwrap_err();
        assert!(matches!(error, ServiceError::IdGeneration(_)));
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_and_delete_pass_through() {
        let service = service();
        let created = service.create_payment(payment("")).await.unwrap();
        let updated = service
            .update_payment(&created.id, attributes(5.0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.version, created.version + 1);
        assert_eq!(updated.attributes, Some(attributes(5.0)));
        assert!(service.delete_payment(&created.id).await.unwrap());
        assert!(!service.delete_payment(&created.id).await.unwrap());
        let missing = service.update_payment(&created.id, attributes(6.0)).await;
        assert_eq!(missing.unwrap(), None);
    }

    #[tokio::test]
    async fn stalled_store_times_out() {
        let timeout = Duration::from_millis(50);
        let service = PaymentService::new(Arc::new(StalledStore), timeout);
        let error = service.get_payment("any").await.unwrap_err();
        assert!(matches!(error, ServiceError::Timeout(d) if d == timeout));
        let error = service.create_payment(payment("")).await.unwrap_err();
        assert!(matches!(error, ServiceError::Timeout(_)));
    }
}
