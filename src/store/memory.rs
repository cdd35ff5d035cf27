//! In-process payment store.
//!
//! Holds encoded documents in a concurrent map so that reads go through the same decode path
//! as a remote document store. A single update runs while holding the entry's shard lock:
//! concurrent updates of one payment each apply exactly once, the last writer's attributes win.

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;

use crate::store::{PaymentStore, StoreError, decode_json, encode_json};
use crate::types::{Payment, PaymentAttributes};

#[derive(Debug, Default)]
pub struct InMemoryPaymentStore {
    documents: DashMap<String, Value>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn create(&self, payment: Payment) -> Result<Payment, StoreError> {
        let document = encode_json(&payment)?;
        match self.documents.entry(payment.id.clone()) {
            Entry::Occupied(_) => {
                tracing::error!(payment_id = %payment.id, "Error creating payment: duplicate key");
                Err(StoreError::DuplicateKey(payment.id))
            }
            Entry::Vacant(slot) => {
                slot.insert(document);
                Ok(payment)
            }
        }
    }

    async fn update(
        &self,
        id: &str,
        attributes: PaymentAttributes,
    ) -> Result<Option<Payment>, StoreError> {
        let Some(mut entry) = self.documents.get_mut(id) else {
            tracing::debug!(payment_id = %id, "Payment to update not found");
            return Ok(None);
        };
        let mut payment = decode_json(entry.value().clone()).inspect_err(|e| {
            tracing::error!(payment_id = %id, error = %e, "Error updating payment");
        })?;
        payment.version += 1;
        payment.attributes = Some(attributes);
        *entry.value_mut() = encode_json(&payment)?;
        Ok(Some(payment))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.documents.remove(id).is_some())
    }

    async fn get(&self, id: &str) -> Result<Option<Payment>, StoreError> {
        let Some(document) = self.documents.get(id).map(|entry| entry.value().clone()) else {
            tracing::debug!(payment_id = %id, "Payment not found");
            return Ok(None);
        };
        decode_json(document)
            .inspect_err(|e| {
                tracing::error!(payment_id = %id, error = %e, "Error fetching payment");
            })
            .map(Some)
    }

    async fn get_all(&self) -> Result<Vec<Payment>, StoreError> {
        let documents: Vec<Value> = self
            .documents
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        documents
            .into_iter()
            .map(decode_json)
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| tracing::error!(error = %e, "Error fetching payments"))
    }
}
