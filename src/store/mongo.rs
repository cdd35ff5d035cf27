//! MongoDB-backed payment store.
//!
//! The payment identifier is the collection's `_id`, so lookups, updates and deletes are
//! single-document operations. Updates use `findOneAndUpdate` with `$inc`/`$set`, which the
//! server applies atomically.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use std::time::Duration;

use crate::config::StoreConfig;
use crate::store::{AttributesDocument, PaymentDocument, PaymentStore, StoreError};
use crate::types::{Payment, PaymentAttributes};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Clone)]
pub struct MongoPaymentStore {
    collection: Collection<Document>,
}

impl MongoPaymentStore {
    /// Creates a client for `config.url` and binds to the configured database and collection.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(config.url()).await?;
        options.connect_timeout = Some(CONNECT_TIMEOUT);
        options.server_selection_timeout = Some(CONNECT_TIMEOUT);
        let client = Client::with_options(options)?;
        let collection = client
            .database(config.database())
            .collection::<Document>(config.collection());
        tracing::info!(
            database = config.database(),
            collection = config.collection(),
            "Using MongoDB payment store"
        );
        Ok(Self { collection })
    }
}

fn encode(payment: &Payment) -> Result<Document, StoreError> {
    bson::to_document(&PaymentDocument::from(payment)).map_err(|e| StoreError::Encode {
        id: payment.id.clone(),
        reason: e.to_string(),
    })
}

fn decode(document: Document) -> Result<Payment, StoreError> {
    let key = document.get_str("_id").unwrap_or("<unknown>").to_string();
    let document: PaymentDocument =
        bson::from_document(document).map_err(|e| StoreError::CorruptRecord {
            id: key,
            reason: e.to_string(),
        })?;
    Payment::try_from(document)
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

#[async_trait]
impl PaymentStore for MongoPaymentStore {
    async fn create(&self, payment: Payment) -> Result<Payment, StoreError> {
        let document = encode(&payment)?;
        match self.collection.insert_one(document).await {
            Ok(_) => Ok(payment),
            Err(e) if is_duplicate_key(&e) => {
                tracing::error!(payment_id = %payment.id, "Error creating payment: duplicate key");
                Err(StoreError::DuplicateKey(payment.id))
            }
            Err(e) => {
                tracing::error!(payment_id = %payment.id, error = %e, "Error creating payment");
                Err(e.into())
            }
        }
    }

    async fn update(
        &self,
        id: &str,
        attributes: PaymentAttributes,
    ) -> Result<Option<Payment>, StoreError> {
        let attributes_bson =
            bson::to_bson(&AttributesDocument::from(&attributes)).map_err(|e| {
                StoreError::Encode {
                    id: id.to_string(),
                    reason: e.to_string(),
                }
            })?;
        let update = doc! {
            "$inc": { "Version": 1_i64 },
            "$set": { "Attributes": attributes_bson },
        };
        // The driver hands back the document as it was before the update.
        let previous = self
            .collection
            .find_one_and_update(doc! { "_id": id }, update)
            .await
            .inspect_err(|e| {
                tracing::error!(payment_id = %id, error = %e, "Error updating payment")
            })?;
        let Some(previous) = previous else {
            tracing::debug!(payment_id = %id, "Payment to update not found");
            return Ok(None);
        };
        let mut payment = decode(previous)?;
        payment.version += 1;
        payment.attributes = Some(attributes);
        Ok(Some(payment))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id })
            .await
            .inspect_err(|e| {
                tracing::error!(payment_id = %id, error = %e, "Error deleting payment")
            })?;
        Ok(result.deleted_count == 1)
    }

    async fn get(&self, id: &str) -> Result<Option<Payment>, StoreError> {
        let document = self
            .collection
            .find_one(doc! { "_id": id })
            .await
            .inspect_err(|e| {
                tracing::error!(payment_id = %id, error = %e, "Error fetching payment")
            })?;
        match document {
            Some(document) => decode(document).map(Some),
            None => {
                tracing::debug!(payment_id = %id, "Payment not found");
                Ok(None)
            }
        }
    }

    async fn get_all(&self) -> Result<Vec<Payment>, StoreError> {
        let log = |e: &mongodb::error::Error| {
            tracing::error!(error = %e, "Error fetching payments");
        };
        let cursor = self.collection.find(doc! {}).await.inspect_err(log)?;
        let documents: Vec<Document> = cursor.try_collect().await.inspect_err(log)?;
        documents.into_iter().map(decode).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PaymentParty, PaymentType};
    use mongodb::bson::Bson;

    fn party(suffix: &str) -> PaymentParty {
        PaymentParty {
            bank_id: format!("id{suffix}"),
            bank_id_code: format!("code{suffix}"),
            name: format!("name{suffix}"),
        }
    }

    fn payment() -> Payment {
        Payment {
            payment_type: PaymentType,
            id: "p-1".to_string(),
            version: 3,
            organisation_id: "org".to_string(),
            attributes: Some(PaymentAttributes {
                amount: 12.5,
                beneficiary_party: party(""),
                debtor_party: party("2"),
                end_to_end_reference: "test1".to_string(),
            }),
        }
    }

    #[test]
    fn bson_document_uses_stored_field_types() {
        let document = encode(&payment()).unwrap();
        assert_eq!(document.get("_id"), Some(&Bson::String("p-1".to_string())));
        assert_eq!(document.get("Id"), Some(&Bson::String("p-1".to_string())));
        assert_eq!(document.get("Type"), Some(&Bson::String("Payment".to_string())));
        assert_eq!(document.get("Version"), Some(&Bson::Int64(3)));
        let attributes = document.get_document("Attributes").unwrap();
        assert_eq!(attributes.get("Amount"), Some(&Bson::Double(12.5)));
        let debtor = attributes.get_document("DebtorParty").unwrap();
        assert_eq!(debtor.get_str("Name").unwrap(), "name2");
    }

    #[test]
    fn bson_round_trip_is_lossless() {
        let original = payment();
        assert_eq!(decode(encode(&original).unwrap()).unwrap(), original);

        let mut bare = payment();
        bare.attributes = None;
        assert_eq!(decode(encode(&bare).unwrap()).unwrap(), bare);
    }

    #[test]
    fn integer_amount_decodes_as_number() {
        let mut document = encode(&payment()).unwrap();
        document
            .get_document_mut("Attributes")
            .unwrap()
            .insert("Amount", Bson::Int32(3));
        let decoded = decode(document).unwrap();
        assert_eq!(decoded.attributes.unwrap().amount, 3.0);
    }

    #[test]
    fn malformed_document_is_corrupt_record() {
        let mut document = encode(&payment()).unwrap();
        document.insert("Version", "three");
        let error = decode(document).unwrap_err();
        assert!(matches!(error, StoreError::CorruptRecord { id, .. } if id == "p-1"));
    }
}
