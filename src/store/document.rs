//! Persisted representation of a payment.
//!
//! Documents use the store's own field names (`_id`, `OrganisationId`, `Attributes.Amount`, ...)
//! and are decoded through typed structs, so a record missing a field or holding a value of the
//! wrong type surfaces as [`StoreError::CorruptRecord`] instead of a fault.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::StoreError;
use crate::types::{Payment, PaymentAttributes, PaymentParty, PaymentType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PartyDocument {
    pub bank_id: String,
    pub bank_id_code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributesDocument {
    pub amount: f64,
    pub beneficiary_party: PartyDocument,
    pub debtor_party: PartyDocument,
    pub end_to_end_reference: String,
}

/// A payment as stored. `_id` is the primary key and always equals `Id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentDocument {
    #[serde(rename = "_id")]
    pub key: String,
    pub id: String,
    pub organisation_id: String,
    #[serde(rename = "Type")]
    pub payment_type: String,
    pub version: i64,
    #[serde(default)]
    pub attributes: Option<AttributesDocument>,
}

impl From<&PaymentParty> for PartyDocument {
    fn from(party: &PaymentParty) -> Self {
        PartyDocument {
            bank_id: party.bank_id.clone(),
            bank_id_code: party.bank_id_code.clone(),
            name: party.name.clone(),
        }
    }
}

impl From<PartyDocument> for PaymentParty {
    fn from(document: PartyDocument) -> Self {
        PaymentParty {
            bank_id: document.bank_id,
            bank_id_code: document.bank_id_code,
            name: document.name,
        }
    }
}

impl From<&PaymentAttributes> for AttributesDocument {
    fn from(attributes: &PaymentAttributes) -> Self {
        AttributesDocument {
            amount: attributes.amount,
            beneficiary_party: (&attributes.beneficiary_party).into(),
            debtor_party: (&attributes.debtor_party).into(),
            end_to_end_reference: attributes.end_to_end_reference.clone(),
        }
    }
}

impl From<AttributesDocument> for PaymentAttributes {
    fn from(document: AttributesDocument) -> Self {
        PaymentAttributes {
            amount: document.amount,
            beneficiary_party: document.beneficiary_party.into(),
            debtor_party: document.debtor_party.into(),
            end_to_end_reference: document.end_to_end_reference,
        }
    }
}

impl From<&Payment> for PaymentDocument {
    fn from(payment: &Payment) -> Self {
        PaymentDocument {
            key: payment.id.clone(),
            id: payment.id.clone(),
            organisation_id: payment.organisation_id.clone(),
            payment_type: payment.payment_type.to_string(),
            version: payment.version,
            attributes: payment.attributes.as_ref().map(Into::into),
        }
    }
}

impl TryFrom<PaymentDocument> for Payment {
    type Error = StoreError;

    fn try_from(document: PaymentDocument) -> Result<Self, Self::Error> {
        if document.key != document.id {
            return Err(StoreError::CorruptRecord {
                reason: format!("primary key does not match Id {}", document.id),
                id: document.key,
            });
        }
        let payment_type = document
            .payment_type
            .parse::<PaymentType>()
            .map_err(|reason| StoreError::CorruptRecord {
                id: document.key.clone(),
                reason,
            })?;
        Ok(Payment {
            payment_type,
            id: document.id,
            version: document.version,
            organisation_id: document.organisation_id,
            attributes: document.attributes.map(Into::into),
        })
    }
}

/// Encodes a payment as a JSON document.
pub fn encode_json(payment: &Payment) -> Result<Value, StoreError> {
    serde_json::to_value(PaymentDocument::from(payment)).map_err(|e| StoreError::Encode {
        id: payment.id.clone(),
        reason: e.to_string(),
    })
}

/// Decodes a JSON document, rejecting anything that is not a well-formed payment.
pub fn decode_json(value: Value) -> Result<Payment, StoreError> {
    let key = value
        .get("_id")
        .and_then(Value::as_str)
        .unwrap_or("<unknown>")
        .to_string();
    let document: PaymentDocument =
        serde_json::from_value(value).map_err(|e| StoreError::CorruptRecord {
            id: key,
            reason: e.to_string(),
        })?;
    Payment::try_from(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payment() -> Payment {
        Payment {
            payment_type: PaymentType,
            id: "p-1".to_string(),
            version: 4,
            organisation_id: "org".to_string(),
            attributes: Some(PaymentAttributes {
                amount: 12.5,
                beneficiary_party: PaymentParty {
                    bank_id: "id".to_string(),
                    bank_id_code: "code".to_string(),
                    name: "name".to_string(),
                },
                debtor_party: PaymentParty {
                    bank_id: "id2".to_string(),
                    bank_id_code: "code2".to_string(),
                    name: "name2".to_string(),
                },
                end_to_end_reference: "ref".to_string(),
            }),
        }
    }

    #[test]
    fn document_uses_store_field_names() {
        let document = encode_json(&payment()).unwrap();
        assert_eq!(document["_id"], json!("p-1"));
        assert_eq!(document["Id"], json!("p-1"));
        assert_eq!(document["OrganisationId"], json!("org"));
        assert_eq!(document["Type"], json!("Payment"));
        assert_eq!(document["Version"], json!(4));
        assert_eq!(document["Attributes"]["Amount"], json!(12.5));
        assert!(document["Attributes"]["Amount"].is_number());
        assert_eq!(
            document["Attributes"]["DebtorParty"]["BankIdCode"],
            json!("code2")
        );
        assert_eq!(document["Attributes"]["EndToEndReference"], json!("ref"));
    }

    #[test]
    fn write_then_read_is_lossless() {
        let original = payment();
        let decoded = decode_json(encode_json(&original).unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn payment_without_attributes_survives() {
        let mut original = payment();
        original.attributes = None;
        let document = encode_json(&original).unwrap();
        assert!(document["Attributes"].is_null());
        assert_eq!(decode_json(document).unwrap(), original);
    }

    #[test]
    fn string_amount_is_corrupt() {
        let mut document = encode_json(&payment()).unwrap();
        document["Attributes"]["Amount"] = json!("12.5");
        let error = decode_json(document).unwrap_err();
        assert!(matches!(error, StoreError::CorruptRecord { ref id, .. } if id == "p-1"));
    }

    #[test]
    fn missing_field_is_corrupt() {
        let mut document = encode_json(&payment()).unwrap();
        document.as_object_mut().unwrap().remove("OrganisationId");
        assert!(matches!(
            decode_json(document),
            Err(StoreError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn unknown_type_tag_is_corrupt() {
        let mut document = encode_json(&payment()).unwrap();
        document["Type"] = json!("Refund");
        assert!(matches!(
            decode_json(document),
            Err(StoreError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn mismatched_key_is_corrupt() {
        let mut document = encode_json(&payment()).unwrap();
        document["_id"] = json!("p-2");
        let error = decode_json(document).unwrap_err();
        assert!(matches!(error, StoreError::CorruptRecord { ref id, .. } if id == "p-2"));
    }
}
