//! Type definitions for the payments API.
//!
//! The entity types ([`Payment`], [`PaymentAttributes`], [`PaymentParty`]) are what the
//! service and the store exchange. The envelope types ([`Payments`], [`PaymentDelete`],
//! [`ErrorResponse`]) only exist on the HTTP boundary.
//!
//! All JSON is `snake_case`, matching the field names callers submit.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The `type` discriminator of a payment. Only the literal `"Payment"` is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PaymentType;

impl PaymentType {
    pub const VALUE: &'static str = "Payment";
}

impl AsRef<str> for PaymentType {
    fn as_ref(&self) -> &str {
        Self::VALUE
    }
}

impl Display for PaymentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(Self::VALUE)
    }
}

impl FromStr for PaymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::VALUE {
            Ok(PaymentType)
        } else {
            Err(format!("expected '{}', got '{}'", Self::VALUE, s))
        }
    }
}

impl Serialize for PaymentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(Self::VALUE)
    }
}

impl<'de> Deserialize<'de> for PaymentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A bank/account participant of a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentParty {
    pub bank_id: String,
    pub bank_id_code: String,
    pub name: String,
}

/// Financial details of a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAttributes {
    /// Always strictly positive once validated.
    pub amount: f64,
    pub beneficiary_party: PaymentParty,
    pub debtor_party: PaymentParty,
    pub end_to_end_reference: String,
}

/// The payment resource.
///
/// `id` is assigned by [`PaymentService::create_payment`](crate::service::PaymentService::create_payment)
/// and `version` is owned by the store, so a caller-supplied value for either is
/// accepted on the wire but never trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub version: i64,
    pub organisation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<PaymentAttributes>,
}

/// `links` member of a list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
}

/// Body of `GET /payments`. `data` is always an array, possibly empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payments {
    pub data: Vec<Payment>,
    pub links: Links,
}

/// Body of a successful `DELETE`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDelete {
    pub deleted: bool,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub messages: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payment_type_only_accepts_literal() {
        assert!("Payment".parse::<PaymentType>().is_ok());
        assert!("payment".parse::<PaymentType>().is_err());
        assert!(serde_json::from_value::<PaymentType>(json!("Transfer")).is_err());
        assert_eq!(serde_json::to_value(PaymentType).unwrap(), json!("Payment"));
    }

    #[test]
    fn payment_without_attributes_omits_them() {
        let payment = Payment {
            payment_type: PaymentType,
            id: "abc".to_string(),
            version: 2,
            organisation_id: "org".to_string(),
            attributes: None,
        };
        let value = serde_json::to_value(&payment).unwrap();
        assert_eq!(
            value,
            json!({"type": "Payment", "id": "abc", "version": 2, "organisation_id": "org"})
        );
    }

    #[test]
    fn list_serializes_self_link() {
        let payments = Payments {
            data: vec![],
            links: Links {
                self_link: "http://localhost:8080/v1/api/payments".to_string(),
            },
        };
        let value = serde_json::to_value(&payments).unwrap();
        assert_eq!(value["data"], json!([]));
        assert_eq!(
            value["links"]["self"],
            json!("http://localhost:8080/v1/api/payments")
        );
    }
}
