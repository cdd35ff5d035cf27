//! Structural validation of inbound payment payloads.
//!
//! Each entity has one validator function walking a [`serde_json::Value`]:
//!
//! | Entity | Required | Constraints |
//! |--------|----------|-------------|
//! | payment | `type`, `organisation_id` | `type` is `"Payment"`; `attributes` validated when present |
//! | attributes | `amount`, `beneficiary_party`, `debtor_party`, `end_to_end_reference` | `amount > 0` |
//! | party | `bank_id`, `bank_id_code`, `name` | all strings |
//!
//! A member that is missing, `null` or an empty string counts as absent, so required string
//! fields can not be satisfied by `""`.
//!
//! Violations are reported in a stable order: for every object, the missing required
//! fields in declared order, then the checks of the present fields in declared order.
//! A successfully validated value always decodes into the typed entity; should that decode
//! fail regardless, the caller gets a single [`Violation::failed_to_validate`].

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::fmt::{Display, Formatter};

use crate::types::{Payment, PaymentAttributes, PaymentType};

/// One failed constraint, located by a dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path of the offending field. Empty for the document root.
    pub field: String,
    pub message: String,
}

impl Violation {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Generic violation used when the validator itself cannot reach a verdict.
    pub fn failed_to_validate() -> Self {
        Self::new("", "Failed to validate")
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

const PAYMENT_REQUIRED: &[&str] = &["type", "organisation_id"];
const ATTRIBUTES_REQUIRED: &[&str] = &[
    "amount",
    "beneficiary_party",
    "debtor_party",
    "end_to_end_reference",
];
const PARTY_REQUIRED: &[&str] = &["bank_id", "bank_id_code", "name"];

/// Validates a complete payment, as submitted on create.
pub fn validate_payment(value: &Value) -> Vec<Violation> {
    let mut validator = Validator::default();
    validator.payment("", value);
    validator.violations
}

/// Validates an attributes record located at `path` (e.g. `"attributes"`).
///
/// `None` means the record is absent altogether, which is itself a violation.
pub fn validate_attributes(path: &str, value: Option<&Value>) -> Vec<Violation> {
    let mut validator = Validator::default();
    match value {
        Some(value) if !value.is_null() => validator.attributes(path, value),
        _ => validator.push(path, "is required"),
    }
    validator.violations
}

/// Validates and decodes a create payload in one step.
pub fn parse_payment(value: Value) -> Result<Payment, Vec<Violation>> {
    let violations = validate_payment(&value);
    if !violations.is_empty() {
        return Err(violations);
    }
    decode(value)
}

/// Validates and decodes the `attributes` member of an update envelope.
pub fn parse_attributes(envelope: Value) -> Result<PaymentAttributes, Vec<Violation>> {
    let attributes = match envelope {
        Value::Object(mut map) => map.remove("attributes"),
        other => {
            return Err(vec![Violation::new(
                "",
                format!("invalid type, expected object, given {}", kind(&other)),
            )]);
        }
    };
    let violations = validate_attributes("attributes", attributes.as_ref());
    if !violations.is_empty() {
        return Err(violations);
    }
    decode(attributes.unwrap_or(Value::Null))
}

fn decode<T: DeserializeOwned>(mut value: Value) -> Result<T, Vec<Violation>> {
    strip_nulls(&mut value);
    serde_json::from_value(value).map_err(|error| {
        tracing::warn!(%error, "validated payload failed to decode");
        vec![Violation::failed_to_validate()]
    })
}

#[derive(Default)]
struct Validator {
    violations: Vec<Violation>,
}

impl Validator {
    fn push(&mut self, path: &str, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    fn object<'a>(&mut self, path: &str, value: &'a Value) -> Option<&'a Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.push(
                    path,
                    format!("invalid type, expected object, given {}", kind(other)),
                );
                None
            }
        }
    }

    fn required(&mut self, path: &str, map: &Map<String, Value>, fields: &[&str]) {
        for field in fields {
            if present(map, field).is_none() {
                self.push(&join(path, field), "is required");
            }
        }
    }

    fn string(&mut self, path: &str, map: &Map<String, Value>, field: &str) {
        if let Some(value) = present(map, field) {
            if !value.is_string() {
                self.push(
                    &join(path, field),
                    format!("invalid type, expected string, given {}", kind(value)),
                );
            }
        }
    }

    fn payment(&mut self, path: &str, value: &Value) {
        let Some(map) = self.object(path, value) else {
            return;
        };
        self.required(path, map, PAYMENT_REQUIRED);
        if let Some(payment_type) = present(map, "type") {
            match payment_type.as_str() {
                Some(PaymentType::VALUE) => {}
                Some(_) => self.push(
                    &join(path, "type"),
                    format!("must be one of the following: \"{}\"", PaymentType::VALUE),
                ),
                None => self.push(
                    &join(path, "type"),
                    format!("invalid type, expected string, given {}", kind(payment_type)),
                ),
            }
        }
        self.string(path, map, "id");
        self.string(path, map, "organisation_id");
        if let Some(attributes) = present(map, "attributes") {
            self.attributes(&join(path, "attributes"), attributes);
        }
    }

    fn attributes(&mut self, path: &str, value: &Value) {
        let Some(map) = self.object(path, value) else {
            return;
        };
        self.required(path, map, ATTRIBUTES_REQUIRED);
        if let Some(amount) = present(map, "amount") {
            match amount.as_f64() {
                Some(amount) if amount > 0.0 => {}
                Some(_) => self.push(&join(path, "amount"), "must be greater than 0"),
                None => self.push(
                    &join(path, "amount"),
                    format!("invalid type, expected number, given {}", kind(amount)),
                ),
            }
        }
        if let Some(party) = present(map, "beneficiary_party") {
            self.party(&join(path, "beneficiary_party"), party);
        }
        if let Some(party) = present(map, "debtor_party") {
            self.party(&join(path, "debtor_party"), party);
        }
        self.string(path, map, "end_to_end_reference");
    }

    fn party(&mut self, path: &str, value: &Value) {
        let Some(map) = self.object(path, value) else {
            return;
        };
        self.required(path, map, PARTY_REQUIRED);
        for field in PARTY_REQUIRED {
            self.string(path, map, field);
        }
    }
}

/// A member counts as present unless it is missing, `null` or `""`.
fn present<'a>(map: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    map.get(field).filter(|value| !value.is_null() && value.as_str() != Some(""))
}

/// Drops `null` object members, recursively, so they decode like missing ones.
fn strip_nulls(value: &mut Value) {
    if let Value::Object(map) = value {
        map.retain(|_, member| !member.is_null());
        map.values_mut().for_each(strip_nulls);
    }
}

fn join(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{path}.{field}")
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
