//! CRUD HTTP API for payment resources backed by a document store.
//!
//! # Overview
//!
//! Callers submit JSON payments. The API validates them, assigns identifiers, and
//! persists, retrieves, updates and deletes them. Every update bumps a per-payment
//! version counter by one.
//!
//! # Layers
//!
//! Requests flow through the layers top to bottom, results flow back up:
//!
//! - [`handlers`] - HTTP routes; validate mutating requests and translate outcomes into
//!   200/400/404/500 responses.
//! - [`validation`] - Structural checks of payment, attributes and party payloads.
//! - [`service`] - Identifier assignment and the per-request store deadline.
//! - [`store`] - The [`PaymentStore`](store::PaymentStore) trait, the persisted document
//!   shape, and the in-memory and MongoDB backends.
//!
//! # Modules
//!
//! - [`config`] - Server configuration loaded from a JSON file, environment and defaults.
//! - [`request_id`] - Tower layer tagging every request with an identifier.
//! - [`run`] - Server wiring and startup.
//! - [`shutdown`] - SIGTERM/SIGINT handling for graceful shutdown.
//! - [`telemetry`] - `tracing` subscriber and optional OpenTelemetry export.
//! - [`types`] - Payment entities and response envelopes.
//!
//! # Features
//!
//! - `mongodb` - Enables `store::MongoPaymentStore`. Without it only the in-memory store is
//!   available.

pub mod config;
pub mod handlers;
pub mod request_id;
pub mod run;
pub mod service;
pub mod shutdown;
pub mod store;
pub mod telemetry;
pub mod types;
pub mod validation;

pub use run::run;
