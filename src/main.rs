//! Payments API HTTP server.
//!
//! Endpoints:
//! - `GET /v1/api/payments` - List all payments
//! - `GET /v1/api/payments/{id}` - Fetch one payment
//! - `POST /v1/api/payments` - Create a payment
//! - `PUT /v1/api/payments/{id}` - Replace a payment's attributes
//! - `DELETE /v1/api/payments/{id}` - Delete a payment
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `HOST`, `PORT` control binding address
//! - `STORE_BACKEND`, `MONGO_URL`, `MONGO_DATABASE`, `MONGO_COLLECTION` select the store
//! - `OTEL_*` variables enable trace and metric export

use std::process;

use payments_api::run;

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1)
    }
}
