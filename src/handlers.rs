//! HTTP endpoints of the payments API.
//!
//! | Verb | Path | Success | Failure |
//! |------|------|---------|---------|
//! | `GET` | `/v1/api/payments` | 200 [`Payments`] | 500 |
//! | `GET` | `/v1/api/payments/{id}` | 200 [`Payment`] | 404, 500 |
//! | `POST` | `/v1/api/payments` | 200 created [`Payment`] | 400, 500 |
//! | `PUT` | `/v1/api/payments/{id}` | 200 updated [`Payment`] | 400, 404, 500 |
//! | `DELETE` | `/v1/api/payments/{id}` | 200 [`PaymentDelete`] | 404, 500 |
//!
//! Mutating requests are validated before the service is called. Failures are rendered as
//! [`ErrorResponse`]; storage details are logged and never returned to the caller.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use tracing::instrument;
use url::Url;

use crate::service::{PaymentService, ServiceError};
use crate::types::{ErrorResponse, Links, Payment, PaymentDelete, Payments};
use crate::validation::{Violation, parse_attributes, parse_payment};

pub const PAYMENTS_PATH: &str = "/v1/api/payments";

const STATUS_BAD_REQUEST: &str = "Bad request";
const STATUS_NOT_FOUND: &str = "Payment not found";
const STATUS_INTERNAL_ERROR: &str = "Internal Error";
const MALFORMED_BODY: &str = "Malformed request body";

/// Shared state of the payment routes.
pub struct ApiState {
    service: PaymentService,
    self_link: String,
}

impl ApiState {
    /// `public_url` is the externally visible base of the server, e.g. `http://localhost:8080`.
    pub fn new(service: PaymentService, public_url: &Url) -> Self {
        let self_link = format!(
            "{}{}",
            public_url.as_str().trim_end_matches('/'),
            PAYMENTS_PATH
        );
        ApiState { service, self_link }
    }
}

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(PAYMENTS_PATH, get(get_payments).post(post_payment))
        .route(
            &format!("{PAYMENTS_PATH}/{{payment_id}}"),
            get(get_payment).put(put_payment).delete(delete_payment),
        )
}

/// Every way a request can fail, as seen by the caller.
#[derive(Debug)]
pub enum ApiError {
    /// The payload was rejected. Carries one message per violation, in order.
    BadRequest(Vec<String>),
    NotFound,
    Internal,
}

impl From<Vec<Violation>> for ApiError {
    fn from(violations: Vec<Violation>) -> Self {
        ApiError::BadRequest(violations.iter().map(ToString::to_string).collect())
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        tracing::error!(error = %error, "Payment operation failed");
        ApiError::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, text, messages) = match self {
            ApiError::BadRequest(messages) => {
                (StatusCode::BAD_REQUEST, STATUS_BAD_REQUEST, messages)
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, STATUS_NOT_FOUND, Vec::new()),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                STATUS_INTERNAL_ERROR,
                Vec::new(),
            ),
        };
        let body = ErrorResponse {
            status: text.to_string(),
            messages,
        };
        (status, Json(body)).into_response()
    }
}

/// Renders a panicked request as a generic internal error.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>");
    tracing::error!(panic = detail, "Request handler panicked");
    ApiError::Internal.into_response()
}

/// Decodes a request body as JSON. Anything else is rejected outright rather than being
/// treated as an empty payload.
fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|error| {
        tracing::debug!(%error, "Rejecting malformed request body");
        ApiError::BadRequest(vec![MALFORMED_BODY.to_string()])
    })
}

/// `GET /v1/api/payments`: every stored payment plus a `self` link.
#[instrument(skip_all)]
pub async fn get_payments(State(state): State<Arc<ApiState>>) -> Result<Json<Payments>, ApiError> {
    let data = state.service.get_payments().await?;
    Ok(Json(Payments {
        data,
        links: Links {
            self_link: state.self_link.clone(),
        },
    }))
}

/// `GET /v1/api/payments/{id}`
#[instrument(skip(state))]
pub async fn get_payment(
    State(state): State<Arc<ApiState>>,
    Path(payment_id): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    match state.service.get_payment(&payment_id).await? {
        Some(payment) => Ok(Json(payment)),
        None => Err(ApiError::NotFound),
    }
}

/// `POST /v1/api/payments`: validates and creates a payment.
///
/// The version is forced to 0 and the identifier is generated, whatever the caller sent.
#[instrument(skip_all)]
pub async fn post_payment(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Json<Payment>, ApiError> {
    let mut value = parse_body(&body)?;
    if let Value::Object(map) = &mut value {
        map.remove("id");
        map.insert("version".to_string(), Value::from(0));
    }
    let payment = parse_payment(value)?;
    let created = state.service.create_payment(payment).await?;
    tracing::info!(payment_id = %created.id, "Payment created");
    Ok(Json(created))
}

/// `PUT /v1/api/payments/{id}`: replaces the attributes of a payment, bumping its version.
///
/// Only `attributes` is read from the body.
#[instrument(skip(state, body))]
pub async fn put_payment(
    State(state): State<Arc<ApiState>>,
    Path(payment_id): Path<String>,
    body: Bytes,
) -> Result<Json<Payment>, ApiError> {
    let attributes = parse_attributes(parse_body(&body)?)?;
    match state.service.update_payment(&payment_id, attributes).await? {
        Some(payment) => Ok(Json(payment)),
        None => Err(ApiError::NotFound),
    }
}

/// `DELETE /v1/api/payments/{id}`
#[instrument(skip(state))]
pub async fn delete_payment(
    State(state): State<Arc<ApiState>>,
    Path(payment_id): Path<String>,
) -> Result<Json<PaymentDelete>, ApiError> {
    if state.service.delete_payment(&payment_id).await? {
        Ok(Json(PaymentDelete { deleted: true }))
    } else {
        Err(ApiError::NotFound)
    }
}
