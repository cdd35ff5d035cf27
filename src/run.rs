//! Payments API HTTP entrypoint.
//!
//! Wires configuration, the payment store, the service and the HTTP routes together and serves
//! them until SIGTERM or SIGINT.

use axum::Router;
use axum::extract::Request;
use axum::http::Method;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

use crate::config::{Config, StoreBackend, StoreConfig};
use crate::handlers::{self, ApiState};
use crate::request_id::RequestIdLayer;
use crate::service::PaymentService;
use crate::shutdown::Shutdown;
use crate::store::{InMemoryPaymentStore, PaymentStore};
use crate::telemetry::Telemetry;

/// Errors that abort server startup.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error("Failed to initialize data store: {0}")]
    Store(#[from] crate::store::StoreError),
    #[error("Store backend {0:?} is not compiled in, rebuild with the `mongodb` feature")]
    UnsupportedBackend(StoreBackend),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Builds the payment store selected by the configuration.
pub async fn build_store(config: &StoreConfig) -> Result<Arc<dyn PaymentStore>, RunError> {
    match config.backend() {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory payment store");
            Ok(Arc::new(InMemoryPaymentStore::new()))
        }
        #[cfg(feature = "mongodb")]
        StoreBackend::Mongodb => {
            let store = crate::store::MongoPaymentStore::connect(config).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "mongodb"))]
        backend @ StoreBackend::Mongodb => Err(RunError::UnsupportedBackend(backend)),
    }
}

/// The HTTP application: payment routes plus CORS, with handler panics answered as 500.
pub fn app(state: Arc<ApiState>) -> Router {
    handlers::routes()
        .with_state(state)
        .layer(CatchPanicLayer::custom(handlers::panic_response))
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers(cors::Any),
        )
}

/// Wraps the router so a trailing slash resolves to the same route as without one.
///
/// Path rewriting must happen before routing, hence outside the [`Router`].
pub fn trim_trailing_slash(router: Router) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

/// Initializes the payments API server.
///
/// - Loads `.env` variables.
/// - Initializes tracing (and OpenTelemetry export when configured).
/// - Connects to the configured payment store.
/// - Serves the payment routes on `HOST`:`PORT` until a shutdown signal.
pub async fn run() -> Result<(), RunError> {
    dotenv().ok();

    let telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .register();

    let config = Config::load()?;

    let store = build_store(config.store()).await?;
    let service = PaymentService::new(store, config.request_timeout());
    let state = Arc::new(ApiState::new(service, config.public_url()));

    let http_endpoints = trim_trailing_slash(
        app(state)
            .layer(telemetry.http_tracing())
            .layer(RequestIdLayer),
    );

    let addr = SocketAddr::new(config.host(), config.port());
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .inspect_err(|e| tracing::error!("Failed to bind to {}: {}", addr, e))?;

    let shutdown = Shutdown::try_new()?;
    let service = axum::ServiceExt::<Request>::into_make_service(http_endpoints);
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown.signalled())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
