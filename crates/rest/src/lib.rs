//! # basketapp-rest - HTTP API for BasketApp
//!
//! This crate exposes the basket store over HTTP. Handlers are thin: they
//! parse the request, reach the storage layer through its typed accessors,
//! and shape the response.
//!
//! ## API Endpoints
//!
//! | Operation | HTTP Method | URL Pattern |
//! |-----------|-------------|-------------|
//! | list | GET | `/basketapp/basket/` |
//! | read | GET | `/basketapp/basket/{id}` |
//! | search | GET | `/basketapp/basket/search?store_code=&product_code=` |
//! | ingest | POST | `/basketapp/basket/` |
//! | upload | POST | `/basketapp/basket/upload` |
//! | descriptor | GET | `/swagger/basketapp.yml` |
//!
//! ## Architecture
//!
//! - [`config`] - Server configuration
//! - [`state`] - Application state (storage, configuration)
//! - [`error`] - Error types and their HTTP mapping
//! - [`handlers`] - HTTP request handlers
//! - [`routing`] - Route configuration

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod routing;
pub mod state;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use basketapp_storage::ElassandraStorage;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Creates the Axum application.
///
/// The storage context is shared, not owned: the caller decides when to
/// open and close it.
pub fn create_app(storage: Arc<ElassandraStorage>, config: ServerConfig) -> Router {
    let state = AppState::new(storage, Arc::new(config.clone()));
    let router = routing::create_routes(state);

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    let router = if config.enable_cors {
        router.layer(build_cors_layer(&config))
    } else {
        router
    };

    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    cors.allow_methods(Any).allow_headers(Any)
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "basketapp_rest={level},basketapp_storage={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
