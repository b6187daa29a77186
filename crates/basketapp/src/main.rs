//! BasketApp
//!
//! Basket store over Elassandra: rows in Cassandra, transparently mirrored
//! into an Elasticsearch index for search.

use std::sync::Arc;

use basketapp_rest::{create_app, init_logging, ServerConfig};
use basketapp_storage::{ElassandraStorage, SecureTransport};
use clap::Parser;
use tracing::info;

/// Starts the Axum HTTP server.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        port = config.port,
        host = %config.host,
        cassandra = %config.cassandra_contact_point,
        elasticsearch = %config.elasticsearch_url,
        "Starting BasketApp"
    );

    let storage = Arc::new(ElassandraStorage::new(
        config.storage_config(),
        SecureTransport::from_env(),
    ));
    storage
        .open()
        .await
        .map_err(|e| anyhow::anyhow!("Could not open storage: {}", e))?;

    let app = create_app(storage.clone(), config.clone());
    let result = serve(app, &config).await;

    storage.close().await;
    result
}
