//! One-time schema bootstrap: keyspace, CQL schema, search index.

use elasticsearch::indices::IndicesCreateParts;
use elasticsearch::Elasticsearch;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::session::CassandraSession;
use crate::KEYSPACE;

/// The CQL schema shipped with the crate.
pub const SCHEMA_CQL: &str = include_str!("../resources/schema.cql");

/// Splits a CQL script into statements.
///
/// Lines whose first non-blank characters are `//` are comments and
/// dropped; everything else is concatenated until a terminating `;`.
/// Trailing text without a terminator is ignored.
pub fn parse_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    for line in script.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(trimmed);
        if current.ends_with(';') {
            current.pop();
            statements.push(current.trim().to_string());
            current = String::new();
        }
    }
    statements
}

/// Creates the keyspace if it does not exist yet.
///
/// The replication strategy is topology-aware with one replica in the
/// local datacenter, read from `system.local`. Durable writes are off:
/// Elassandra keyspaces rely on the search index for durability of
/// acknowledged data in this deployment model.
pub async fn create_keyspace(session: &CassandraSession) -> StorageResult<()> {
    let envelope = session
        .query("SELECT data_center FROM system.local")
        .await?;
    let rows = envelope
        .response_body()
        .map_err(|e| StorageError::Schema {
            message: format!("read system.local: {e}"),
        })?
        .into_rows()
        .unwrap_or_default();
    let data_center = rows
        .first()
        .and_then(|row| {
            use cdrs_tokio::types::IntoRustByName;
            IntoRustByName::<String>::get_by_name(row, "data_center")
                .ok()
                .flatten()
        })
        .ok_or_else(|| StorageError::Schema {
            message: "system.local has no data_center".into(),
        })?;

    let cql = format!(
        "CREATE KEYSPACE IF NOT EXISTS {KEYSPACE} WITH replication = \
         {{'class': 'NetworkTopologyStrategy', '{data_center}': '1'}} \
         AND durable_writes = false"
    );
    info!(keyspace = KEYSPACE, data_center = %data_center, "Creating keyspace");
    session.query(&cql).await?;
    Ok(())
}

/// Applies every statement of [`SCHEMA_CQL`]. Statements are idempotent
/// (`IF NOT EXISTS`), so re-running is safe.
pub async fn apply_schema(session: &CassandraSession) -> StorageResult<()> {
    for statement in parse_statements(SCHEMA_CQL) {
        debug!(statement = %statement, "Applying schema statement");
        session
            .query(&statement)
            .await
            .map_err(|e| StorageError::Schema {
                message: format!("{statement}: {e}"),
            })?;
    }
    info!("CQL schema applied");
    Ok(())
}

/// Creates the search index mirroring the keyspace.
///
/// The mapping discovers every column (`discover: ".*"`), and the index
/// settings bind it to the keyspace with synchronous refresh so freshly
/// written rows are searchable immediately. An already-existing index is
/// treated as success.
pub async fn create_search_index(client: &Elasticsearch) -> StorageResult<()> {
    let body = json!({
        "settings": {
            "keyspace": KEYSPACE,
            "synchronous_refresh": true
        },
        "mappings": {
            KEYSPACE: { "discover": ".*" }
        }
    });

    let response = client
        .indices()
        .create(IndicesCreateParts::Index(KEYSPACE))
        .body(body)
        .send()
        .await?;

    let status = response.status_code().as_u16();
    if response.status_code().is_success() {
        info!(index = KEYSPACE, "Search index created");
        return Ok(());
    }

    let text = response.text().await.unwrap_or_default();
    if text.contains("resource_already_exists_exception") {
        debug!(index = KEYSPACE, "Search index already exists");
        return Ok(());
    }
    Err(StorageError::IndexCreation {
        status,
        message: text,
    })
}
