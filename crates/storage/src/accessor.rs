//! Typed read/write accessors over the shared session.
//!
//! An [`Accessor`] is the only surface handlers touch: get-by-id, save,
//! list and filtered search. Accessors are cheap handles around the shared
//! session; the storage context caches one instance per [`RecordKind`] so
//! repeated lookups hand back the same object.

use std::sync::Arc;

use cdrs_tokio::query::QueryValues;
use cdrs_tokio::query_values;
use cdrs_tokio::types::rows::Row;
use cdrs_tokio::types::value::Value;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::query::BasketQuery;
use crate::session::CassandraSession;
use crate::KEYSPACE;

/// Maximum number of rows a search returns.
pub const SEARCH_LIMIT: usize = 500;

/// Enumeration of the record families the storage layer serves.
///
/// Used as the accessor-cache key, so every [`Record`] implementation
/// names its kind explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RecordKind {
    /// Customer baskets.
    Basket,
}

/// A record family persisted in the keyspace.
///
/// Implementations describe their table shape once; the generic
/// [`Accessor`] derives every operation from it.
pub trait Record: Sized + Send + Sync + 'static {
    /// Cache key of this record family.
    const KIND: RecordKind;
    /// Fully qualified table name.
    const TABLE: &'static str;

    /// The primary-key type.
    type Key: Into<Value> + Send;

    /// Decodes a CQL row.
    fn try_from_row(row: Row) -> StorageResult<Self>;

    /// The parameterized INSERT statement for this table.
    fn insert_cql() -> &'static str;

    /// The bound values matching [`Record::insert_cql`], in order.
    fn insert_values(&self) -> QueryValues;
}

/// Typed accessor bound to one record family.
pub struct Accessor<R: Record> {
    session: Arc<CassandraSession>,
    _marker: std::marker::PhantomData<fn() -> R>,
}

impl<R: Record> Accessor<R> {
    pub(crate) fn new(session: Arc<CassandraSession>) -> Self {
        Self {
            session,
            _marker: std::marker::PhantomData,
        }
    }

    /// Fetches one record by primary key.
    pub async fn get_by_id(&self, key: R::Key) -> StorageResult<Option<R>> {
        let cql = format!("SELECT * FROM {} WHERE id = ?", R::TABLE);
        let envelope = self
            .session
            .query_with_values(&cql, query_values!(key.into()))
            .await?;
        let rows = rows_of(envelope)?;
        rows.into_iter().next().map(R::try_from_row).transpose()
    }

    /// Persists one record. Inserts are upserts in CQL, so saving an
    /// existing key overwrites the row.
    pub async fn save(&self, record: &R) -> StorageResult<()> {
        self.session
            .query_with_values(R::insert_cql(), record.insert_values())
            .await?;
        Ok(())
    }

    /// Lists up to [`SEARCH_LIMIT`] records.
    pub async fn list(&self) -> StorageResult<Vec<R>> {
        let cql = format!("SELECT * FROM {} LIMIT {}", R::TABLE, SEARCH_LIMIT);
        let envelope = self.session.query(&cql).await?;
        rows_of(envelope)?
            .into_iter()
            .map(R::try_from_row)
            .collect()
    }
}

impl<R: Record> Clone for Accessor<R> {
    fn clone(&self) -> Self {
        Self::new(self.session.clone())
    }
}

impl<R: Record> std::fmt::Debug for Accessor<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accessor").field("table", &R::TABLE).finish()
    }
}

impl Accessor<crate::model::Basket> {
    /// Runs a filtered search through the search index.
    ///
    /// The criteria are translated into a search DSL document and bound to
    /// the `es_query` pseudo-column; the coordinator executes the search
    /// and returns matching rows from the row store.
    pub async fn search(&self, query: &BasketQuery) -> StorageResult<Vec<crate::model::Basket>> {
        let body = query.to_search_body().to_string();
        debug!(query = %body, "Searching baskets");
        let cql = format!(
            "SELECT * FROM {}.baskets WHERE es_query = ? AND \
             es_options = 'indices={}' LIMIT {} ALLOW FILTERING",
            KEYSPACE, KEYSPACE, SEARCH_LIMIT
        );
        let envelope = self
            .session
            .query_with_values(&cql, query_values!(body))
            .await?;
        rows_of(envelope)?
            .into_iter()
            .map(crate::model::Basket::try_from_row)
            .collect()
    }
}

fn rows_of(envelope: cdrs_tokio::frame::Envelope) -> StorageResult<Vec<Row>> {
    Ok(envelope
        .response_body()
        .map_err(|e| StorageError::Internal {
            message: format!("decode response body: {e}"),
        })?
        .into_rows()
        .unwrap_or_default())
}
