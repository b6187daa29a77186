//! The Elassandra storage context: lifecycle and accessor cache.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use elasticsearch::auth::Credentials;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use elasticsearch::http::Url;
use elasticsearch::Elasticsearch;
use parking_lot::{Mutex, RwLock};
use tracing::{error, info, warn};

use crate::accessor::{Accessor, Record, RecordKind};
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::schema;
use crate::security::SecureTransport;
use crate::session::CassandraSession;
use crate::KEYSPACE;

/// Shared storage context over the Cassandra row store and its mirrored
/// Elasticsearch index.
///
/// One instance is created at startup and passed explicitly to everything
/// that needs storage. Lifecycle transitions (`open`, `init`, `cleanup`,
/// `close`) are idempotent and safe to call concurrently: a burst of
/// `open()` calls performs one connection attempt, and `init()` bootstraps
/// the schema at most once per process.
pub struct ElassandraStorage {
    config: StorageConfig,
    transport: SecureTransport,
    opened: AtomicBool,
    initialized: AtomicBool,
    session: RwLock<Option<Arc<CassandraSession>>>,
    elasticsearch: RwLock<Option<Arc<Elasticsearch>>>,
    accessors: Mutex<HashMap<RecordKind, Arc<dyn Any + Send + Sync>>>,
    // Serializes lifecycle transitions without blocking readers.
    lifecycle: tokio::sync::Mutex<()>,
}

impl ElassandraStorage {
    /// Creates a closed storage context. No connection is attempted until
    /// [`open`](Self::open).
    pub fn new(config: StorageConfig, transport: SecureTransport) -> Self {
        Self {
            config,
            transport,
            opened: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
            session: RwLock::new(None),
            elasticsearch: RwLock::new(None),
            accessors: Mutex::new(HashMap::new()),
            lifecycle: tokio::sync::Mutex::new(()),
        }
    }

    /// Whether [`open`](Self::open) has completed successfully.
    pub fn is_opened(&self) -> bool {
        self.opened.load(Ordering::Acquire)
    }

    /// Opens the shared session: connects to the row store, builds the
    /// search client, then runs one-time initialization.
    ///
    /// Concurrent callers coalesce onto a single attempt; once opened,
    /// further calls return immediately. A failed attempt resets the state
    /// so a later call can retry.
    pub async fn open(&self) -> StorageResult<()> {
        if self.is_opened() {
            return Ok(());
        }
        let _guard = self.lifecycle.lock().await;
        if self.is_opened() {
            return Ok(());
        }

        let session = CassandraSession::connect(&self.config, &self.transport).await?;
        let client = self.build_elasticsearch_client()?;

        *self.session.write() = Some(Arc::new(session));
        *self.elasticsearch.write() = Some(Arc::new(client));
        self.opened.store(true, Ordering::Release);
        info!(
            contact_point = %self.config.contact_point,
            elasticsearch_url = %self.config.elasticsearch_url,
            "Storage opened"
        );

        self.init_locked().await;
        Ok(())
    }

    /// Runs one-time initialization: keyspace, CQL schema, search index.
    ///
    /// The first caller wins; everyone after sees the sticky flag and
    /// returns. Bootstrap failures are logged and swallowed, and the flag
    /// stays set: a node racing a concurrent bootstrap elsewhere must not
    /// take the whole service down. Verifying the schema instead of
    /// trusting the flag would slot in here.
    pub async fn init(&self) -> StorageResult<()> {
        if !self.is_opened() {
            return Err(StorageError::NotOpened);
        }
        let _guard = self.lifecycle.lock().await;
        self.init_locked().await;
        Ok(())
    }

    async fn init_locked(&self) {
        if self
            .initialized
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let (session, client) = match (self.session_handle(), self.elasticsearch_handle()) {
            (Ok(session), Ok(client)) => (session, client),
            _ => return,
        };

        if let Err(e) = schema::create_keyspace(&session).await {
            error!(error = %e, "Keyspace creation failed");
            return;
        }
        if let Err(e) = schema::apply_schema(&session).await {
            error!(error = %e, "Schema bootstrap failed");
            return;
        }
        if let Err(e) = schema::create_search_index(&client).await {
            error!(error = %e, "Search index creation failed");
            return;
        }
        if let Err(e) = self.seed_data().await {
            error!(error = %e, "Seed data failed");
        }
    }

    /// Hook for loading reference data after the schema exists. Nothing is
    /// seeded today; deployments that need fixtures override this step by
    /// ingesting through the API.
    async fn seed_data(&self) -> StorageResult<()> {
        Ok(())
    }

    /// Empties every table of the keyspace. Intended for test benches.
    ///
    /// Failures are logged, never propagated: cleanup is best-effort by
    /// contract.
    pub async fn cleanup(&self) {
        let session = match self.session_handle() {
            Ok(session) => session,
            Err(_) => {
                warn!("Cleanup requested on a closed storage context");
                return;
            }
        };

        let tables = match session
            .query(&format!(
                "SELECT table_name FROM system_schema.tables \
                 WHERE keyspace_name = '{KEYSPACE}'"
            ))
            .await
            .and_then(|envelope| {
                envelope
                    .response_body()
                    .map_err(|e| StorageError::Internal {
                        message: format!("decode response body: {e}"),
                    })
                    .map(|body| body.into_rows().unwrap_or_default())
            }) {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "Could not list tables for cleanup");
                return;
            }
        };

        for row in tables {
            use cdrs_tokio::types::IntoRustByName;
            let Ok(Some(table)) = IntoRustByName::<String>::get_by_name(&row, "table_name") else {
                continue;
            };
            info!(keyspace = KEYSPACE, table = %table, "Truncating table");
            if let Err(e) = session
                .query(&format!("TRUNCATE {KEYSPACE}.{table}"))
                .await
            {
                error!(table = %table, error = %e, "Truncate failed");
            }
        }
    }

    /// Closes the context: drops the session, the search client and every
    /// cached accessor. Idempotent.
    pub async fn close(&self) {
        let _guard = self.lifecycle.lock().await;
        self.opened.store(false, Ordering::Release);
        self.session.write().take();
        self.elasticsearch.write().take();
        self.accessors.lock().clear();
        info!("Storage closed");
    }

    /// Returns the cached accessor for a record family, creating it on
    /// first use. Repeated calls for the same family return the same
    /// instance.
    pub fn accessor<R: Record>(&self) -> StorageResult<Arc<Accessor<R>>> {
        let session = self.session_handle()?;
        let mut cache = self.accessors.lock();
        if let Some(cached) = cache.get(&R::KIND) {
            if let Ok(accessor) = Arc::clone(cached).downcast::<Accessor<R>>() {
                return Ok(accessor);
            }
        }
        let accessor = Arc::new(Accessor::<R>::new(session));
        cache.insert(R::KIND, accessor.clone() as Arc<dyn Any + Send + Sync>);
        Ok(accessor)
    }

    /// Direct handle to the search client, for diagnostics.
    pub fn elasticsearch(&self) -> StorageResult<Arc<Elasticsearch>> {
        self.elasticsearch_handle()
    }

    fn session_handle(&self) -> StorageResult<Arc<CassandraSession>> {
        self.session
            .read()
            .as_ref()
            .cloned()
            .ok_or(StorageError::NotOpened)
    }

    fn elasticsearch_handle(&self) -> StorageResult<Arc<Elasticsearch>> {
        self.elasticsearch
            .read()
            .as_ref()
            .cloned()
            .ok_or(StorageError::NotOpened)
    }

    fn build_elasticsearch_client(&self) -> StorageResult<Elasticsearch> {
        let url = Url::parse(&self.config.elasticsearch_url).map_err(|e| {
            StorageError::Connection {
                message: format!("invalid elasticsearch url {}: {}", self.config.elasticsearch_url, e),
            }
        })?;
        let pool = SingleNodeConnectionPool::new(url);
        let mut builder = TransportBuilder::new(pool)
            .timeout(Duration::from_millis(self.config.request_timeout_ms))
            .cert_validation(self.transport.certificate_validation());
        if let Some((user, pass)) = self.transport.credentials() {
            builder = builder.auth(Credentials::Basic(user.to_string(), pass.to_string()));
        }
        if let Some(identity) = self.transport.client_certificate() {
            builder = builder.auth(identity.into());
        }
        let transport = builder.build().map_err(|e| StorageError::Connection {
            message: format!("elasticsearch transport: {e}"),
        })?;
        Ok(Elasticsearch::new(transport))
    }
}

impl std::fmt::Debug for ElassandraStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElassandraStorage")
            .field("contact_point", &self.config.contact_point)
            .field("opened", &self.is_opened())
            .field("initialized", &self.initialized.load(Ordering::Acquire))
            .finish()
    }
}
