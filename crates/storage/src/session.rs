//! CQL session establishment.
//!
//! The driver's session type is generic over its transport, so the plaintext
//! and TLS variants are distinct types. [`CassandraSession`] wraps both
//! behind one query surface so the rest of the crate stays
//! transport-agnostic.

use std::sync::Arc;

use cdrs_tokio::authenticators::StaticPasswordAuthenticatorProvider;
use cdrs_tokio::cluster::session::{
    RustlsSessionBuilder, Session, SessionBuilder, TcpSessionBuilder,
};
use cdrs_tokio::cluster::{
    NodeRustlsConfigBuilder, NodeTcpConfigBuilder, RustlsConnectionManager, TcpConnectionManager,
};
use cdrs_tokio::frame::Envelope;
use cdrs_tokio::load_balancing::RoundRobinLoadBalancingStrategy;
use cdrs_tokio::query::QueryValues;
use cdrs_tokio::transport::{TransportRustls, TransportTcp};
use tracing::info;

use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::security::SecureTransport;

type TcpSession = Session<
    TransportTcp,
    TcpConnectionManager,
    RoundRobinLoadBalancingStrategy<TransportTcp, TcpConnectionManager>,
>;

type TlsSession = Session<
    TransportRustls,
    RustlsConnectionManager,
    RoundRobinLoadBalancingStrategy<TransportRustls, RustlsConnectionManager>,
>;

/// A connected CQL session over either a plaintext or an encrypted
/// transport.
pub enum CassandraSession {
    /// Plaintext TCP transport.
    Tcp(TcpSession),
    /// TLS transport configured from the secure-transport context.
    Tls(TlsSession),
}

impl CassandraSession {
    /// Connects to the configured contact point, choosing the transport
    /// from the security context: a trust store enables TLS, otherwise
    /// plaintext TCP. Credentials, when present, authenticate either
    /// variant.
    pub async fn connect(
        config: &StorageConfig,
        transport: &SecureTransport,
    ) -> StorageResult<Self> {
        match transport.cassandra_tls() {
            Some(tls_config) => {
                info!(contact_point = %config.contact_point, "Connecting to Cassandra over TLS");
                let server_name = rustls::ServerName::try_from(config.contact_host())
                    .map_err(|e| StorageError::Connection {
                        message: format!("invalid TLS server name {}: {}", config.contact_host(), e),
                    })?;
                let mut builder = NodeRustlsConfigBuilder::new(server_name, tls_config)
                    .with_contact_point(config.contact_point.clone().into());
                if let Some((user, pass)) = transport.credentials() {
                    builder = builder.with_authenticator_provider(Arc::new(
                        StaticPasswordAuthenticatorProvider::new(user, pass),
                    ));
                }
                let cluster_config =
                    builder.build().await.map_err(|e| StorageError::Connection {
                        message: format!("cluster config: {e}"),
                    })?;
                let session =
                    RustlsSessionBuilder::new(RoundRobinLoadBalancingStrategy::new(), cluster_config)
                        .build()
                        .await
                        .map_err(|e| StorageError::Connection {
                            message: format!("session: {e}"),
                        })?;
                Ok(CassandraSession::Tls(session))
            }
            None => {
                info!(contact_point = %config.contact_point, "Connecting to Cassandra");
                let mut builder = NodeTcpConfigBuilder::new()
                    .with_contact_point(config.contact_point.clone().into());
                if let Some((user, pass)) = transport.credentials() {
                    builder = builder.with_authenticator_provider(Arc::new(
                        StaticPasswordAuthenticatorProvider::new(user, pass),
                    ));
                }
                let cluster_config =
                    builder.build().await.map_err(|e| StorageError::Connection {
                        message: format!("cluster config: {e}"),
                    })?;
                let session =
                    TcpSessionBuilder::new(RoundRobinLoadBalancingStrategy::new(), cluster_config)
                        .build()
                        .await
                        .map_err(|e| StorageError::Connection {
                            message: format!("session: {e}"),
                        })?;
                Ok(CassandraSession::Tcp(session))
            }
        }
    }

    /// Runs a plain CQL statement.
    pub async fn query(&self, cql: &str) -> StorageResult<Envelope> {
        let envelope = match self {
            CassandraSession::Tcp(session) => session.query(cql).await?,
            CassandraSession::Tls(session) => session.query(cql).await?,
        };
        Ok(envelope)
    }

    /// Runs a CQL statement with bound values.
    pub async fn query_with_values(
        &self,
        cql: &str,
        values: QueryValues,
    ) -> StorageResult<Envelope> {
        let envelope = match self {
            CassandraSession::Tcp(session) => session.query_with_values(cql, values).await?,
            CassandraSession::Tls(session) => session.query_with_values(cql, values).await?,
        };
        Ok(envelope)
    }
}

impl std::fmt::Debug for CassandraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CassandraSession::Tcp(_) => f.write_str("CassandraSession::Tcp"),
            CassandraSession::Tls(_) => f.write_str("CassandraSession::Tls"),
        }
    }
}
