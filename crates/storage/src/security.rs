//! Secure transport material shared by both client stacks.
//!
//! One trust/identity context is built from environment-supplied material
//! and consumed twice: as a `rustls::ClientConfig` for the binary CQL
//! transport and as a certificate-validation context for the Elasticsearch
//! HTTPS client. Credentials ride along for both.
//!
//! # Environment Variables
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `ELASSANDRA_SSL_TRUSTSTORE` | Path to the CA material (`.der` or PEM bundle) |
//! | `ELASSANDRA_SSL_TRUSTSTOREPASS` | Accepted for parity, ignored for PEM/DER material |
//! | `ELASSANDRA_SSL_KEYSTORE` | Path to the client identity (PEM: cert chain + key) |
//! | `ELASSANDRA_SSL_KEYSTOREPASS` | Accepted for parity, ignored for PEM material |
//! | `ELASSANDRA_SSL_ALLOW_ANY_CERT` | `true` disables certificate AND hostname checks on both stacks |
//! | `ELASSANDRA_AUTH_USERNAME` | Username for both clients |
//! | `ELASSANDRA_AUTH_PASSWORD` | Password for both clients |
//!
//! Absence of `ELASSANDRA_SSL_TRUSTSTORE` disables all custom TLS behavior:
//! both clients run plaintext/default transports.
//!
//! Any failure to load or parse security material is logged and degrades to
//! "no identity / no custom trust"; it never aborts startup.
//!
//! `ELASSANDRA_SSL_ALLOW_ANY_CERT` reproduces the permissive trust strategy
//! of historical deployments as an explicit, documented switch. It is off by
//! default and must stay off outside test benches: with it on, any presented
//! certificate chain is accepted and hostname verification is skipped on the
//! HTTPS side as well. The two relaxations pair; there is no way to enable
//! one without the other.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use base64::{Engine, engine::general_purpose::STANDARD};
use elasticsearch::auth::ClientCertificate;
use elasticsearch::cert::{Certificate, CertificateValidation};
use rustls::client::{ServerCertVerified, ServerCertVerifier};
use tracing::{error, info, warn};

use crate::error::{StorageError, StorageResult};

/// Environment-supplied security parameters. All optional.
#[derive(Debug, Clone, Default)]
pub struct SecuritySettings {
    /// Path to the trust material.
    pub truststore_path: Option<PathBuf>,
    /// Trust-store passphrase (ignored for PEM/DER material).
    pub truststore_pass: Option<String>,
    /// Path to the client identity material.
    pub keystore_path: Option<PathBuf>,
    /// Key-store passphrase (ignored for PEM material).
    pub keystore_pass: Option<String>,
    /// Accept any presented certificate chain and skip hostname checks.
    pub allow_any_cert: bool,
    /// Username for both clients.
    pub username: Option<String>,
    /// Password for both clients.
    pub password: Option<String>,
}

impl SecuritySettings {
    /// Reads the settings from the process environment.
    pub fn from_env() -> Self {
        Self {
            truststore_path: std::env::var_os("ELASSANDRA_SSL_TRUSTSTORE").map(PathBuf::from),
            truststore_pass: std::env::var("ELASSANDRA_SSL_TRUSTSTOREPASS").ok(),
            keystore_path: std::env::var_os("ELASSANDRA_SSL_KEYSTORE").map(PathBuf::from),
            keystore_pass: std::env::var("ELASSANDRA_SSL_KEYSTOREPASS").ok(),
            allow_any_cert: std::env::var("ELASSANDRA_SSL_ALLOW_ANY_CERT")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
            username: std::env::var("ELASSANDRA_AUTH_USERNAME").ok(),
            password: std::env::var("ELASSANDRA_AUTH_PASSWORD").ok(),
        }
    }
}

/// Client identity material: certificate chain plus private key.
struct ClientIdentity {
    /// Raw PEM bytes, kept for the HTTPS client.
    pem: Vec<u8>,
    /// Parsed chain for the CQL client.
    chain: Vec<rustls::Certificate>,
    /// Parsed key for the CQL client.
    key: rustls::PrivateKey,
}

/// The immutable secure-transport context.
///
/// Built once at startup and shared read-only between every subsequent
/// client connection. The trust and identity material is loaded a single
/// time; the two protocol-specific views are derived from it on demand.
pub struct SecureTransport {
    credentials: Option<(String, String)>,
    cassandra_tls: Option<Arc<rustls::ClientConfig>>,
    ca_pem: Option<Vec<u8>>,
    identity_pem: Option<Vec<u8>>,
    allow_any_cert: bool,
    tls_enabled: bool,
}

impl std::fmt::Debug for SecureTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureTransport")
            .field("tls_enabled", &self.tls_enabled)
            .field("allow_any_cert", &self.allow_any_cert)
            .field("has_credentials", &self.credentials.is_some())
            .field("has_identity", &self.identity_pem.is_some())
            .finish()
    }
}

impl SecureTransport {
    /// Builds the context from the process environment.
    pub fn from_env() -> Self {
        Self::build(&SecuritySettings::from_env())
    }

    /// Builds the context from explicit settings.
    ///
    /// This never fails: every load/parse error is logged and the affected
    /// piece of material is dropped, falling back to default trust and no
    /// client identity.
    pub fn build(settings: &SecuritySettings) -> Self {
        let credentials = match (&settings.username, &settings.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };

        let Some(truststore_path) = &settings.truststore_path else {
            // No trust store configured: plaintext, unauthenticated transport.
            return Self {
                credentials,
                cassandra_tls: None,
                ca_pem: None,
                identity_pem: None,
                allow_any_cert: false,
                tls_enabled: false,
            };
        };

        info!(path = %truststore_path.display(), "Loading trust store");
        let trust = match load_trust_material(truststore_path) {
            Ok(trust) => Some(trust),
            Err(e) => {
                error!(path = %truststore_path.display(), error = %e, "Failed to load trust store");
                None
            }
        };

        let identity = settings
            .keystore_path
            .as_deref()
            .filter(|path| path.exists())
            .and_then(|path| match load_client_identity(path) {
                Ok(identity) => {
                    info!(path = %path.display(), "Key store successfully loaded");
                    Some(identity)
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Failed to load key store");
                    None
                }
            });

        if settings.allow_any_cert {
            warn!(
                "ELASSANDRA_SSL_ALLOW_ANY_CERT is enabled: certificate chains are \
                 not verified and HTTPS hostname checks are disabled. Not a \
                 production setting."
            );
        }

        let cassandra_tls = build_rustls_config(
            trust.as_ref().map(|t| t.roots.as_slice()).unwrap_or(&[]),
            identity.as_ref(),
            settings.allow_any_cert,
        );

        Self {
            credentials,
            cassandra_tls: Some(Arc::new(cassandra_tls)),
            ca_pem: trust.map(|t| t.pem),
            identity_pem: identity.map(|i| i.pem),
            allow_any_cert: settings.allow_any_cert,
            tls_enabled: true,
        }
    }

    /// Returns the username/password pair, if configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(u, p)| (u.as_str(), p.as_str()))
    }

    /// Returns the rustls client configuration for the CQL transport, or
    /// `None` when custom TLS is disabled.
    pub fn cassandra_tls(&self) -> Option<Arc<rustls::ClientConfig>> {
        self.cassandra_tls.clone()
    }

    /// Whether a trust store was configured at all.
    pub fn tls_enabled(&self) -> bool {
        self.tls_enabled
    }

    /// Returns the certificate-validation mode for the HTTPS client.
    ///
    /// Pairs with the CQL-side verifier: `allow_any_cert` disables both
    /// certificate and hostname verification, otherwise the loaded CA
    /// bundle performs full validation. Without usable CA material the
    /// client falls back to default system trust.
    pub fn certificate_validation(&self) -> CertificateValidation {
        if !self.tls_enabled {
            return CertificateValidation::Default;
        }
        if self.allow_any_cert {
            return CertificateValidation::None;
        }
        match &self.ca_pem {
            Some(pem) => match Certificate::from_pem(pem) {
                Ok(cert) => CertificateValidation::Full(cert),
                Err(e) => {
                    error!(error = %e, "Failed to build HTTPS CA certificate, using default trust");
                    CertificateValidation::Default
                }
            },
            None => CertificateValidation::Default,
        }
    }

    /// Returns the client identity for the HTTPS client, if configured.
    pub fn client_certificate(&self) -> Option<ClientCertificate> {
        self.identity_pem
            .as_ref()
            .map(|pem| ClientCertificate::Pem(pem.clone()))
    }
}

/// Loaded trust material: raw PEM for the HTTPS side, parsed DER for rustls.
struct TrustMaterial {
    pem: Vec<u8>,
    roots: Vec<rustls::Certificate>,
}

/// Loads CA material, inferring the format from the file extension:
/// `.der` is a single DER-encoded certificate, anything else is treated as
/// a PEM bundle.
fn load_trust_material(path: &Path) -> StorageResult<TrustMaterial> {
    let bytes = std::fs::read(path).map_err(|e| StorageError::Internal {
        message: format!("read {}: {}", path.display(), e),
    })?;

    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("der")) {
        // Re-encode as PEM so the HTTPS client can share the material.
        let pem = der_to_pem(&bytes);
        return Ok(TrustMaterial {
            pem,
            roots: vec![rustls::Certificate(bytes)],
        });
    }

    let certs = rustls_pemfile::certs(&mut &bytes[..]).map_err(|e| StorageError::Internal {
        message: format!("parse PEM bundle {}: {}", path.display(), e),
    })?;
    if certs.is_empty() {
        return Err(StorageError::Internal {
            message: format!("no certificates found in {}", path.display()),
        });
    }
    Ok(TrustMaterial {
        pem: bytes,
        roots: certs.into_iter().map(rustls::Certificate).collect(),
    })
}

/// Wraps a DER certificate in a PEM envelope.
fn der_to_pem(der: &[u8]) -> Vec<u8> {
    use std::fmt::Write as _;

    let encoded = STANDARD.encode(der);
    let mut pem = String::from("-----BEGIN CERTIFICATE-----\n");
    for chunk in encoded.as_bytes().chunks(64) {
        let _ = writeln!(pem, "{}", std::str::from_utf8(chunk).unwrap_or_default());
    }
    pem.push_str("-----END CERTIFICATE-----\n");
    pem.into_bytes()
}

/// Loads a PEM client identity: full certificate chain plus a PKCS#8 or RSA
/// private key. Also scans every certificate and logs a warning for any past
/// its expiry date (observational only).
fn load_client_identity(path: &Path) -> StorageResult<ClientIdentity> {
    let pem = std::fs::read(path).map_err(|e| StorageError::Internal {
        message: format!("read {}: {}", path.display(), e),
    })?;

    let chain: Vec<rustls::Certificate> = rustls_pemfile::certs(&mut &pem[..])
        .map_err(|e| StorageError::Internal {
            message: format!("parse identity certificates: {}", e),
        })?
        .into_iter()
        .map(rustls::Certificate)
        .collect();
    if chain.is_empty() {
        return Err(StorageError::Internal {
            message: format!("no certificate in {}", path.display()),
        });
    }

    warn_expired_certificates(&chain);

    let mut keys = rustls_pemfile::pkcs8_private_keys(&mut &pem[..]).unwrap_or_default();
    if keys.is_empty() {
        keys = rustls_pemfile::rsa_private_keys(&mut &pem[..]).unwrap_or_default();
    }
    let key = keys.into_iter().next().ok_or_else(|| StorageError::Internal {
        message: format!("no private key in {}", path.display()),
    })?;

    Ok(ClientIdentity {
        pem,
        chain,
        key: rustls::PrivateKey(key),
    })
}

/// Logs a warning for every certificate whose notAfter date has passed.
fn warn_expired_certificates(chain: &[rustls::Certificate]) {
    let now = chrono::Utc::now().timestamp();
    for cert in chain {
        match x509_parser::parse_x509_certificate(&cert.0) {
            Ok((_, parsed)) => {
                let not_after = parsed.validity().not_after;
                if not_after.timestamp() < now {
                    warn!(
                        subject = %parsed.subject(),
                        expired = %not_after,
                        "Client certificate is expired"
                    );
                }
            }
            Err(e) => warn!(error = %e, "Could not parse identity certificate for expiry check"),
        }
    }
}

/// Builds the root store for the CQL client.
///
/// When no usable custom material is available the bundled Mozilla roots
/// take over, so a broken trust store degrades to default trust instead of
/// rejecting every server. Permissive mode skips the fallback: its verifier
/// never consults the store.
fn build_root_store(roots: &[rustls::Certificate], allow_any_cert: bool) -> rustls::RootCertStore {
    let mut root_store = rustls::RootCertStore::empty();
    for cert in roots {
        if let Err(e) = root_store.add(cert) {
            warn!(error = %e, "Skipping unusable root certificate");
        }
    }
    if root_store.is_empty() && !allow_any_cert {
        warn!("No usable trust material, falling back to bundled system roots");
        root_store.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|ta| {
            rustls::OwnedTrustAnchor::from_subject_spki_name_constraints(
                ta.subject,
                ta.spki,
                ta.name_constraints,
            )
        }));
    }
    root_store
}

/// Builds the rustls client configuration shared by every CQL connection.
fn build_rustls_config(
    roots: &[rustls::Certificate],
    identity: Option<&ClientIdentity>,
    allow_any_cert: bool,
) -> rustls::ClientConfig {
    let root_store = build_root_store(roots, allow_any_cert);

    let builder = rustls::ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(root_store);

    let mut config = match identity {
        Some(identity) => {
            match builder
                .clone()
                .with_client_auth_cert(identity.chain.clone(), identity.key.clone())
            {
                Ok(config) => config,
                Err(e) => {
                    error!(error = %e, "Rejected client identity, continuing without client auth");
                    builder.with_no_client_auth()
                }
            }
        }
        None => builder.with_no_client_auth(),
    };

    if allow_any_cert {
        config
            .dangerous()
            .set_certificate_verifier(Arc::new(AcceptAnyServerCert));
    }

    config
}

/// Certificate verifier that accepts any presented chain.
///
/// Only installed when `ELASSANDRA_SSL_ALLOW_ANY_CERT` is set.
struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::Certificate,
        _intermediates: &[rustls::Certificate],
        _server_name: &rustls::ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_truststore_disables_everything() {
        let transport = SecureTransport::build(&SecuritySettings::default());
        assert!(!transport.tls_enabled());
        assert!(transport.cassandra_tls().is_none());
        assert!(transport.credentials().is_none());
        assert!(transport.client_certificate().is_none());
        assert!(matches!(
            transport.certificate_validation(),
            CertificateValidation::Default
        ));
    }

    #[test]
    fn test_credentials_without_tls() {
        let settings = SecuritySettings {
            username: Some("cassandra".into()),
            password: Some("secret".into()),
            ..Default::default()
        };
        let transport = SecureTransport::build(&settings);
        assert_eq!(transport.credentials(), Some(("cassandra", "secret")));
        assert!(!transport.tls_enabled());
    }

    #[test]
    fn test_username_without_password_is_ignored() {
        let settings = SecuritySettings {
            username: Some("cassandra".into()),
            ..Default::default()
        };
        let transport = SecureTransport::build(&settings);
        assert!(transport.credentials().is_none());
    }

    #[test]
    fn test_missing_truststore_file_degrades() {
        let settings = SecuritySettings {
            truststore_path: Some(PathBuf::from("/does/not/exist.pem")),
            ..Default::default()
        };
        let transport = SecureTransport::build(&settings);
        // TLS stays on; the bundled roots stand in for the broken store.
        assert!(transport.tls_enabled());
        assert!(transport.cassandra_tls().is_some());
        assert!(matches!(
            transport.certificate_validation(),
            CertificateValidation::Default
        ));
    }

    #[test]
    fn test_garbage_truststore_degrades() {
        let dir = std::env::temp_dir();
        let path = dir.join("basketapp-garbage-trust.pem");
        std::fs::write(&path, b"this is not a certificate").unwrap();

        let settings = SecuritySettings {
            truststore_path: Some(path.clone()),
            ..Default::default()
        };
        let transport = SecureTransport::build(&settings);
        assert!(transport.tls_enabled());
        assert!(matches!(
            transport.certificate_validation(),
            CertificateValidation::Default
        ));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_allow_any_cert_pairs_both_relaxations() {
        let settings = SecuritySettings {
            truststore_path: Some(PathBuf::from("/does/not/exist.pem")),
            allow_any_cert: true,
            ..Default::default()
        };
        let transport = SecureTransport::build(&settings);
        assert!(transport.cassandra_tls().is_some());
        assert!(matches!(
            transport.certificate_validation(),
            CertificateValidation::None
        ));
    }

    #[test]
    fn test_der_to_pem_produces_a_certificate_envelope() {
        let pem = der_to_pem(b"foobar");
        let text = std::str::from_utf8(&pem).unwrap();
        assert!(text.starts_with("-----BEGIN CERTIFICATE-----\n"));
        assert!(text.ends_with("-----END CERTIFICATE-----\n"));
        assert!(text.contains("Zm9vYmFy"));
    }

    #[test]
    fn test_empty_root_store_falls_back_to_bundled_roots() {
        let store = build_root_store(&[], false);
        assert!(!store.is_empty());
    }

    #[test]
    fn test_permissive_mode_skips_the_root_fallback() {
        let store = build_root_store(&[], true);
        assert!(store.is_empty());
    }
}
