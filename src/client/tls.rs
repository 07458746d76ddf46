//! Client-side TLS trust policy.
//!
//! # Responsibilities
//! - Build a rustls client config from an optional CA certificate file
//! - CA configured: mandatory verification against that CA, hostname checked
//! - CA absent: verification fully disabled for self-signed deployments
//!
//! # Design Decisions
//! - The two modes are explicit and never silently upgraded or downgraded
//! - Unverified mode uses a custom verifier that accepts any certificate;
//!   the TLS session is still encrypted, only trust is skipped

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::client::ClientError;

/// How the client decides whether to trust an agent's certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustPolicy {
    /// Verify the chain against the CA bundle at this path, check hostname.
    Verified(PathBuf),
    /// No certificate validation, no hostname check.
    Unverified,
}

impl TrustPolicy {
    pub fn from_ca_file(ca_cert_file: Option<&Path>) -> Self {
        match ca_cert_file {
            Some(path) => TrustPolicy::Verified(path.to_path_buf()),
            None => TrustPolicy::Unverified,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, TrustPolicy::Verified(_))
    }

    /// Build the TLS connector implementing this policy.
    pub fn build_connector(&self) -> Result<TlsConnector, ClientError> {
        ensure_crypto_provider();

        let config = match self {
            TrustPolicy::Verified(ca_path) => {
                let roots = load_ca_roots(ca_path)?;
                ClientConfig::builder()
                    .with_root_certificates(roots)
                    .with_no_client_auth()
            }
            TrustPolicy::Unverified => ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(AcceptAnyServerCert::new())
                .with_no_client_auth(),
        };

        Ok(TlsConnector::from(Arc::new(config)))
    }
}

impl std::fmt::Display for TrustPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrustPolicy::Verified(_) => f.write_str("verified"),
            TrustPolicy::Unverified => f.write_str("unverified"),
        }
    }
}

fn ensure_crypto_provider() {
    // Idempotent; install may lose the race to another caller, which is fine.
    let _ = rustls::crypto::ring::default_provider().install_default();
}

fn load_ca_roots(path: &Path) -> Result<RootCertStore, ClientError> {
    let file = File::open(path).map_err(|e| {
        ClientError::Connection(format!("cannot read CA certificate {}: {e}", path.display()))
    })?;
    let mut reader = BufReader::new(file);

    let mut roots = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut reader) {
        let cert = cert.map_err(|e| {
            ClientError::Connection(format!("bad PEM in {}: {e}", path.display()))
        })?;
        roots.add(cert).map_err(|e| {
            ClientError::Connection(format!("rejected CA certificate in {}: {e}", path.display()))
        })?;
    }
    if roots.is_empty() {
        return Err(ClientError::Connection(format!(
            "no certificates found in {}",
            path.display()
        )));
    }
    Ok(roots)
}

/// Verifier that accepts any server certificate.
///
/// Used only in unverified mode, for agents running self-signed certificates.
#[derive(Debug)]
struct AcceptAnyServerCert;

impl AcceptAnyServerCert {
    fn new() -> Arc<Self> {
        Arc::new(Self)
    }
}

impl rustls::client::danger::ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        use rustls::SignatureScheme;
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::ED25519,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_ca_file() {
        assert_eq!(
            TrustPolicy::from_ca_file(Some(Path::new("/etc/ssl/agent-ca.pem"))),
            TrustPolicy::Verified(PathBuf::from("/etc/ssl/agent-ca.pem"))
        );
        assert_eq!(TrustPolicy::from_ca_file(None), TrustPolicy::Unverified);
    }

    #[test]
    fn test_verified_and_unverified_differ() {
        let verified = TrustPolicy::from_ca_file(Some(Path::new("/tmp/ca.pem")));
        let unverified = TrustPolicy::from_ca_file(None);
        assert!(verified.is_verified());
        assert!(!unverified.is_verified());
        assert_ne!(verified, unverified);
    }

    #[test]
    fn test_unverified_connector_builds() {
        assert!(TrustPolicy::Unverified.build_connector().is_ok());
    }

    #[test]
    fn test_verified_connector_requires_readable_ca() {
        let policy = TrustPolicy::Verified(PathBuf::from("/nonexistent/ca.pem"));
        assert!(matches!(
            policy.build_connector(),
            Err(ClientError::Connection(_))
        ));
    }
}
