//! Trust-all TLS context for the hostname-verification bypass.
//!
//! # Warning
//!
//! Everything in this module disables certificate and hostname checks. A
//! connection made with it is open to man-in-the-middle attacks. It exists
//! for test rigs and self-signed development servers, and is only used when
//! `ClientConfig::ignore_hostname_verification` is set explicitly.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, SignatureScheme};

use crate::error::{Error, Result};

/// A certificate verifier that accepts every chain for every server name.
#[derive(Debug)]
pub struct TrustAllVerifier {
    schemes: Vec<SignatureScheme>,
}

impl TrustAllVerifier {
    /// Create a verifier advertising the given signature schemes.
    pub fn new(schemes: Vec<SignatureScheme>) -> Self {
        Self { schemes }
    }
}

impl ServerCertVerifier for TrustAllVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.schemes.clone()
    }
}

/// Build a rustls client configuration that trusts every server.
///
/// Fails with a client configuration error if the crypto provider cannot
/// supply the default protocol versions.
pub fn trust_all_client_config() -> Result<ClientConfig> {
    let provider = rustls::crypto::ring::default_provider();
    let schemes = provider.signature_verification_algorithms.supported_schemes();

    let config = ClientConfig::builder_with_provider(Arc::new(provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::ClientConfiguration(format!("failed to build TLS context: {e}")))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(TrustAllVerifier::new(schemes)))
        .with_no_client_auth();

    tracing::warn!(
        target: "script_http::tls",
        "Certificate and hostname verification disabled for this request"
    );
    Ok(config)
}
