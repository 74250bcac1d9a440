use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};

use crate::error::{NetworkError, NetworkResult};
use crate::profile::EndpointConfig;

/// Client configuration trusting only the CA certificates in `ca_pem`.
pub fn client_config(ca_pem: &str) -> NetworkResult<Arc<ClientConfig>> {
    let mut roots = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut ca_pem.as_bytes()) {
        let cert = cert
            .map_err(|e| NetworkError::InvalidProfile(format!("unreadable CA certificate: {e}")))?;
        roots
            .add(cert)
            .map_err(|e| NetworkError::InvalidProfile(format!("rejected CA certificate: {e}")))?;
    }
    if roots.is_empty() {
        return Err(NetworkError::InvalidProfile(
            "CA bundle contains no certificates".into(),
        ));
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| NetworkError::InvalidProfile(format!("TLS setup: {e}")))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(config))
}

/// Name the server certificate is verified against: the override if set,
/// otherwise the endpoint's host.
pub fn server_name(endpoint: &EndpointConfig) -> NetworkResult<ServerName<'static>> {
    let name = endpoint
        .tls
        .as_ref()
        .and_then(|t| t.server_name_override.clone())
        .unwrap_or_else(|| endpoint.host().to_string());
    ServerName::try_from(name.clone()).map_err(|_| {
        NetworkError::InvalidProfile(format!(
            "endpoint {}: {name:?} is not a valid TLS server name",
            endpoint.name
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::TlsMaterial;

    #[test]
    fn accepts_generated_ca() {
        let cert = rcgen::generate_simple_self_signed(vec!["localhost".into()]).unwrap();
        client_config(&cert.cert.pem()).unwrap();
    }

    #[test]
    fn rejects_empty_bundle() {
        assert!(matches!(
            client_config("not a certificate"),
            Err(NetworkError::InvalidProfile(_))
        ));
    }

    #[test]
    fn server_name_prefers_override() {
        let plain = EndpointConfig::peer("peer0", "10.0.0.5:7051")
            .with_tls(TlsMaterial::from_pem("pem"));
        assert_eq!(server_name(&plain).unwrap().to_str(), "10.0.0.5");

        let overridden = EndpointConfig::peer("peer0", "localhost:7051")
            .with_tls(TlsMaterial::from_pem("pem").with_server_name("peer0.org1.example.com"));
        assert_eq!(
            server_name(&overridden).unwrap().to_str(),
            "peer0.org1.example.com"
        );
    }
}
