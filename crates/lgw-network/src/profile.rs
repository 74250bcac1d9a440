use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use lgw_protocol::EndpointRole;

use crate::error::{NetworkError, NetworkResult};

/// Trust material for a TLS endpoint.
///
/// Exactly one of `ca_cert_path` and `ca_cert_pem` is set in a profile
/// file. Loading a profile through [`ConnectionProfile::from_file`]
/// resolves the path and inlines the PEM.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsMaterial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert_pem: Option<String>,
    /// Name to verify the server certificate against instead of the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name_override: Option<String>,
}

impl TlsMaterial {
    pub fn from_pem(pem: impl Into<String>) -> Self {
        Self {
            ca_cert_pem: Some(pem.into()),
            ..Default::default()
        }
    }

    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name_override = Some(name.into());
        self
    }
}

/// One network endpoint listed in a profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointConfig {
    pub name: String,
    /// `host:port`.
    pub address: String,
    #[serde(default = "default_role")]
    pub role: EndpointRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsMaterial>,
}

fn default_role() -> EndpointRole {
    EndpointRole::Peer
}

impl EndpointConfig {
    pub fn peer(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            role: EndpointRole::Peer,
            tls: None,
        }
    }

    pub fn with_tls(mut self, tls: TlsMaterial) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Host part of `address`, without IPv6 brackets.
    pub fn host(&self) -> &str {
        split_host(&self.address)
    }

    /// `name (address)` for logs and error messages.
    pub fn describe(&self) -> String {
        format!("{} ({})", self.name, self.address)
    }
}

pub(crate) fn split_host(address: &str) -> &str {
    let host = match address.rfind(':') {
        Some(idx) if !address[idx + 1..].contains(']') => &address[..idx],
        _ => address,
    };
    host.trim_start_matches('[').trim_end_matches(']')
}

/// Port part of `address`, if any.
pub(crate) fn split_port(address: &str) -> Option<&str> {
    let idx = address.rfind(':')?;
    let port = &address[idx + 1..];
    (!port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())).then_some(port)
}

/// Static description of how to reach a network and what to talk to.
///
/// Read-only once loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionProfile {
    pub name: String,
    pub channel: String,
    pub contract: String,
    pub endpoints: Vec<EndpointConfig>,
}

impl ConnectionProfile {
    /// Load a profile from a `.json` or `.toml` file.
    ///
    /// Relative `caCertPath` entries are resolved against the profile's
    /// directory and their contents inlined.
    pub fn from_file(path: &Path) -> NetworkResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            NetworkError::InvalidProfile(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut profile: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&text)
                .map_err(|e| NetworkError::InvalidProfile(format!("{}: {e}", path.display())))?,
            Some("json") => serde_json::from_str(&text)
                .map_err(|e| NetworkError::InvalidProfile(format!("{}: {e}", path.display())))?,
            _ => {
                return Err(NetworkError::InvalidProfile(format!(
                    "{}: expected a .json or .toml file",
                    path.display()
                )))
            }
        };
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        profile.inline_tls(base)?;
        profile.validate()?;
        Ok(profile)
    }

    fn inline_tls(&mut self, base: &Path) -> NetworkResult<()> {
        for endpoint in &mut self.endpoints {
            let Some(tls) = endpoint.tls.as_mut() else {
                continue;
            };
            if tls.ca_cert_pem.is_some() {
                continue;
            }
            if let Some(rel) = &tls.ca_cert_path {
                let full = base.join(rel);
                let pem = fs::read_to_string(&full).map_err(|e| {
                    NetworkError::InvalidProfile(format!(
                        "endpoint {}: cannot read CA certificate {}: {e}",
                        endpoint.name,
                        full.display()
                    ))
                })?;
                tls.ca_cert_pem = Some(pem);
            }
        }
        Ok(())
    }

    /// Check the profile is usable for connecting.
    pub fn validate(&self) -> NetworkResult<()> {
        if self.channel.trim().is_empty() {
            return Err(NetworkError::InvalidProfile("channel is empty".into()));
        }
        if self.contract.trim().is_empty() {
            return Err(NetworkError::InvalidProfile("contract is empty".into()));
        }
        if self.endpoints.is_empty() {
            return Err(NetworkError::InvalidProfile("profile lists no endpoints".into()));
        }
        for endpoint in &self.endpoints {
            if endpoint.host().is_empty() || split_port(&endpoint.address).is_none() {
                return Err(NetworkError::InvalidProfile(format!(
                    "endpoint {}: address {:?} is not host:port",
                    endpoint.name, endpoint.address
                )));
            }
            if let Some(tls) = &endpoint.tls {
                if tls.ca_cert_pem.is_none() {
                    return Err(NetworkError::InvalidProfile(format!(
                        "endpoint {}: TLS enabled without a CA certificate",
                        endpoint.name
                    )));
                }
            }
        }
        Ok(())
    }
}
