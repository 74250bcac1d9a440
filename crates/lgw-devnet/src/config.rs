use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DevnetError, DevnetResult};

/// What the ordering service does with an endorsed transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderingFault {
    #[default]
    None,
    /// Refuse the transaction. Nothing is ordered.
    Reject,
    /// Order and commit the transaction, then report a failure anyway.
    FailAfterOrdering,
}

/// Fault injection switches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultConfig {
    /// Endpoint addresses that refuse connections.
    pub unreachable: Vec<String>,
    /// Endpoint addresses that accept the dial but never answer it.
    pub hanging: Vec<String>,
    /// MSP ids whose creators are turned away at the handshake.
    pub rejected_msps: Vec<String>,
    /// One endorsing peer returns a different result than the others.
    pub divergent_endorser: bool,
    pub ordering: OrderingFault,
    pub ordering_delay: Duration,
    pub commit_delay: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevnetConfig {
    pub bind_addr: SocketAddr,
    pub tls: Option<TlsConfig>,
    pub channel: String,
    /// Contract names served by the asset contract.
    pub contracts: Vec<String>,
    /// MSP ids allowed to connect. Empty allows every MSP.
    pub allowed_msps: Vec<String>,
    pub endorsing_peers: usize,
    /// Longest a commit-status request waits before answering unknown.
    pub max_commit_wait: Duration,
    pub faults: FaultConfig,
}

impl Default for DevnetConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 7051)),
            tls: None,
            channel: "mychannel".into(),
            contracts: vec!["basic".into()],
            allowed_msps: vec!["Org1MSP".into()],
            endorsing_peers: 2,
            max_commit_wait: Duration::from_secs(60),
            faults: FaultConfig::default(),
        }
    }
}

impl DevnetConfig {
    pub fn from_file(path: &Path) -> DevnetResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| DevnetError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DevnetResult<()> {
        if self.channel.is_empty() {
            return Err(DevnetError::Config("channel is empty".into()));
        }
        if self.contracts.is_empty() {
            return Err(DevnetError::Config("no contracts configured".into()));
        }
        if self.endorsing_peers == 0 {
            return Err(DevnetError::Config(
                "at least one endorsing peer is required".into(),
            ));
        }
        Ok(())
    }

    pub fn with_faults(mut self, faults: FaultConfig) -> Self {
        self.faults = faults;
        self
    }

    /// Names of the simulated endorsing peers.
    pub fn peer_names(&self) -> Vec<String> {
        (0..self.endorsing_peers)
            .map(|i| format!("peer{i}.org1.example.com"))
            .collect()
    }
}
