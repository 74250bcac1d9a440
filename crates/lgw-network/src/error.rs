use thiserror::Error;

use lgw_protocol::{ErrorCode, ProtocolError};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("unreachable: {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("TLS handshake with {endpoint} failed: {reason}")]
    TlsHandshakeFailed { endpoint: String, reason: String },

    #[error("authentication rejected: {0}")]
    AuthenticationRejected(String),

    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    #[error("contract {contract} not found on channel {channel}")]
    ContractNotFound { channel: String, contract: String },

    #[error("peer error {code}: {message}")]
    Remote { code: ErrorCode, message: String },

    #[error("session closed")]
    Closed,

    #[error("invalid connection profile: {0}")]
    InvalidProfile(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NetworkError {
    /// Whether retrying the same operation later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Closed)
    }
}

pub type NetworkResult<T> = Result<T, NetworkError>;
