use std::sync::Arc;

use async_trait::async_trait;
use lgw_protocol::{
    CommitStatus, DiscoveredEndpoint, Endorsement, ErrorCode, GatewayMessage, ProtocolError,
    Proposal, PROTOCOL_VERSION,
};
use lgw_types::{Creator, TransactionId};

use crate::error::{NetworkError, NetworkResult};
use crate::profile::EndpointConfig;

/// An open, request/response connection to one ledger peer.
///
/// Implementations must allow concurrent `request` calls. A request whose
/// caller stops waiting must not disturb the others.
#[async_trait]
pub trait LedgerLink: Send + Sync {
    /// `name (address)` of the remote end.
    fn endpoint(&self) -> &str;

    async fn request(&self, message: GatewayMessage) -> NetworkResult<GatewayMessage>;

    /// Release the connection. Idempotent. Outstanding requests fail with
    /// [`NetworkError::Closed`].
    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Opens links to endpoints.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Connect to `endpoint`. Failures to reach it at all must be reported
    /// as [`NetworkError::Unreachable`] so the caller can fail over.
    async fn dial(&self, endpoint: &EndpointConfig) -> NetworkResult<Arc<dyn LedgerLink>>;
}

/// Typed calls over a [`LedgerLink`].
pub struct PeerClient<'a> {
    link: &'a dyn LedgerLink,
}

impl<'a> PeerClient<'a> {
    pub fn new(link: &'a dyn LedgerLink) -> Self {
        Self { link }
    }

    /// Present the creator and agree on the protocol version.
    /// Returns the peer's name.
    pub async fn handshake(&self, creator: &Creator) -> NetworkResult<String> {
        let reply = self
            .link
            .request(GatewayMessage::Hello {
                version: PROTOCOL_VERSION,
                creator: creator.clone(),
            })
            .await?;
        match reply {
            GatewayMessage::HelloAck { version, peer } => {
                if version != PROTOCOL_VERSION {
                    return Err(ProtocolError::VersionMismatch {
                        local: PROTOCOL_VERSION,
                        remote: version,
                    }
                    .into());
                }
                Ok(peer)
            }
            other => Err(unexpected("HelloAck", other)),
        }
    }

    pub async fn discover(&self, channel: &str) -> NetworkResult<Vec<DiscoveredEndpoint>> {
        let reply = self
            .link
            .request(GatewayMessage::DiscoverRequest {
                channel: channel.to_string(),
            })
            .await?;
        match reply {
            GatewayMessage::DiscoverResponse { endpoints } => Ok(endpoints),
            other => Err(unexpected("DiscoverResponse", other)),
        }
    }

    pub async fn resolve_contract(&self, channel: &str, contract: &str) -> NetworkResult<()> {
        let reply = self
            .link
            .request(GatewayMessage::ContractRequest {
                channel: channel.to_string(),
                contract: contract.to_string(),
            })
            .await?;
        match reply {
            GatewayMessage::ContractResponse { .. } => Ok(()),
            GatewayMessage::Error {
                code: ErrorCode::ContractNotFound,
                ..
            } => Err(NetworkError::ContractNotFound {
                channel: channel.to_string(),
                contract: contract.to_string(),
            }),
            other => Err(unexpected("ContractResponse", other)),
        }
    }

    pub async fn evaluate(&self, proposal: &Proposal) -> NetworkResult<Vec<u8>> {
        let reply = self
            .link
            .request(GatewayMessage::EvaluateRequest {
                proposal: proposal.clone(),
            })
            .await?;
        match reply {
            GatewayMessage::EvaluateResponse { payload } => Ok(payload),
            other => Err(unexpected("EvaluateResponse", other)),
        }
    }

    pub async fn endorse(&self, proposal: &Proposal) -> NetworkResult<Endorsement> {
        let reply = self
            .link
            .request(GatewayMessage::EndorseRequest {
                proposal: proposal.clone(),
            })
            .await?;
        match reply {
            GatewayMessage::EndorseResponse { endorsement } => Ok(endorsement),
            other => Err(unexpected("EndorseResponse", other)),
        }
    }

    pub async fn order(&self, endorsement: &Endorsement) -> NetworkResult<()> {
        let reply = self
            .link
            .request(GatewayMessage::OrderRequest {
                endorsement: endorsement.clone(),
            })
            .await?;
        match reply {
            GatewayMessage::OrderResponse { tx_id } if tx_id == endorsement.tx_id => Ok(()),
            GatewayMessage::OrderResponse { tx_id } => Err(NetworkError::Remote {
                code: ErrorCode::Internal,
                message: format!(
                    "ordering acknowledged {}, expected {}",
                    tx_id.short_id(),
                    endorsement.tx_id.short_id()
                ),
            }),
            other => Err(unexpected("OrderResponse", other)),
        }
    }

    /// Ask for the commit status of `tx_id`. With `wait`, the peer holds
    /// the reply until the transaction lands in a block.
    pub async fn commit_status(
        &self,
        channel: &str,
        tx_id: &TransactionId,
        wait: bool,
    ) -> NetworkResult<CommitStatus> {
        let reply = self
            .link
            .request(GatewayMessage::CommitStatusRequest {
                channel: channel.to_string(),
                tx_id: *tx_id,
                wait,
            })
            .await?;
        match reply {
            GatewayMessage::CommitStatusResponse { status, .. } => Ok(status),
            other => Err(unexpected("CommitStatusResponse", other)),
        }
    }
}

/// Map an unexpected reply. Peer errors keep their code.
fn unexpected(expected: &'static str, got: GatewayMessage) -> NetworkError {
    match got {
        GatewayMessage::Error { code, message } => match code {
            ErrorCode::AuthenticationRejected => NetworkError::AuthenticationRejected(message),
            ErrorCode::ChannelNotFound => NetworkError::ChannelNotFound(message),
            code => NetworkError::Remote { code, message },
        },
        other => ProtocolError::UnexpectedResponse {
            expected,
            got: other.type_name(),
        }
        .into(),
    }
}
