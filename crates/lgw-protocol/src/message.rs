use std::fmt;

use serde::{Deserialize, Serialize};

use lgw_types::{Creator, TransactionId};

use crate::proposal::{CommitStatus, DiscoveredEndpoint, Endorsement, Proposal};

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Failure category reported by a ledger peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The creator's MSP or certificate is not accepted.
    AuthenticationRejected,
    /// The channel does not exist or the creator is not a member.
    ChannelNotFound,
    /// No contract with that name is deployed on the channel.
    ContractNotFound,
    /// The contract function returned an error.
    ContractError,
    /// Endorsing peers rejected or disagreed on the proposal.
    EndorsementFailed,
    /// The ordering service did not accept the endorsed transaction.
    OrderingFailed,
    UnsupportedVersion,
    BadRequest,
    Internal,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// All message types on a ledger link.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GatewayMessage {
    Hello { version: u32, creator: Creator },
    HelloAck { version: u32, peer: String },
    DiscoverRequest { channel: String },
    DiscoverResponse { endpoints: Vec<DiscoveredEndpoint> },
    ContractRequest { channel: String, contract: String },
    ContractResponse { contract: String },
    EvaluateRequest { proposal: Proposal },
    EvaluateResponse { payload: Vec<u8> },
    EndorseRequest { proposal: Proposal },
    EndorseResponse { endorsement: Endorsement },
    OrderRequest { endorsement: Endorsement },
    OrderResponse { tx_id: TransactionId },
    CommitStatusRequest { channel: String, tx_id: TransactionId, wait: bool },
    CommitStatusResponse { tx_id: TransactionId, status: CommitStatus },
    Error { code: ErrorCode, message: String },
}

impl GatewayMessage {
    pub fn type_tag(&self) -> u8 {
        match self {
            Self::Hello { .. } => 1,
            Self::HelloAck { .. } => 2,
            Self::DiscoverRequest { .. } => 3,
            Self::DiscoverResponse { .. } => 4,
            Self::ContractRequest { .. } => 5,
            Self::ContractResponse { .. } => 6,
            Self::EvaluateRequest { .. } => 7,
            Self::EvaluateResponse { .. } => 8,
            Self::EndorseRequest { .. } => 9,
            Self::EndorseResponse { .. } => 10,
            Self::OrderRequest { .. } => 11,
            Self::OrderResponse { .. } => 12,
            Self::CommitStatusRequest { .. } => 13,
            Self::CommitStatusResponse { .. } => 14,
            Self::Error { .. } => 255,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "Hello",
            Self::HelloAck { .. } => "HelloAck",
            Self::DiscoverRequest { .. } => "DiscoverRequest",
            Self::DiscoverResponse { .. } => "DiscoverResponse",
            Self::ContractRequest { .. } => "ContractRequest",
            Self::ContractResponse { .. } => "ContractResponse",
            Self::EvaluateRequest { .. } => "EvaluateRequest",
            Self::EvaluateResponse { .. } => "EvaluateResponse",
            Self::EndorseRequest { .. } => "EndorseRequest",
            Self::EndorseResponse { .. } => "EndorseResponse",
            Self::OrderRequest { .. } => "OrderRequest",
            Self::OrderResponse { .. } => "OrderResponse",
            Self::CommitStatusRequest { .. } => "CommitStatusRequest",
            Self::CommitStatusResponse { .. } => "CommitStatusResponse",
            Self::Error { .. } => "Error",
        }
    }

    /// Whether this message is sent by the client side of a link.
    pub fn is_request(&self) -> bool {
        matches!(
            self,
            Self::Hello { .. }
                | Self::DiscoverRequest { .. }
                | Self::ContractRequest { .. }
                | Self::EvaluateRequest { .. }
                | Self::EndorseRequest { .. }
                | Self::OrderRequest { .. }
                | Self::CommitStatusRequest { .. }
        )
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }
}
