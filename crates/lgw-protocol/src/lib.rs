//! Wire protocol between a LedgerGateway client and a ledger peer.
//!
//! Defines the proposal and endorsement types, the request/response message
//! set, and the length-prefixed framing used on a ledger link. Every frame
//! carries a request id so one connection can multiplex concurrent calls.

pub mod codec;
pub mod error;
pub mod message;
pub mod proposal;

pub use codec::{read_frame, write_frame, Frame, GatewayCodec};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{ErrorCode, GatewayMessage, MAX_MESSAGE_SIZE, PROTOCOL_VERSION};
pub use proposal::{
    CommitStatus, DiscoveredEndpoint, Endorsement, EndpointRole, Proposal, ValidationCode,
};
