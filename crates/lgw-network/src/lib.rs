//! Network connection for LedgerGateway.
//!
//! Opens a link to a ledger peer using a [`ConnectionProfile`] and an
//! identity, then binds it to a channel and a contract. The result is a
//! [`Session`], which the transaction invoker uses for every call.
//!
//! Connecting walks the profile's peers in listed order, failing over only
//! on [`NetworkError::Unreachable`]. Each later step (handshake, discovery,
//! contract resolution) has its own error kind so callers can tell a
//! transient network problem from a configuration bug.

pub mod error;
pub mod gateway;
pub mod options;
pub mod profile;
pub mod session;
pub mod tcp;
pub mod tls;
pub mod transport;

pub use error::{NetworkError, NetworkResult};
pub use gateway::Gateway;
pub use options::ConnectOptions;
pub use profile::{ConnectionProfile, EndpointConfig, TlsMaterial};
pub use session::Session;
pub use tcp::{TcpDialer, TcpLink};
pub use transport::{Dialer, LedgerLink, PeerClient};
