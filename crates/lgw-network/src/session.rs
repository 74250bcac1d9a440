use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lgw_protocol::DiscoveredEndpoint;
use lgw_types::Creator;
use tracing::info;

use crate::error::{NetworkError, NetworkResult};
use crate::options::ConnectOptions;
use crate::transport::{LedgerLink, PeerClient};

/// An open connection bound to one identity, channel and contract.
///
/// Safe to share across tasks; concurrent calls over one session are
/// allowed. Closing is idempotent and also happens on drop. Once closed,
/// every call fails with [`NetworkError::Closed`].
pub struct Session {
    link: Arc<dyn LedgerLink>,
    creator: Creator,
    channel: String,
    contract: String,
    peer_name: String,
    discovered: Vec<DiscoveredEndpoint>,
    options: ConnectOptions,
    closed: AtomicBool,
}

impl Session {
    pub(crate) fn new(
        link: Arc<dyn LedgerLink>,
        creator: Creator,
        channel: String,
        contract: String,
        peer_name: String,
        discovered: Vec<DiscoveredEndpoint>,
        options: ConnectOptions,
    ) -> Self {
        Self {
            link,
            creator,
            channel,
            contract,
            peer_name,
            discovered,
            options,
            closed: AtomicBool::new(false),
        }
    }

    /// Typed access to the peer, unless the session was closed.
    pub fn peer(&self) -> NetworkResult<PeerClient<'_>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(NetworkError::Closed);
        }
        Ok(PeerClient::new(self.link.as_ref()))
    }

    pub fn creator(&self) -> &Creator {
        &self.creator
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn contract(&self) -> &str {
        &self.contract
    }

    /// Name the gateway peer reported during the handshake.
    pub fn peer_name(&self) -> &str {
        &self.peer_name
    }

    /// `name (address)` of the endpoint this session is connected to.
    pub fn endpoint(&self) -> &str {
        self.link.endpoint()
    }

    /// Channel members reported by discovery, after any localhost rewrite.
    pub fn discovered(&self) -> &[DiscoveredEndpoint] {
        &self.discovered
    }

    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.link.close();
        info!(
            endpoint = %self.link.endpoint(),
            channel = %self.channel,
            contract = %self.contract,
            "session closed"
        );
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.link.endpoint())
            .field("msp_id", &self.creator.msp_id)
            .field("channel", &self.channel)
            .field("contract", &self.contract)
            .field("closed", &self.is_closed())
            .finish()
    }
}
