use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::debug;

use lgw_network::{Dialer, EndpointConfig, LedgerLink, NetworkError, NetworkResult};
use lgw_protocol::GatewayMessage;

use crate::ledger::{Connection, DevNetwork};

/// Dials a [`DevNetwork`] in process, without sockets.
///
/// Honors the `unreachable` and `hanging` fault lists by endpoint address.
#[derive(Clone)]
pub struct DevnetDialer {
    network: DevNetwork,
}

impl DevnetDialer {
    pub fn new(network: DevNetwork) -> Self {
        Self { network }
    }
}

#[async_trait]
impl Dialer for DevnetDialer {
    async fn dial(&self, endpoint: &EndpointConfig) -> NetworkResult<Arc<dyn LedgerLink>> {
        let faults = &self.network.config().faults;
        if faults.unreachable.contains(&endpoint.address) {
            return Err(NetworkError::Unreachable {
                endpoint: endpoint.describe(),
                reason: "connection refused".into(),
            });
        }
        if faults.hanging.contains(&endpoint.address) {
            debug!(endpoint = %endpoint.describe(), "dial will never complete");
            return std::future::pending().await;
        }
        Ok(Arc::new(LocalLink::new(
            self.network.clone(),
            endpoint.describe(),
        )))
    }
}

/// An in-process link to a [`DevNetwork`].
pub struct LocalLink {
    endpoint: String,
    network: DevNetwork,
    conn: Connection,
    closed: AtomicBool,
    shutdown: Notify,
}

impl LocalLink {
    pub fn new(network: DevNetwork, endpoint: String) -> Self {
        Self {
            endpoint,
            network,
            conn: Connection::new(),
            closed: AtomicBool::new(false),
            shutdown: Notify::new(),
        }
    }
}

#[async_trait]
impl LedgerLink for LocalLink {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, message: GatewayMessage) -> NetworkResult<GatewayMessage> {
        let shutdown = self.shutdown.notified();
        tokio::pin!(shutdown);
        shutdown.as_mut().enable();
        if self.closed.load(Ordering::SeqCst) {
            return Err(NetworkError::Closed);
        }
        tokio::select! {
            reply = self.network.handle(&self.conn, message) => Ok(reply),
            _ = shutdown => Err(NetworkError::Closed),
        }
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.shutdown.notify_waiters();
            debug!(endpoint = %self.endpoint, "local link closed");
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
