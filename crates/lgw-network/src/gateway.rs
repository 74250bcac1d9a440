use std::future::Future;
use std::sync::Arc;

use tokio::time::{timeout, timeout_at, Instant};
use tracing::{debug, info, warn};

use lgw_protocol::DiscoveredEndpoint;
use lgw_types::X509Identity;

use crate::error::{NetworkError, NetworkResult};
use crate::options::ConnectOptions;
use crate::profile::{split_port, ConnectionProfile};
use crate::session::Session;
use crate::tcp::TcpDialer;
use crate::transport::{Dialer, LedgerLink, PeerClient};

/// Opens [`Session`]s.
#[derive(Clone)]
pub struct Gateway {
    dialer: Arc<dyn Dialer>,
}

impl Gateway {
    pub fn new(dialer: Arc<dyn Dialer>) -> Self {
        Self { dialer }
    }

    /// A gateway dialing real TCP/TLS endpoints.
    pub fn tcp() -> Self {
        Self::new(Arc::new(TcpDialer))
    }

    /// Connect to the network described by `profile` as `identity`.
    ///
    /// Endpoints are dialed in listed order; only an unreachable endpoint
    /// moves on to the next one. The whole sequence is bounded by
    /// `options.connect_timeout`, and running out of time is reported as
    /// [`NetworkError::Unreachable`]. On any failure the half-open link is
    /// released before returning.
    pub async fn connect(
        &self,
        profile: &ConnectionProfile,
        identity: &X509Identity,
        options: ConnectOptions,
    ) -> NetworkResult<Session> {
        profile.validate()?;
        let deadline = Instant::now() + options.connect_timeout;
        let creator = identity.creator();

        let guard = LinkGuard::new(self.dial_in_order(profile, &options, deadline).await?);
        let link = guard.link();
        let endpoint = link.endpoint().to_string();
        let peer = PeerClient::new(link);

        let peer_name = within(deadline, &endpoint, "handshake", peer.handshake(&creator)).await?;
        debug!(%endpoint, peer = %peer_name, msp_id = %creator.msp_id, "handshake complete");

        let mut discovered = within(
            deadline,
            &endpoint,
            "discovery",
            peer.discover(&profile.channel),
        )
        .await?;
        within(
            deadline,
            &endpoint,
            "contract resolution",
            peer.resolve_contract(&profile.channel, &profile.contract),
        )
        .await?;

        if options.discovery_as_localhost {
            rewrite_to_localhost(&mut discovered);
        }

        info!(
            %endpoint,
            channel = %profile.channel,
            contract = %profile.contract,
            members = discovered.len(),
            "session open"
        );
        Ok(Session::new(
            guard.disarm(),
            creator,
            profile.channel.clone(),
            profile.contract.clone(),
            peer_name,
            discovered,
            options,
        ))
    }

    async fn dial_in_order(
        &self,
        profile: &ConnectionProfile,
        options: &ConnectOptions,
        deadline: Instant,
    ) -> NetworkResult<Arc<dyn LedgerLink>> {
        let mut attempted = Vec::new();
        for endpoint in &profile.endpoints {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let budget = options.dial_timeout.min(deadline - now);
            attempted.push(endpoint.describe());

            match timeout(budget, self.dialer.dial(endpoint)).await {
                Ok(Ok(link)) => return Ok(link),
                Ok(Err(NetworkError::Unreachable { reason, .. })) => {
                    warn!(endpoint = %endpoint.describe(), %reason, "endpoint unreachable");
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    warn!(endpoint = %endpoint.describe(), ?budget, "dial timed out");
                }
            }
        }

        Err(NetworkError::Unreachable {
            endpoint: if attempted.is_empty() {
                "no endpoint attempted".to_string()
            } else {
                attempted.join(", ")
            },
            reason: format!(
                "no endpoint reachable within {:?}",
                options.connect_timeout
            ),
        })
    }
}

/// Closes the link unless it was handed over to a session.
struct LinkGuard {
    link: Arc<dyn LedgerLink>,
    armed: bool,
}

impl LinkGuard {
    fn new(link: Arc<dyn LedgerLink>) -> Self {
        Self { link, armed: true }
    }

    fn link(&self) -> &dyn LedgerLink {
        self.link.as_ref()
    }

    fn disarm(mut self) -> Arc<dyn LedgerLink> {
        self.armed = false;
        self.link.clone()
    }
}

impl Drop for LinkGuard {
    fn drop(&mut self) {
        if self.armed {
            debug!(endpoint = %self.link.endpoint(), "releasing link after failed connect");
            self.link.close();
        }
    }
}

async fn within<T>(
    deadline: Instant,
    endpoint: &str,
    phase: &'static str,
    fut: impl Future<Output = NetworkResult<T>>,
) -> NetworkResult<T> {
    match timeout_at(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(NetworkError::Unreachable {
            endpoint: endpoint.to_string(),
            reason: format!("connect deadline elapsed during {phase}"),
        }),
    }
}

fn rewrite_to_localhost(endpoints: &mut [DiscoveredEndpoint]) {
    for endpoint in endpoints {
        let rewritten = match split_port(&endpoint.address) {
            Some(port) => format!("localhost:{port}"),
            None => "localhost".to_string(),
        };
        debug!(from = %endpoint.address, to = %rewritten, "discovery address rewritten");
        endpoint.address = rewritten;
    }
}
