use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_rustls::TlsConnector;
use tracing::{debug, trace, warn};

use lgw_protocol::{read_frame, write_frame, Frame, GatewayMessage};

use crate::error::{NetworkError, NetworkResult};
use crate::profile::EndpointConfig;
use crate::tls;
use crate::transport::{Dialer, LedgerLink};

type Pending = Arc<DashMap<u64, oneshot::Sender<NetworkResult<GatewayMessage>>>>;

const OUTBOUND_QUEUE: usize = 64;

/// Dials endpoints over TCP, with TLS when the endpoint carries trust
/// material.
#[derive(Clone, Copy, Debug, Default)]
pub struct TcpDialer;

#[async_trait]
impl Dialer for TcpDialer {
    async fn dial(&self, endpoint: &EndpointConfig) -> NetworkResult<Arc<dyn LedgerLink>> {
        let stream = TcpStream::connect(&endpoint.address)
            .await
            .map_err(|e| NetworkError::Unreachable {
                endpoint: endpoint.describe(),
                reason: e.to_string(),
            })?;
        let _ = stream.set_nodelay(true);

        let Some(material) = &endpoint.tls else {
            debug!(endpoint = %endpoint.describe(), "connected (plaintext)");
            return Ok(Arc::new(TcpLink::spawn(endpoint.describe(), stream)));
        };

        let pem = material.ca_cert_pem.as_deref().ok_or_else(|| {
            NetworkError::InvalidProfile(format!(
                "endpoint {}: TLS enabled without a CA certificate",
                endpoint.name
            ))
        })?;
        let connector = TlsConnector::from(tls::client_config(pem)?);
        let server_name = tls::server_name(endpoint)?;
        let stream = connector
            .connect(server_name, stream)
            .await
            .map_err(|e| NetworkError::TlsHandshakeFailed {
                endpoint: endpoint.describe(),
                reason: e.to_string(),
            })?;
        debug!(endpoint = %endpoint.describe(), "connected (TLS)");
        Ok(Arc::new(TcpLink::spawn(endpoint.describe(), stream)))
    }
}

/// A framed connection multiplexing concurrent requests by request id.
///
/// A reader task routes each response to the request that is waiting for
/// it. Responses that arrive after their caller gave up are logged and
/// dropped.
pub struct TcpLink {
    endpoint: String,
    outbound: mpsc::Sender<Frame>,
    pending: Pending,
    next_id: AtomicU64,
    closed: AtomicBool,
    lost: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl TcpLink {
    /// Start the reader and writer tasks on an established stream.
    pub fn spawn<S>(endpoint: String, stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (mut read_half, mut write_half) = tokio::io::split(stream);
        let pending: Pending = Arc::new(DashMap::new());
        let lost = Arc::new(AtomicBool::new(false));
        let (outbound, mut queue) = mpsc::channel::<Frame>(OUTBOUND_QUEUE);

        let reader = tokio::spawn({
            let pending = pending.clone();
            let lost = lost.clone();
            let endpoint = endpoint.clone();
            async move {
                loop {
                    match read_frame(&mut read_half).await {
                        Ok(Some(frame)) => deliver(&pending, &endpoint, frame),
                        Ok(None) => {
                            debug!(%endpoint, "peer closed the link");
                            break;
                        }
                        Err(e) => {
                            warn!(%endpoint, error = %e, "link read failed");
                            break;
                        }
                    }
                }
                lost.store(true, Ordering::SeqCst);
                fail_all(&pending, &endpoint, "connection lost");
            }
        });

        let writer = tokio::spawn({
            let pending = pending.clone();
            let lost = lost.clone();
            let endpoint = endpoint.clone();
            async move {
                while let Some(frame) = queue.recv().await {
                    if let Err(e) = write_frame(&mut write_half, &frame).await {
                        warn!(%endpoint, error = %e, "link write failed");
                        lost.store(true, Ordering::SeqCst);
                        fail_all(&pending, &endpoint, "write failed");
                        return;
                    }
                }
                let _ = write_half.shutdown().await;
            }
        });

        Self {
            endpoint,
            outbound,
            pending,
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            lost,
            reader,
            writer,
        }
    }

    /// Requests currently waiting for a response.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    fn check_usable(&self) -> NetworkResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(NetworkError::Closed);
        }
        if self.lost.load(Ordering::SeqCst) {
            return Err(NetworkError::Unreachable {
                endpoint: self.endpoint.clone(),
                reason: "connection lost".into(),
            });
        }
        Ok(())
    }
}

fn deliver(pending: &Pending, endpoint: &str, frame: Frame) {
    let request_id = frame.request_id;
    match pending.remove(&request_id) {
        Some((_, sender)) => {
            if sender.send(Ok(frame.message)).is_err() {
                warn!(endpoint, request_id, "response arrived after the caller gave up");
            } else {
                trace!(endpoint, request_id, "response delivered");
            }
        }
        None => warn!(
            endpoint,
            request_id,
            message = frame.message.type_name(),
            "dropping response for abandoned request"
        ),
    }
}

fn fail_all(pending: &Pending, endpoint: &str, reason: &str) {
    let ids: Vec<u64> = pending.iter().map(|e| *e.key()).collect();
    for id in ids {
        if let Some((_, sender)) = pending.remove(&id) {
            let _ = sender.send(Err(NetworkError::Unreachable {
                endpoint: endpoint.to_string(),
                reason: reason.to_string(),
            }));
        }
    }
}

/// Removes the pending entry when the caller stops waiting.
struct PendingGuard<'a> {
    pending: &'a Pending,
    request_id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.request_id);
    }
}

#[async_trait]
impl LedgerLink for TcpLink {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request(&self, message: GatewayMessage) -> NetworkResult<GatewayMessage> {
        self.check_usable()?;
        let request_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        self.pending.insert(request_id, sender);
        let _guard = PendingGuard {
            pending: &self.pending,
            request_id,
        };
        self.check_usable()?;

        trace!(endpoint = %self.endpoint, request_id, message = message.type_name(), "request");
        self.outbound
            .send(Frame {
                request_id,
                message,
            })
            .await
            .map_err(|_| NetworkError::Closed)?;

        receiver.await.unwrap_or(Err(NetworkError::Closed))
    }

    fn close(&self) {
        let first = !self.closed.swap(true, Ordering::SeqCst);
        self.reader.abort();
        self.writer.abort();
        let ids: Vec<u64> = self.pending.iter().map(|e| *e.key()).collect();
        for id in ids {
            if let Some((_, sender)) = self.pending.remove(&id) {
                let _ = sender.send(Err(NetworkError::Closed));
            }
        }
        if first {
            debug!(endpoint = %self.endpoint, "link closed");
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.lost.load(Ordering::SeqCst)
    }
}

impl Drop for TcpLink {
    fn drop(&mut self) {
        self.close();
    }
}
