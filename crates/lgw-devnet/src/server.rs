use std::io::BufReader;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

use lgw_protocol::{read_frame, write_frame, ErrorCode, Frame, GatewayMessage};

use crate::config::TlsConfig;
use crate::error::{DevnetError, DevnetResult};
use crate::ledger::{Connection, DevNetwork};

const REPLY_QUEUE: usize = 64;

/// Server certificate and key, PEM encoded.
#[derive(Clone)]
pub struct ServerTls {
    cert_pem: String,
    key_pem: String,
}

impl ServerTls {
    pub fn new(cert_pem: impl Into<String>, key_pem: impl Into<String>) -> Self {
        Self {
            cert_pem: cert_pem.into(),
            key_pem: key_pem.into(),
        }
    }

    pub fn from_config(config: &TlsConfig) -> DevnetResult<Self> {
        let read = |path: &std::path::Path| {
            std::fs::read_to_string(path)
                .map_err(|e| DevnetError::Tls(format!("{}: {e}", path.display())))
        };
        Ok(Self::new(read(&config.cert_path)?, read(&config.key_path)?))
    }

    /// A fresh self-signed certificate valid for `names`. Clients trust it
    /// by using [`ServerTls::cert_pem`] as their CA certificate.
    pub fn self_signed(names: Vec<String>) -> DevnetResult<Self> {
        let certified =
            rcgen::generate_simple_self_signed(names).map_err(|e| DevnetError::Tls(e.to_string()))?;
        Ok(Self::new(
            certified.cert.pem(),
            certified.key_pair.serialize_pem(),
        ))
    }

    pub fn cert_pem(&self) -> &str {
        &self.cert_pem
    }

    fn acceptor(&self) -> DevnetResult<TlsAcceptor> {
        let certs = rustls_pemfile::certs(&mut BufReader::new(self.cert_pem.as_bytes()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DevnetError::Tls(format!("invalid certificate PEM: {e}")))?;
        if certs.is_empty() {
            return Err(DevnetError::Tls("no certificate found".into()));
        }
        let key = rustls_pemfile::private_key(&mut BufReader::new(self.key_pem.as_bytes()))
            .map_err(|e| DevnetError::Tls(format!("invalid key PEM: {e}")))?
            .ok_or_else(|| DevnetError::Tls("no private key found".into()))?;

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = rustls::ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| DevnetError::Tls(e.to_string()))?
            .with_no_client_auth()
            .with_single_cert(certs, key)
            .map_err(|e| DevnetError::Tls(e.to_string()))?;
        Ok(TlsAcceptor::from(Arc::new(config)))
    }
}

/// Serves a [`DevNetwork`] over framed TCP, optionally under TLS.
pub struct DevnetServer {
    network: DevNetwork,
    listener: TcpListener,
    acceptor: Option<TlsAcceptor>,
}

impl DevnetServer {
    pub async fn bind(
        network: DevNetwork,
        addr: SocketAddr,
        tls: Option<&ServerTls>,
    ) -> DevnetResult<Self> {
        let acceptor = tls.map(ServerTls::acceptor).transpose()?;
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            network,
            listener,
            acceptor,
        })
    }

    pub fn local_addr(&self) -> DevnetResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the task is aborted.
    pub async fn serve(self) -> DevnetResult<()> {
        let addr = self.local_addr()?;
        info!(
            %addr,
            channel = %self.network.config().channel,
            tls = self.acceptor.is_some(),
            "devnet listening"
        );
        loop {
            let (stream, remote) = self.listener.accept().await?;
            let _ = stream.set_nodelay(true);
            let network = self.network.clone();
            match &self.acceptor {
                None => {
                    tokio::spawn(serve_connection(network, stream, remote));
                }
                Some(acceptor) => {
                    let acceptor = acceptor.clone();
                    tokio::spawn(async move {
                        match acceptor.accept(stream).await {
                            Ok(stream) => serve_connection(network, stream, remote).await,
                            Err(e) => warn!(%remote, error = %e, "TLS handshake failed"),
                        }
                    });
                }
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<DevnetResult<()>> {
        tokio::spawn(self.serve())
    }
}

/// Read requests and answer each one on its own task, so a long commit
/// wait does not hold up the requests behind it.
async fn serve_connection<S>(network: DevNetwork, stream: S, remote: SocketAddr)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    debug!(%remote, "connection opened");
    let (mut reader, mut writer) = tokio::io::split(stream);
    let conn = Arc::new(Connection::new());
    let (replies, mut queue) = mpsc::channel::<Frame>(REPLY_QUEUE);

    let writer_task = tokio::spawn(async move {
        while let Some(frame) = queue.recv().await {
            if let Err(e) = write_frame(&mut writer, &frame).await {
                warn!(%remote, error = %e, "reply write failed");
                return;
            }
        }
        let _ = writer.shutdown().await;
    });

    loop {
        let frame = match read_frame(&mut reader).await {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                warn!(%remote, error = %e, "request read failed");
                break;
            }
        };
        let request_id = frame.request_id;
        if !frame.message.is_request() {
            let reply = GatewayMessage::error(
                ErrorCode::BadRequest,
                format!("{} is not a request", frame.message.type_name()),
            );
            let _ = replies.send(Frame { request_id, message: reply }).await;
            continue;
        }
        let network = network.clone();
        let conn = conn.clone();
        let replies = replies.clone();
        tokio::spawn(async move {
            let message = network.handle(&conn, frame.message).await;
            let _ = replies.send(Frame { request_id, message }).await;
        });
    }

    drop(replies);
    let _ = writer_task.await;
    debug!(%remote, "connection closed");
}
