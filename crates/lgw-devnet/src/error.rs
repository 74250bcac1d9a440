use thiserror::Error;

#[derive(Debug, Error)]
pub enum DevnetError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] lgw_protocol::ProtocolError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DevnetResult<T> = Result<T, DevnetError>;
