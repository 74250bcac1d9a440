use std::path::PathBuf;

/// Errors from identity store operations.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// An identity is already stored under this label.
    #[error("identity already exists: {0}")]
    DuplicateIdentity(String),

    /// No identity is stored under this label.
    #[error("identity not found: {0}")]
    NotFound(String),

    /// The label cannot be used as a wallet key.
    #[error("invalid identity label {label:?}: {reason}")]
    InvalidLabel { label: String, reason: &'static str },

    /// The credential source does not hold exactly one candidate.
    #[error("ambiguous credential in {}: expected exactly one file, found {found}", dir.display())]
    AmbiguousCredential { dir: PathBuf, found: usize },

    /// A credential file exists but its contents are unusable.
    #[error("malformed credential {}: {reason}", path.display())]
    MalformedCredential { path: PathBuf, reason: String },

    /// A persisted identity could not be decoded.
    #[error("corrupt identity {label}: {reason}")]
    CorruptIdentity { label: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;
