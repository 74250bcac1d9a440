use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use lgw_types::{PrivateKey, X509Identity};

use crate::error::{WalletError, WalletResult};

/// Subdirectory holding the signing certificate.
pub const SIGNCERTS_DIR: &str = "signcerts";
/// Subdirectory holding the private key.
pub const KEYSTORE_DIR: &str = "keystore";

/// Credential source laid out as an MSP directory:
///
/// ```text
/// <msp>/signcerts/<exactly one certificate>.pem
/// <msp>/keystore/<exactly one key file>
/// ```
///
/// Zero or several candidates in either directory is a configuration error;
/// the loader never picks one.
#[derive(Clone, Debug)]
pub struct MspCredentials {
    msp_dir: PathBuf,
}

impl MspCredentials {
    pub fn new(msp_dir: impl Into<PathBuf>) -> Self {
        Self {
            msp_dir: msp_dir.into(),
        }
    }

    pub fn msp_dir(&self) -> &Path {
        &self.msp_dir
    }

    /// Read the certificate and key and build an identity under `msp_id`.
    pub fn load(&self, msp_id: &str) -> WalletResult<X509Identity> {
        let cert_path = single_candidate(&self.msp_dir.join(SIGNCERTS_DIR))?;
        let key_path = single_candidate(&self.msp_dir.join(KEYSTORE_DIR))?;
        debug!(
            cert = %cert_path.display(),
            key = %key_path.display(),
            "loading MSP credentials"
        );

        let certificate = read_pem(&cert_path)?;
        let private_key = read_pem(&key_path)?;
        X509Identity::new(msp_id, certificate, PrivateKey::new(private_key)).map_err(|e| {
            WalletError::MalformedCredential {
                path: self.msp_dir.clone(),
                reason: e.to_string(),
            }
        })
    }
}

/// The single regular file in `dir`.
fn single_candidate(dir: &Path) -> WalletResult<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(WalletError::AmbiguousCredential {
                dir: dir.to_path_buf(),
                found: 0,
            })
        }
        Err(e) => return Err(e.into()),
    };

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            candidates.push(entry.path());
        }
    }

    if candidates.len() != 1 {
        return Err(WalletError::AmbiguousCredential {
            dir: dir.to_path_buf(),
            found: candidates.len(),
        });
    }
    Ok(candidates.remove(0))
}

fn read_pem(path: &Path) -> WalletResult<String> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8(bytes).map_err(|_| WalletError::MalformedCredential {
        path: path.to_path_buf(),
        reason: "not UTF-8 PEM text".into(),
    })?;
    if text.trim().is_empty() {
        return Err(WalletError::MalformedCredential {
            path: path.to_path_buf(),
            reason: "empty file".into(),
        });
    }
    Ok(text)
}
