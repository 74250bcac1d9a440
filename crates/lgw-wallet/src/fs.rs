use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lgw_types::{PrivateKey, X509Identity, X509_IDENTITY_TYPE};

use crate::error::{WalletError, WalletResult};
use crate::traits::{validate_label, IdentityStore, PutMode};

/// File extension of persisted identities.
const IDENTITY_EXT: &str = "id";

/// Current on-disk format version.
const FORMAT_VERSION: u32 = 1;

/// On-disk identity document.
///
/// ```text
/// {"version":1,"mspId":"Org1MSP","type":"X.509",
///  "credentials":{"certificate":"-----BEGIN ...","privateKey":"-----BEGIN ..."}}
/// ```
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityFile {
    version: u32,
    msp_id: String,
    #[serde(rename = "type")]
    kind: String,
    credentials: CredentialsFile,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsFile {
    certificate: String,
    private_key: String,
}

impl IdentityFile {
    fn from_identity(identity: &X509Identity) -> Self {
        Self {
            version: FORMAT_VERSION,
            msp_id: identity.msp_id().to_string(),
            kind: X509_IDENTITY_TYPE.to_string(),
            credentials: CredentialsFile {
                certificate: identity.certificate().to_string(),
                private_key: identity.private_key().expose_pem().to_string(),
            },
        }
    }

    fn into_identity(self, label: &str) -> WalletResult<X509Identity> {
        let corrupt = |reason: String| WalletError::CorruptIdentity {
            label: label.to_string(),
            reason,
        };
        if self.version != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported version {}", self.version)));
        }
        if self.kind != X509_IDENTITY_TYPE {
            return Err(corrupt(format!("unsupported credential type {:?}", self.kind)));
        }
        X509Identity::new(
            self.msp_id,
            self.credentials.certificate,
            PrivateKey::new(self.credentials.private_key),
        )
        .map_err(|e| corrupt(e.to_string()))
    }
}

/// Directory-backed wallet: one `<label>.id` JSON document per identity.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so a crash never leaves a half-written identity behind. Temporary
/// files are created owner-readable only.
pub struct FileSystemWallet {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSystemWallet {
    /// Open (or create) a wallet rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> WalletResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        debug!(root = %root.display(), "opened file system wallet");
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, label: &str) -> PathBuf {
        self.root.join(format!("{label}.{IDENTITY_EXT}"))
    }

    fn write_document(&self, path: &Path, data: &[u8], mode: PutMode) -> WalletResult<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        match mode {
            PutMode::Overwrite => {
                tmp.persist(path).map_err(|e| WalletError::Io(e.error))?;
            }
            PutMode::CreateNew => {
                tmp.persist_noclobber(path).map_err(|e| WalletError::Io(e.error))?;
            }
        }
        Ok(())
    }
}

impl IdentityStore for FileSystemWallet {
    fn exists(&self, label: &str) -> WalletResult<bool> {
        validate_label(label)?;
        match fs::metadata(self.path_for(label)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, label: &str, identity: &X509Identity, mode: PutMode) -> WalletResult<()> {
        validate_label(label)?;
        let document = serde_json::to_vec_pretty(&IdentityFile::from_identity(identity))
            .map_err(|e| WalletError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        let _guard = self.write_lock.lock().expect("wallet write lock poisoned");
        let path = self.path_for(label);
        match self.write_document(&path, &document, mode) {
            Err(WalletError::Io(e)) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(WalletError::DuplicateIdentity(label.to_string()))
            }
            Err(e) => Err(e),
            Ok(()) => {
                info!(label, msp_id = identity.msp_id(), ?mode, "stored identity");
                Ok(())
            }
        }
    }

    fn get(&self, label: &str) -> WalletResult<X509Identity> {
        validate_label(label)?;
        let data = match fs::read(self.path_for(label)) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(WalletError::NotFound(label.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let file: IdentityFile =
            serde_json::from_slice(&data).map_err(|e| WalletError::CorruptIdentity {
                label: label.to_string(),
                reason: e.to_string(),
            })?;
        file.into_identity(label)
    }

    fn remove(&self, label: &str) -> WalletResult<bool> {
        validate_label(label)?;
        let _guard = self.write_lock.lock().expect("wallet write lock poisoned");
        match fs::remove_file(self.path_for(label)) {
            Ok(()) => {
                info!(label, "removed identity");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn labels(&self) -> WalletResult<Vec<String>> {
        let mut labels = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(IDENTITY_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_label(stem).is_ok() {
                    labels.push(stem.to_string());
                }
            }
        }
        labels.sort();
        Ok(labels)
    }
}

impl std::fmt::Debug for FileSystemWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystemWallet")
            .field("root", &self.root)
            .finish()
    }
}
