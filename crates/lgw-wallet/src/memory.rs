use std::collections::BTreeMap;
use std::sync::RwLock;

use lgw_types::X509Identity;

use crate::error::{WalletError, WalletResult};
use crate::traits::{validate_label, IdentityStore, PutMode};

/// In-memory wallet.
///
/// Intended for tests and embedding. Identities live for the lifetime of the
/// value behind a `RwLock`.
pub struct InMemoryWallet {
    identities: RwLock<BTreeMap<String, X509Identity>>,
}

impl InMemoryWallet {
    pub fn new() -> Self {
        Self {
            identities: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.identities.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityStore for InMemoryWallet {
    fn exists(&self, label: &str) -> WalletResult<bool> {
        let map = self.identities.read().expect("lock poisoned");
        Ok(map.contains_key(label))
    }

    fn put(&self, label: &str, identity: &X509Identity, mode: PutMode) -> WalletResult<()> {
        validate_label(label)?;
        let mut map = self.identities.write().expect("lock poisoned");
        if mode == PutMode::CreateNew && map.contains_key(label) {
            return Err(WalletError::DuplicateIdentity(label.to_string()));
        }
        map.insert(label.to_string(), identity.clone());
        Ok(())
    }

    fn get(&self, label: &str) -> WalletResult<X509Identity> {
        let map = self.identities.read().expect("lock poisoned");
        map.get(label)
            .cloned()
            .ok_or_else(|| WalletError::NotFound(label.to_string()))
    }

    fn remove(&self, label: &str) -> WalletResult<bool> {
        let mut map = self.identities.write().expect("lock poisoned");
        Ok(map.remove(label).is_some())
    }

    fn labels(&self) -> WalletResult<Vec<String>> {
        let map = self.identities.read().expect("lock poisoned");
        Ok(map.keys().cloned().collect())
    }
}

impl std::fmt::Debug for InMemoryWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryWallet")
            .field("identity_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lgw_types::PrivateKey;

    fn identity(msp: &str) -> X509Identity {
        X509Identity::new(msp, "cert-pem", PrivateKey::new("key-pem")).unwrap()
    }

    #[test]
    fn put_then_exists() {
        let wallet = InMemoryWallet::new();
        assert!(!wallet.exists("appUser").unwrap());
        wallet
            .put("appUser", &identity("Org1MSP"), PutMode::CreateNew)
            .unwrap();
        assert!(wallet.exists("appUser").unwrap());
        assert_eq!(wallet.len(), 1);
    }

    #[test]
    fn second_put_is_duplicate() {
        let wallet = InMemoryWallet::new();
        wallet
            .put("appUser", &identity("Org1MSP"), PutMode::CreateNew)
            .unwrap();
        let err = wallet
            .put("appUser", &identity("Org2MSP"), PutMode::CreateNew)
            .unwrap_err();
        assert!(matches!(err, WalletError::DuplicateIdentity(ref l) if l == "appUser"));
        assert_eq!(wallet.get("appUser").unwrap().msp_id(), "Org1MSP");
    }

    #[test]
    fn overwrite_replaces() {
        let wallet = InMemoryWallet::new();
        wallet
            .put("appUser", &identity("Org1MSP"), PutMode::CreateNew)
            .unwrap();
        wallet
            .put("appUser", &identity("Org2MSP"), PutMode::Overwrite)
            .unwrap();
        assert_eq!(wallet.get("appUser").unwrap().msp_id(), "Org2MSP");
    }

    #[test]
    fn get_missing_is_not_found() {
        let wallet = InMemoryWallet::new();
        assert!(matches!(
            wallet.get("ghost"),
            Err(WalletError::NotFound(ref l)) if l == "ghost"
        ));
    }

    #[test]
    fn remove_then_recreate() {
        let wallet = InMemoryWallet::new();
        wallet
            .put("appUser", &identity("Org1MSP"), PutMode::CreateNew)
            .unwrap();
        assert!(wallet.remove("appUser").unwrap());
        assert!(!wallet.remove("appUser").unwrap());
        wallet
            .put("appUser", &identity("Org2MSP"), PutMode::CreateNew)
            .unwrap();
        assert_eq!(wallet.get("appUser").unwrap().msp_id(), "Org2MSP");
    }

    #[test]
    fn labels_sorted() {
        let wallet = InMemoryWallet::new();
        for label in ["zed", "alice", "mike"] {
            wallet
                .put(label, &identity("Org1MSP"), PutMode::CreateNew)
                .unwrap();
        }
        assert_eq!(wallet.labels().unwrap(), vec!["alice", "mike", "zed"]);
    }
}
