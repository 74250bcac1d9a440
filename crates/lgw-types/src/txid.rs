use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::Creator;

/// Length of a proposal nonce in bytes.
pub const NONCE_LEN: usize = 24;

/// Random bytes that make every proposal unique.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    pub fn random() -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

/// Transaction identifier.
///
/// Derived with BLAKE3 from the proposal nonce and the creator, so the
/// network can recompute and check it. A submitted transaction keeps the
/// same id through endorsement, ordering and commit, which makes it the
/// handle for re-querying an outcome the client never observed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId {
    hash: [u8; 32],
}

impl TransactionId {
    pub fn derive(nonce: &Nonce, creator: &Creator) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"lgw-txid-v1:");
        hasher.update(nonce.as_bytes());
        hasher.update(b":");
        hasher.update(creator.msp_id.as_bytes());
        hasher.update(b":");
        hasher.update(creator.certificate.as_bytes());
        Self {
            hash: *hasher.finalize().as_bytes(),
        }
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.hash
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// First 8 hex characters, for log lines.
    pub fn short_id(&self) -> String {
        hex::encode(&self.hash[..4])
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes);
        Ok(Self { hash })
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.short_id())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creator(msp: &str) -> Creator {
        Creator {
            msp_id: msp.into(),
            certificate: "cert".into(),
        }
    }

    #[test]
    fn derive_is_deterministic() {
        let nonce = Nonce::from_bytes([7; NONCE_LEN]);
        assert_eq!(
            TransactionId::derive(&nonce, &creator("Org1MSP")),
            TransactionId::derive(&nonce, &creator("Org1MSP"))
        );
    }

    #[test]
    fn creator_changes_id() {
        let nonce = Nonce::from_bytes([7; NONCE_LEN]);
        assert_ne!(
            TransactionId::derive(&nonce, &creator("Org1MSP")),
            TransactionId::derive(&nonce, &creator("Org2MSP"))
        );
    }

    #[test]
    fn random_nonces_differ() {
        assert_ne!(Nonce::random(), Nonce::random());
    }

    #[test]
    fn hex_roundtrip() {
        let id = TransactionId::derive(&Nonce::random(), &creator("Org1MSP"));
        assert_eq!(TransactionId::from_hex(&id.to_hex()).unwrap(), id);
        assert_eq!(id.to_string(), id.to_hex());
        assert_eq!(id.short_id().len(), 8);
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(matches!(
            TransactionId::from_hex("zz"),
            Err(TypeError::InvalidHex(_))
        ));
        assert_eq!(
            TransactionId::from_hex("abcd").unwrap_err(),
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }
}
