use std::fmt;

use serde::{Deserialize, Serialize};

use lgw_types::{Creator, Nonce, TransactionId};

/// A request to run one contract function.
///
/// The function name and arguments are passed through uninterpreted; the
/// contract is the only authority on their validity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub tx_id: TransactionId,
    pub nonce: Nonce,
    pub creator: Creator,
    pub channel: String,
    pub contract: String,
    pub function: String,
    pub args: Vec<String>,
}

impl Proposal {
    /// Build a proposal with a fresh nonce and its derived transaction id.
    pub fn new(
        creator: Creator,
        channel: impl Into<String>,
        contract: impl Into<String>,
        function: impl Into<String>,
        args: Vec<String>,
    ) -> Self {
        let nonce = Nonce::random();
        let tx_id = TransactionId::derive(&nonce, &creator);
        Self {
            tx_id,
            nonce,
            creator,
            channel: channel.into(),
            contract: contract.into(),
            function: function.into(),
            args,
        }
    }

    /// Whether `tx_id` matches the nonce and creator it claims to bind.
    pub fn tx_id_is_consistent(&self) -> bool {
        TransactionId::derive(&self.nonce, &self.creator) == self.tx_id
    }
}

/// A proposal that gathered enough endorsements to be ordered.
///
/// `prepared` is the endorsed transaction as produced by the peers. The
/// client treats it as opaque and hands it to the ordering service as is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    pub tx_id: TransactionId,
    pub channel: String,
    pub payload: Vec<u8>,
    pub prepared: Vec<u8>,
    pub endorsers: Vec<String>,
}

/// Why a committed transaction was marked invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationCode {
    MvccReadConflict,
    EndorsementPolicyFailure,
    DuplicateTxId,
    BadPayload,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MvccReadConflict => "MVCC_READ_CONFLICT",
            Self::EndorsementPolicyFailure => "ENDORSEMENT_POLICY_FAILURE",
            Self::DuplicateTxId => "DUPLICATE_TXID",
            Self::BadPayload => "BAD_PAYLOAD",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commit state of a transaction as seen by a peer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitStatus {
    /// Committed in `block` and applied to world state.
    Valid { block: u64 },
    /// Committed in `block` but rejected by validation; state unchanged.
    Invalid { block: u64, code: ValidationCode },
    /// The peer has not seen the transaction in any block.
    Unknown,
}

/// Role of a network endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointRole {
    Peer,
    Orderer,
}

/// A channel member reported by service discovery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredEndpoint {
    pub name: String,
    pub address: String,
    pub role: EndpointRole,
    pub msp_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creator() -> Creator {
        Creator {
            msp_id: "Org1MSP".into(),
            certificate: "cert".into(),
        }
    }

    #[test]
    fn fresh_proposals_have_distinct_ids() {
        let a = Proposal::new(creator(), "mychannel", "basic", "ReadAsset", vec!["asset1".into()]);
        let b = Proposal::new(creator(), "mychannel", "basic", "ReadAsset", vec!["asset1".into()]);
        assert_ne!(a.tx_id, b.tx_id);
        assert!(a.tx_id_is_consistent());
    }

    #[test]
    fn tampered_creator_breaks_tx_id() {
        let mut proposal = Proposal::new(creator(), "mychannel", "basic", "InitLedger", vec![]);
        proposal.creator.msp_id = "Org2MSP".into();
        assert!(!proposal.tx_id_is_consistent());
    }

    #[test]
    fn validation_code_names() {
        assert_eq!(ValidationCode::MvccReadConflict.to_string(), "MVCC_READ_CONFLICT");
        assert_eq!(ValidationCode::DuplicateTxId.as_str(), "DUPLICATE_TXID");
    }
}
