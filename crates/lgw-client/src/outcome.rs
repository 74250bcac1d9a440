use std::collections::BTreeSet;
use std::sync::Mutex;

use lgw_protocol::{CommitStatus, ValidationCode};
use lgw_types::TransactionId;

/// A submit that was committed as valid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submitted {
    pub tx_id: TransactionId,
    pub block: u64,
    /// Value the contract function returned during endorsement.
    pub result: Vec<u8>,
}

impl Submitted {
    /// `result` as UTF-8 text, lossy.
    pub fn result_text(&self) -> String {
        String::from_utf8_lossy(&self.result).into_owned()
    }
}

/// Outcome of a commit-status re-query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed { block: u64 },
    Invalid { block: u64, code: ValidationCode },
    /// Not in any block seen by the peer yet.
    Unknown,
}

impl CommitOutcome {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl From<CommitStatus> for CommitOutcome {
    fn from(status: CommitStatus) -> Self {
        match status {
            CommitStatus::Valid { block } => Self::Committed { block },
            CommitStatus::Invalid { block, code } => Self::Invalid { block, code },
            CommitStatus::Unknown => Self::Unknown,
        }
    }
}

/// Transaction ids whose submit ended without a known outcome.
#[derive(Debug, Default)]
pub struct PendingOutcomes {
    ids: Mutex<BTreeSet<TransactionId>>,
}

impl PendingOutcomes {
    pub fn record(&self, tx_id: TransactionId) {
        self.ids.lock().expect("lock poisoned").insert(tx_id);
    }

    /// Forget `tx_id`. Returns whether it was pending.
    pub fn resolve(&self, tx_id: &TransactionId) -> bool {
        self.ids.lock().expect("lock poisoned").remove(tx_id)
    }

    pub fn contains(&self, tx_id: &TransactionId) -> bool {
        self.ids.lock().expect("lock poisoned").contains(tx_id)
    }

    pub fn snapshot(&self) -> Vec<TransactionId> {
        self.ids.lock().expect("lock poisoned").iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.lock().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lgw_types::{Creator, Nonce};

    fn tx(n: u8) -> TransactionId {
        TransactionId::derive(
            &Nonce::from_bytes([n; 24]),
            &Creator {
                msp_id: "Org1MSP".into(),
                certificate: "cert".into(),
            },
        )
    }

    #[test]
    fn record_and_resolve() {
        let pending = PendingOutcomes::default();
        pending.record(tx(1));
        pending.record(tx(2));
        pending.record(tx(1));
        assert_eq!(pending.len(), 2);

        assert!(pending.resolve(&tx(1)));
        assert!(!pending.resolve(&tx(1)));
        assert_eq!(pending.snapshot(), vec![tx(2)]);
    }

    #[test]
    fn outcome_from_status() {
        assert_eq!(
            CommitOutcome::from(CommitStatus::Valid { block: 4 }),
            CommitOutcome::Committed { block: 4 }
        );
        assert!(!CommitOutcome::from(CommitStatus::Unknown).is_resolved());
        assert!(CommitOutcome::Invalid {
            block: 1,
            code: ValidationCode::MvccReadConflict
        }
        .is_resolved());
    }

    #[test]
    fn result_text_is_lossy() {
        let s = Submitted {
            tx_id: tx(1),
            block: 2,
            result: b"Tomoko".to_vec(),
        };
        assert_eq!(s.result_text(), "Tomoko");
    }
}
