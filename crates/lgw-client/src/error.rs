use std::fmt;
use std::time::Duration;

use thiserror::Error;

use lgw_network::NetworkError;
use lgw_protocol::{ErrorCode, ValidationCode};
use lgw_types::TransactionId;

/// Step of an invocation a failure happened in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Evaluate,
    Endorse,
    Order,
    Commit,
    /// A commit-status re-query.
    Status,
}

impl Phase {
    /// Whether this phase belongs to a submit.
    pub fn is_submit(&self) -> bool {
        matches!(self, Self::Endorse | Self::Order | Self::Commit)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Evaluate => "evaluate",
            Self::Endorse => "endorse",
            Self::Order => "order",
            Self::Commit => "commit",
            Self::Status => "commit status",
        })
    }
}

/// What a caller can do about a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Wrong profile, identity, channel or contract. Retrying will not help.
    Configuration,
    /// Network trouble before anything was recorded. Safe to retry.
    Transient,
    /// The contract or the network refused the transaction.
    Rejected,
    /// The transaction may or may not be committed. Re-query its commit
    /// status by transaction id before doing anything else.
    AmbiguousCommit,
}

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("contract error: {0}")]
    Contract(String),

    #[error("endorsement failed: {0}")]
    EndorsementFailed(String),

    #[error("ordering failed for transaction {tx_id}: {reason}")]
    OrderingFailed { tx_id: TransactionId, reason: String },

    #[error("{phase} of transaction {tx_id} timed out after {after:?}")]
    Timeout {
        tx_id: TransactionId,
        phase: Phase,
        after: Duration,
    },

    #[error("transaction {tx_id} committed as invalid: {code}")]
    CommitRejected {
        tx_id: TransactionId,
        code: ValidationCode,
    },

    #[error("commit status of transaction {tx_id} unavailable: {reason}")]
    CommitStatusUnavailable { tx_id: TransactionId, reason: String },

    #[error("unreachable: {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("session closed")]
    SessionClosed,

    #[error(transparent)]
    Network(NetworkError),
}

impl InvokeError {
    /// Map a failure reported while running `phase` of `tx_id`.
    ///
    /// Once an endorsed transaction has been handed to ordering, any
    /// failure leaves its fate unknown.
    pub(crate) fn from_network(err: NetworkError, tx_id: TransactionId, phase: Phase) -> Self {
        match (err, phase) {
            (
                NetworkError::Remote {
                    code: ErrorCode::ContractError,
                    message,
                },
                _,
            ) => Self::Contract(message),
            (
                NetworkError::Remote {
                    code: ErrorCode::EndorsementFailed,
                    message,
                },
                _,
            ) => Self::EndorsementFailed(message),
            (err, Phase::Order) => Self::OrderingFailed {
                tx_id,
                reason: remote_reason(err),
            },
            (err, Phase::Commit) => Self::CommitStatusUnavailable {
                tx_id,
                reason: remote_reason(err),
            },
            (NetworkError::Closed, _) => Self::SessionClosed,
            (NetworkError::Unreachable { endpoint, reason }, _) => {
                Self::Unreachable { endpoint, reason }
            }
            (err, _) => Self::Network(err),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Contract(_) | Self::EndorsementFailed(_) | Self::CommitRejected { .. } => {
                ErrorClass::Rejected
            }
            Self::OrderingFailed { .. } | Self::CommitStatusUnavailable { .. } => {
                ErrorClass::AmbiguousCommit
            }
            Self::Timeout { phase, .. } if phase.is_submit() => ErrorClass::AmbiguousCommit,
            Self::Timeout { .. } | Self::Unreachable { .. } => ErrorClass::Transient,
            Self::SessionClosed => ErrorClass::Configuration,
            Self::Network(e) if e.is_transient() => ErrorClass::Transient,
            Self::Network(_) => ErrorClass::Configuration,
        }
    }

    /// True when the commit status must be re-queried before retrying.
    pub fn requires_requery(&self) -> bool {
        self.class() == ErrorClass::AmbiguousCommit
    }

    /// Transaction id the failure refers to, where one was assigned.
    pub fn tx_id(&self) -> Option<TransactionId> {
        match self {
            Self::OrderingFailed { tx_id, .. }
            | Self::Timeout { tx_id, .. }
            | Self::CommitRejected { tx_id, .. }
            | Self::CommitStatusUnavailable { tx_id, .. } => Some(*tx_id),
            _ => None,
        }
    }
}

fn remote_reason(err: NetworkError) -> String {
    match err {
        NetworkError::Remote { message, .. } => message,
        other => other.to_string(),
    }
}

pub type InvokeResult<T> = Result<T, InvokeError>;
