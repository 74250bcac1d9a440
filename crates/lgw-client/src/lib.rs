//! Transaction invoker for LedgerGateway.
//!
//! [`Contract`] runs contract functions over an open session in two modes:
//! evaluate (query one peer, nothing recorded) and submit (endorse, order,
//! then wait for the commit). Failures carry an [`ErrorClass`] so callers
//! can tell a rejected transaction from a lost connection, and both from a
//! submit whose outcome is unknown and has to be re-queried by transaction
//! id.
//!
//! [`AssetContract`] wraps a [`Contract`] with the asset operations and the
//! asset codec.

pub mod assets;
pub mod contract;
pub mod error;
pub mod outcome;

pub use assets::{AssetContract, AssetError, AssetResult};
pub use contract::Contract;
pub use error::{ErrorClass, InvokeError, InvokeResult, Phase};
pub use outcome::{CommitOutcome, PendingOutcomes, Submitted};
