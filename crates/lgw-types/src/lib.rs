//! Foundation types for LedgerGateway.
//!
//! Every other `lgw-*` crate depends on `lgw-types` for the identity and
//! transaction primitives that cross crate boundaries.
//!
//! # Key Types
//!
//! - [`X509Identity`] — certificate + private key under an MSP affiliation
//! - [`Creator`] — the public half of an identity, attached to proposals
//! - [`TransactionId`] — BLAKE3 digest binding a nonce to its creator
//! - [`Nonce`] — per-proposal random bytes

pub mod error;
pub mod identity;
pub mod txid;

pub use error::TypeError;
pub use identity::{Creator, PrivateKey, X509Identity, X509_IDENTITY_TYPE};
pub use txid::{Nonce, TransactionId, NONCE_LEN};
