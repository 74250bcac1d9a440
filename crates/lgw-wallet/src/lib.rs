//! Identity store for LedgerGateway.
//!
//! A wallet maps a label (e.g. `"appUser"`) to exactly one
//! [`X509Identity`](lgw_types::X509Identity). Identities are provisioned once
//! from an MSP credential directory and then reused on every connection.
//!
//! # Backends
//!
//! All backends implement the [`IdentityStore`] trait:
//!
//! - [`InMemoryWallet`] -- map-based store for tests and embedding
//! - [`FileSystemWallet`] -- one JSON file per label, atomic replace on write
//!
//! # Rules
//!
//! 1. At most one identity per label.
//! 2. `put` never overwrites unless [`PutMode::Overwrite`] is requested.
//! 3. A credential directory with zero or several key candidates is a fatal
//!    configuration error ([`WalletError::AmbiguousCredential`]).
//! 4. Private keys are never logged.

pub mod credentials;
pub mod error;
pub mod fs;
pub mod memory;
pub mod provision;
pub mod traits;

pub use credentials::MspCredentials;
pub use error::{WalletError, WalletResult};
pub use fs::FileSystemWallet;
pub use memory::InMemoryWallet;
pub use provision::{ensure_identity, reimport_identity, Provisioned};
pub use traits::{validate_label, IdentityStore, PutMode};
