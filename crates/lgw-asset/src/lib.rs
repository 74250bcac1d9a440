//! Asset entity and its wire codec.
//!
//! The contract stores assets as JSON objects whose members appear in
//! alphabetic order by name (`AppraisedValue`, `Color`, `ID`, `Owner`,
//! `Size`). [`AssetCodec`] produces exactly that byte sequence so that every
//! client implementation writes identical payloads, and decodes contract
//! responses into typed values or a [`CodecError::MalformedPayload`].

pub mod asset;
pub mod codec;
pub mod error;

pub use asset::Asset;
pub use codec::AssetCodec;
pub use error::{CodecError, CodecResult};
