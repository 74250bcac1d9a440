use crate::asset::Asset;
use crate::error::{CodecError, CodecResult};

/// Codec for the contract's asset payloads.
pub struct AssetCodec;

impl AssetCodec {
    /// Compact JSON, members in alphabetic order, no insignificant
    /// whitespace. Identical input always yields identical bytes.
    pub fn encode(asset: &Asset) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(asset).map_err(|e| CodecError::Serialization(e.to_string()))
    }

    /// Encode a list of assets as a JSON array.
    pub fn encode_list(assets: &[Asset]) -> CodecResult<Vec<u8>> {
        serde_json::to_vec(assets).map_err(|e| CodecError::Serialization(e.to_string()))
    }

    /// Decode a single asset.
    ///
    /// All five members are required; unknown members are ignored and
    /// whitespace is insignificant.
    pub fn decode(data: &[u8]) -> CodecResult<Asset> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(CodecError::MalformedPayload("empty payload".into()));
        }
        serde_json::from_slice(data).map_err(|e| CodecError::MalformedPayload(e.to_string()))
    }

    /// Decode a bulk-read response.
    ///
    /// An empty payload or JSON `null` is an empty list: that is how the
    /// contract reports a ledger with no assets.
    pub fn decode_list(data: &[u8]) -> CodecResult<Vec<Asset>> {
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let assets: Option<Vec<Asset>> = serde_json::from_slice(data)
            .map_err(|e| CodecError::MalformedPayload(e.to_string()))?;
        Ok(assets.unwrap_or_default())
    }
}
