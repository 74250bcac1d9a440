use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use lgw_asset::{Asset, AssetCodec, CodecError};
use lgw_network::Session;

use crate::contract::Contract;
use crate::error::{ErrorClass, InvokeError};
use crate::outcome::Submitted;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error(transparent)]
    Invoke(#[from] InvokeError),

    #[error("cannot decode contract response: {0}")]
    Codec(#[from] CodecError),
}

impl AssetError {
    /// Codec failures mean the contract and client disagree on the payload
    /// format, which is a configuration problem.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Invoke(e) => e.class(),
            Self::Codec(_) => ErrorClass::Configuration,
        }
    }
}

pub type AssetResult<T> = Result<T, AssetError>;

/// The asset-transfer contract's operations.
#[derive(Clone)]
pub struct AssetContract {
    contract: Contract,
}

impl AssetContract {
    pub fn new(contract: Contract) -> Self {
        Self { contract }
    }

    pub fn from_session(session: Arc<Session>) -> Self {
        Self::new(Contract::new(session))
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Seed the ledger with the contract's sample assets.
    pub async fn init_ledger(&self) -> AssetResult<Submitted> {
        Ok(self.contract.submit("InitLedger", &[]).await?)
    }

    pub async fn list_all(&self) -> AssetResult<Vec<Asset>> {
        let payload = self.contract.evaluate("GetAllAssets", &[]).await?;
        let assets = AssetCodec::decode_list(&payload)?;
        debug!(count = assets.len(), "listed assets");
        Ok(assets)
    }

    pub async fn read(&self, id: &str) -> AssetResult<Asset> {
        let payload = self.contract.evaluate("ReadAsset", &[id]).await?;
        Ok(AssetCodec::decode(&payload)?)
    }

    pub async fn exists(&self, id: &str) -> AssetResult<bool> {
        let payload = self.contract.evaluate("AssetExists", &[id]).await?;
        serde_json::from_slice(&payload)
            .map_err(|e| AssetError::Codec(CodecError::MalformedPayload(e.to_string())))
    }

    pub async fn create(&self, asset: &Asset) -> AssetResult<Submitted> {
        self.submit_fields("CreateAsset", asset).await
    }

    pub async fn update(&self, asset: &Asset) -> AssetResult<Submitted> {
        self.submit_fields("UpdateAsset", asset).await
    }

    /// Change the owner. The committed result holds the previous owner.
    pub async fn transfer(&self, id: &str, new_owner: &str) -> AssetResult<Submitted> {
        Ok(self
            .contract
            .submit("TransferAsset", &[id, new_owner])
            .await?)
    }

    pub async fn delete(&self, id: &str) -> AssetResult<Submitted> {
        Ok(self.contract.submit("DeleteAsset", &[id]).await?)
    }

    async fn submit_fields(&self, tx_name: &str, asset: &Asset) -> AssetResult<Submitted> {
        let size = asset.size.to_string();
        let value = asset.appraised_value.to_string();
        Ok(self
            .contract
            .submit(
                tx_name,
                &[
                    asset.id.as_str(),
                    asset.color.as_str(),
                    size.as_str(),
                    asset.owner.as_str(),
                    value.as_str(),
                ],
            )
            .await?)
    }
}
