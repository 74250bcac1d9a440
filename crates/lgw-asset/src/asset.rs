use serde::{Deserialize, Serialize};

/// A ledger asset.
///
/// The ID is assigned by the caller; uniqueness and every other business
/// rule are enforced by the contract, not here.
///
/// Field declaration order is the wire order: alphabetic by JSON name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "AppraisedValue")]
    pub appraised_value: i64,
    #[serde(rename = "Color")]
    pub color: String,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Owner")]
    pub owner: String,
    #[serde(rename = "Size")]
    pub size: i64,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        color: impl Into<String>,
        size: i64,
        owner: impl Into<String>,
        appraised_value: i64,
    ) -> Self {
        Self {
            appraised_value,
            color: color.into(),
            id: id.into(),
            owner: owner.into(),
            size,
        }
    }

    /// Copy of this asset with a different owner.
    pub fn with_owner(&self, owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            ..self.clone()
        }
    }
}
