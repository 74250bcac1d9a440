use tracing::info;

use crate::credentials::MspCredentials;
use crate::error::WalletResult;
use crate::traits::{IdentityStore, PutMode};

/// Outcome of [`ensure_identity`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provisioned {
    /// The label was already present; the credential source was not read.
    Existing,
    /// The credential source was read and stored under the label.
    Created,
}

/// Make sure `label` is present in `store`, importing it from `source` on
/// first use.
///
/// An existing entry is left untouched. Use [`reimport_identity`] to replace
/// it.
pub fn ensure_identity(
    store: &dyn IdentityStore,
    label: &str,
    msp_id: &str,
    source: &MspCredentials,
) -> WalletResult<Provisioned> {
    if store.exists(label)? {
        return Ok(Provisioned::Existing);
    }
    info!(label, msp_id, msp_dir = %source.msp_dir().display(), "populating wallet");
    let identity = source.load(msp_id)?;
    store.put(label, &identity, PutMode::CreateNew)?;
    Ok(Provisioned::Created)
}

/// Replace whatever `label` holds with a fresh read of `source`.
///
/// The source is read before the store is touched, so a failing source
/// leaves the stored identity in place.
pub fn reimport_identity(
    store: &dyn IdentityStore,
    label: &str,
    msp_id: &str,
    source: &MspCredentials,
) -> WalletResult<Provisioned> {
    info!(label, msp_id, msp_dir = %source.msp_dir().display(), "re-importing identity");
    let identity = source.load(msp_id)?;
    store.put(label, &identity, PutMode::Overwrite)?;
    Ok(Provisioned::Created)
}
