use lgw_types::X509Identity;

use crate::error::{WalletError, WalletResult};

/// Whether `put` may replace an existing identity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PutMode {
    /// Fail with [`WalletError::DuplicateIdentity`] if the label is taken.
    #[default]
    CreateNew,
    /// Replace any identity stored under the label.
    Overwrite,
}

/// Durable map from label to identity.
///
/// All implementations must satisfy these invariants:
/// - At most one identity per label.
/// - `exists` and `get` have no side effects.
/// - Writes are serialized; concurrent reads are always safe.
/// - All I/O errors are propagated, never silently ignored.
pub trait IdentityStore: Send + Sync {
    /// Check whether an identity is stored under `label`.
    fn exists(&self, label: &str) -> WalletResult<bool>;

    /// Store `identity` under `label`.
    ///
    /// With [`PutMode::CreateNew`], fails with
    /// [`WalletError::DuplicateIdentity`] if the label is already present.
    fn put(&self, label: &str, identity: &X509Identity, mode: PutMode) -> WalletResult<()>;

    /// Load the identity stored under `label`.
    ///
    /// Fails with [`WalletError::NotFound`] if there is none.
    fn get(&self, label: &str) -> WalletResult<X509Identity>;

    /// Delete the identity under `label`. Returns `true` if it existed.
    fn remove(&self, label: &str) -> WalletResult<bool>;

    /// All stored labels, sorted.
    fn labels(&self) -> WalletResult<Vec<String>>;
}

/// Reject labels that cannot double as a file name.
pub fn validate_label(label: &str) -> WalletResult<()> {
    let reason = if label.is_empty() {
        Some("empty")
    } else if label.starts_with('.') {
        Some("leading dot")
    } else if label.contains(['/', '\\']) {
        Some("path separator")
    } else if label.chars().any(char::is_control) {
        Some("control character")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(WalletError::InvalidLabel {
            label: label.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_labels_accepted() {
        validate_label("appUser").unwrap();
        validate_label("User1@org1.example.com").unwrap();
    }

    #[test]
    fn unsafe_labels_rejected() {
        for label in ["", ".hidden", "../etc", "a/b", "a\\b", "tab\there"] {
            assert!(
                matches!(validate_label(label), Err(WalletError::InvalidLabel { .. })),
                "{label:?} should be rejected"
            );
        }
    }

    #[test]
    fn default_mode_is_create_new() {
        assert_eq!(PutMode::default(), PutMode::CreateNew);
    }
}
