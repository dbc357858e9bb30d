//! Content-key shares for grant recipients.
//!
//! When a principal is granted access to a handle and has a registered
//! decryption key, the provider wraps the handle's content key to that
//! principal. The share is useless to anyone else.

use serde::{Deserialize, Serialize};

use shroud_core::{CiphertextHandle, Principal};

use crate::crypto::{ephemeral_wrap_key, ContentKey, Nonce, X25519PublicKey, X25519StaticSecret};
use crate::error::{ComputeError, Result};

/// A content key wrapped to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyShare {
    /// The handle whose content key this is.
    pub handle: CiphertextHandle,

    /// Who the share is for.
    pub recipient: Principal,

    /// Sender's ephemeral X25519 public key.
    pub ephemeral_public: X25519PublicKey,

    /// The content key, sealed under the derived wrap key.
    pub wrapped_key: Vec<u8>,

    pub nonce: Nonce,
}

impl KeyShare {
    /// Wrap `content_key` for `recipient`.
    pub fn create(
        handle: CiphertextHandle,
        recipient: Principal,
        recipient_key: &X25519PublicKey,
        content_key: &ContentKey,
    ) -> Result<Self> {
        let context = share_context(&handle, &recipient);
        let (ephemeral_public, wrap_key) = ephemeral_wrap_key(recipient_key, &context);

        let nonce = Nonce::generate();
        let wrapped_key = wrap_key.seal(content_key.as_bytes(), &nonce)?;

        Ok(Self {
            handle,
            recipient,
            ephemeral_public,
            wrapped_key,
            nonce,
        })
    }

    /// Unwrap the content key with the recipient's secret.
    pub fn unwrap_key(&self, secret: &X25519StaticSecret) -> Result<ContentKey> {
        let context = share_context(&self.handle, &self.recipient);
        let wrap_key = secret.wrap_key(&self.ephemeral_public, &context);

        let bytes = wrap_key.open(&self.wrapped_key, &self.nonce)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            ComputeError::Decryption(format!(
                "invalid key length: expected 32, got {}",
                b.len()
            ))
        })?;
        Ok(ContentKey::from_bytes(arr))
    }
}

/// Bind the wrap key to both the handle and the recipient.
fn share_context(handle: &CiphertextHandle, recipient: &Principal) -> Vec<u8> {
    let mut ctx = Vec::with_capacity(64);
    ctx.extend_from_slice(handle.as_bytes());
    ctx.extend_from_slice(recipient.as_bytes());
    ctx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> CiphertextHandle {
        CiphertextHandle::from_bytes([0x42; 32])
    }

    #[test]
    fn test_recipient_unwraps() {
        let secret = X25519StaticSecret::generate();
        let recipient = Principal::from_bytes([1; 32]);
        let key = ContentKey::generate();

        let share = KeyShare::create(handle(), recipient, &secret.public_key(), &key).unwrap();
        assert_eq!(share.unwrap_key(&secret).unwrap(), key);
    }

    #[test]
    fn test_other_secret_fails() {
        let secret = X25519StaticSecret::generate();
        let key = ContentKey::generate();
        let share = KeyShare::create(
            handle(),
            Principal::from_bytes([1; 32]),
            &secret.public_key(),
            &key,
        )
        .unwrap();

        assert!(share.unwrap_key(&X25519StaticSecret::generate()).is_err());
    }

    #[test]
    fn test_share_cannot_be_relabelled() {
        let secret = X25519StaticSecret::generate();
        let key = ContentKey::generate();
        let mut share = KeyShare::create(
            handle(),
            Principal::from_bytes([1; 32]),
            &secret.public_key(),
            &key,
        )
        .unwrap();

        share.handle = CiphertextHandle::from_bytes([0x43; 32]);
        assert!(share.unwrap_key(&secret).is_err());
    }
}
