//! Symmetric sealing and X25519 key agreement.
//!
//! Content keys seal ciphertext payloads with ChaCha20-Poly1305. Key
//! shares wrap a content key to a recipient via ephemeral-static X25519.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use crate::error::{ComputeError, Result};

/// Domain for wrap keys derived from an X25519 shared secret.
const WRAP_KEY_DOMAIN: &str = "shroud-compute-v0 key-share wrap";

/// An X25519 public key (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct X25519PublicKey(pub [u8; 32]);

impl X25519PublicKey {
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn to_dalek(self) -> PublicKey {
        PublicKey::from(self.0)
    }
}

impl From<PublicKey> for X25519PublicKey {
    fn from(pk: PublicKey) -> Self {
        Self(*pk.as_bytes())
    }
}

/// A principal's long-lived decryption secret.
///
/// Held by the principal, never by the registry or the provider.
pub struct X25519StaticSecret(StaticSecret);

impl X25519StaticSecret {
    /// Generate a new random secret.
    pub fn generate() -> Self {
        Self(StaticSecret::random_from_rng(rand::thread_rng()))
    }

    /// Create from seed bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(StaticSecret::from(bytes))
    }

    pub fn public_key(&self) -> X25519PublicKey {
        X25519PublicKey::from(PublicKey::from(&self.0))
    }

    /// Derive the wrap key for a share sent from `ephemeral` under `context`.
    pub(crate) fn wrap_key(&self, ephemeral: &X25519PublicKey, context: &[u8]) -> ContentKey {
        let shared = self.0.diffie_hellman(&ephemeral.to_dalek());
        derive_wrap_key(shared.as_bytes(), context)
    }
}

/// Sender side of a one-shot key agreement.
///
/// Returns the ephemeral public key to publish and the derived wrap key.
pub(crate) fn ephemeral_wrap_key(
    recipient: &X25519PublicKey,
    context: &[u8],
) -> (X25519PublicKey, ContentKey) {
    let secret = EphemeralSecret::random_from_rng(rand::thread_rng());
    let public = X25519PublicKey::from(PublicKey::from(&secret));
    let shared = secret.diffie_hellman(&recipient.to_dalek());
    (public, derive_wrap_key(shared.as_bytes(), context))
}

fn derive_wrap_key(shared: &[u8; 32], context: &[u8]) -> ContentKey {
    let mut hasher = blake3::Hasher::new_derive_key(WRAP_KEY_DOMAIN);
    hasher.update(shared);
    hasher.update(context);
    ContentKey(*hasher.finalize().as_bytes())
}

/// A 256-bit ChaCha20-Poly1305 key.
#[derive(Clone, PartialEq, Eq)]
pub struct ContentKey([u8; 32]);

impl ContentKey {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Seal `plaintext` under this key with `nonce`.
    pub fn seal(&self, plaintext: &[u8], nonce: &Nonce) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| ComputeError::Encryption(e.to_string()))?;
        cipher
            .encrypt(chacha20poly1305::Nonce::from_slice(&nonce.0), plaintext)
            .map_err(|e| ComputeError::Encryption(e.to_string()))
    }

    /// Open a sealed buffer. Fails on a wrong key or any tampering.
    pub fn open(&self, sealed: &[u8], nonce: &Nonce) -> Result<Vec<u8>> {
        let cipher = ChaCha20Poly1305::new_from_slice(&self.0)
            .map_err(|e| ComputeError::Decryption(e.to_string()))?;
        cipher
            .decrypt(chacha20poly1305::Nonce::from_slice(&nonce.0), sealed)
            .map_err(|e| ComputeError::Decryption(e.to_string()))
    }
}

impl std::fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ContentKey(..)")
    }
}

/// A 96-bit AEAD nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nonce(pub [u8; 12]);

impl Nonce {
    pub fn generate() -> Self {
        let mut bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open() {
        let key = ContentKey::generate();
        let nonce = Nonce::generate();

        let sealed = key.seal(&[3], &nonce).unwrap();
        assert_ne!(sealed, vec![3]);
        assert_eq!(key.open(&sealed, &nonce).unwrap(), vec![3]);
    }

    #[test]
    fn test_open_with_wrong_key_fails() {
        let nonce = Nonce::generate();
        let sealed = ContentKey::generate().seal(&[1], &nonce).unwrap();
        assert!(ContentKey::generate().open(&sealed, &nonce).is_err());
    }

    #[test]
    fn test_wrap_key_agreement() {
        let recipient = X25519StaticSecret::generate();
        let (ephemeral, sender_key) = ephemeral_wrap_key(&recipient.public_key(), b"ctx");

        assert_eq!(recipient.wrap_key(&ephemeral, b"ctx"), sender_key);
        assert_ne!(recipient.wrap_key(&ephemeral, b"other"), sender_key);
    }

    #[test]
    fn test_debug_does_not_print_key() {
        let key = ContentKey::from_bytes([0xab; 32]);
        assert!(!format!("{:?}", key).contains("ab"));
    }
}
