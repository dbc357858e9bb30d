//! Sealed values held by the reference provider.

use serde::{Deserialize, Serialize};

use crate::crypto::{ContentKey, Nonce};
use crate::error::{ComputeError, Result};

/// Sealing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum CiphertextFormat {
    ChaCha20Poly1305 = 1,
}

/// The plaintext type a ciphertext encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    /// An 8-bit unsigned integer (roles).
    Uint8,
    /// A boolean (comparison results), stored as 0 or 1.
    Bool,
}

/// One sealed value.
///
/// The sealed plaintext is prefixed with a kind tag, so a boolean cannot
/// be reinterpreted as a role by relabelling `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    pub format: CiphertextFormat,
    pub kind: ValueKind,
    pub nonce: Nonce,
    pub sealed: Vec<u8>,
}

impl Ciphertext {
    /// Seal `value` of `kind` under `key`.
    pub fn seal(value: u8, kind: ValueKind, key: &ContentKey) -> Result<Self> {
        if kind == ValueKind::Bool && value > 1 {
            return Err(ComputeError::TypeMismatch(format!(
                "boolean ciphertext cannot hold {}",
                value
            )));
        }

        let nonce = Nonce::generate();
        let sealed = key.seal(&[kind_tag(kind), value], &nonce)?;
        Ok(Self {
            format: CiphertextFormat::ChaCha20Poly1305,
            kind,
            nonce,
            sealed,
        })
    }

    /// Open with `key`.
    pub fn open(&self, key: &ContentKey) -> Result<u8> {
        let plain = match self.format {
            CiphertextFormat::ChaCha20Poly1305 => key.open(&self.sealed, &self.nonce)?,
        };

        match plain.as_slice() {
            [tag, value] if *tag == kind_tag(self.kind) => Ok(*value),
            [_, _] => Err(ComputeError::Decryption("value kind tag mismatch".into())),
            other => Err(ComputeError::Decryption(format!(
                "unexpected plaintext length {}",
                other.len()
            ))),
        }
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).expect("CBOR serialization failed");
        buf
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes).map_err(|e| ComputeError::Serialization(e.to_string()))
    }
}

fn kind_tag(kind: ValueKind) -> u8 {
    match kind {
        ValueKind::Uint8 => 0x08,
        ValueKind::Bool => 0x01,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_and_open_uint8() {
        let key = ContentKey::generate();
        let ct = Ciphertext::seal(2, ValueKind::Uint8, &key).unwrap();
        assert_eq!(ct.open(&key).unwrap(), 2);
    }

    #[test]
    fn test_bool_range_enforced() {
        let key = ContentKey::generate();
        assert!(Ciphertext::seal(1, ValueKind::Bool, &key).is_ok());
        assert!(matches!(
            Ciphertext::seal(2, ValueKind::Bool, &key),
            Err(ComputeError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_relabelled_kind_rejected() {
        let key = ContentKey::generate();
        let mut ct = Ciphertext::seal(1, ValueKind::Bool, &key).unwrap();
        ct.kind = ValueKind::Uint8;
        assert!(ct.open(&key).is_err());
    }

    #[test]
    fn test_same_value_seals_differently() {
        let key = ContentKey::generate();
        let a = Ciphertext::seal(3, ValueKind::Uint8, &key).unwrap();
        let b = Ciphertext::seal(3, ValueKind::Uint8, &key).unwrap();
        assert_ne!(a.sealed, b.sealed);
    }

    #[test]
    fn test_bytes_roundtrip() {
        let key = ContentKey::generate();
        let ct = Ciphertext::seal(0, ValueKind::Uint8, &key).unwrap();
        let back = Ciphertext::from_bytes(&ct.to_bytes()).unwrap();
        assert_eq!(back.open(&key).unwrap(), 0);
    }
}
