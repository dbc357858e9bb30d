//! Encrypted inputs and their validity proofs.
//!
//! A client encrypts a value through the compute layer and receives a
//! handle plus an [`InputProof`]. The proof binds the handle to the
//! contract that will consume it and to the account that submits it, so a
//! ciphertext lifted from one registry call cannot be replayed by another
//! caller or against another registry.

use serde::{Deserialize, Serialize};

use crate::canonical::proof_message;
use crate::crypto::{Keypair, Signature};
use crate::error::Result;
use crate::types::{CiphertextHandle, Principal};

/// Where an encrypted input may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputContext {
    /// The contract that will consume the input.
    pub contract: Principal,

    /// The account submitting the input.
    pub user: Principal,
}

impl InputContext {
    pub fn new(contract: Principal, user: Principal) -> Self {
        Self { contract, user }
    }
}

/// Proof that a ciphertext handle is a well-formed encryption for a context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputProof {
    /// The context the issuer attested.
    pub context: InputContext,

    /// Issuer signature over `proof_message(handle, context)`.
    pub signature: Signature,
}

impl InputProof {
    /// Issue a proof for `handle` in `context`.
    pub fn issue(issuer: &Keypair, handle: &CiphertextHandle, context: InputContext) -> Self {
        let message = proof_message(handle, &context);
        Self {
            context,
            signature: issuer.sign(&message),
        }
    }

    /// Check the issuer signature for `handle`.
    ///
    /// This only checks the signature; whether `context` is the one the
    /// caller expects is up to the verifier.
    pub fn verify(&self, issuer: &Principal, handle: &CiphertextHandle) -> Result<()> {
        let message = proof_message(handle, &self.context);
        issuer.verify(&message, &self.signature)
    }

    /// Serialize to CBOR bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).expect("CBOR serialization failed");
        buf
    }

    /// Deserialize from CBOR bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader(bytes)
            .map_err(|e| crate::error::CoreError::DecodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Keypair, CiphertextHandle, InputContext) {
        let issuer = Keypair::from_seed(&[9; 32]);
        let handle = CiphertextHandle::from_bytes([0x11; 32]);
        let context = InputContext::new(
            Principal::from_bytes([0xc0; 32]),
            Keypair::from_seed(&[1; 32]).principal(),
        );
        (issuer, handle, context)
    }

    #[test]
    fn test_issued_proof_verifies() {
        let (issuer, handle, context) = setup();
        let proof = InputProof::issue(&issuer, &handle, context);
        assert!(proof.verify(&issuer.principal(), &handle).is_ok());
    }

    #[test]
    fn test_proof_is_bound_to_handle() {
        let (issuer, handle, context) = setup();
        let proof = InputProof::issue(&issuer, &handle, context);
        let other = CiphertextHandle::from_bytes([0x12; 32]);
        assert!(proof.verify(&issuer.principal(), &other).is_err());
    }

    #[test]
    fn test_tampered_context_fails() {
        let (issuer, handle, context) = setup();
        let mut proof = InputProof::issue(&issuer, &handle, context);
        proof.context.user = Principal::from_bytes([0xee; 32]);
        assert!(proof.verify(&issuer.principal(), &handle).is_err());
    }

    #[test]
    fn test_wrong_issuer_fails() {
        let (issuer, handle, context) = setup();
        let proof = InputProof::issue(&issuer, &handle, context);
        let impostor = Keypair::from_seed(&[10; 32]);
        assert!(proof.verify(&impostor.principal(), &handle).is_err());
    }

    #[test]
    fn test_proof_bytes_roundtrip() {
        let (issuer, handle, context) = setup();
        let proof = InputProof::issue(&issuer, &handle, context);
        assert_eq!(InputProof::from_bytes(&proof.to_bytes()).unwrap(), proof);
    }
}
