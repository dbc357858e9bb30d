//! The provider trait: the registry's only route to encrypted values.

use async_trait::async_trait;
use shroud_core::{CiphertextHandle, InputContext, InputProof, Principal};

use crate::error::Result;

/// Operations the registry needs from a confidential-compute layer.
///
/// Implementations own the ciphertexts and the access lists. The registry
/// only ever holds handles.
///
/// # Failure
///
/// Any method may return [`ComputeError::Unavailable`](crate::ComputeError::Unavailable).
/// Callers must treat that as a refusal and not proceed with unverified
/// input or unrecorded grants.
#[async_trait]
pub trait ConfidentialCompute: Send + Sync {
    /// Check that `candidate` is a well-formed encryption attested by `proof`
    /// for exactly `context`, and return the handle to store.
    async fn verify_encryption(
        &self,
        candidate: &CiphertextHandle,
        proof: &InputProof,
        context: &InputContext,
    ) -> Result<CiphertextHandle>;

    /// Produce a fresh encryption of a public constant.
    async fn trivial_encrypt(&self, value: u8) -> Result<CiphertextHandle>;

    /// Allow `principal` to decrypt and operate on `handle`.
    async fn grant_access(&self, handle: &CiphertextHandle, principal: &Principal) -> Result<()>;

    /// Withdraw a grant. Used to undo grants of a call that did not commit.
    async fn revoke_access(&self, handle: &CiphertextHandle, principal: &Principal) -> Result<()>;

    /// Drop a ciphertext and every grant on it.
    ///
    /// Used to release a handle minted by a call that did not commit.
    async fn discard(&self, handle: &CiphertextHandle) -> Result<()>;

    /// Whether `principal` currently holds a grant on `handle`.
    async fn is_allowed(&self, handle: &CiphertextHandle, principal: &Principal) -> Result<bool>;

    /// Encrypted `value(handle) >= threshold`.
    ///
    /// `requester` must hold a grant on `handle`; it receives a grant on the
    /// returned boolean handle.
    async fn compare_ge(
        &self,
        handle: &CiphertextHandle,
        threshold: u8,
        requester: &Principal,
    ) -> Result<CiphertextHandle>;
}
