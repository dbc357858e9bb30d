//! Error types for the compute layer.

use shroud_core::{CiphertextHandle, Principal};
use thiserror::Error;

/// Errors that can occur in the confidential-compute layer.
#[derive(Debug, Error)]
pub enum ComputeError {
    /// The submitted ciphertext is not one the provider issued.
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// The validity proof was rejected.
    #[error("invalid input proof: {0}")]
    InvalidProof(String),

    /// No ciphertext is registered under this handle.
    #[error("unknown handle: {0:?}")]
    UnknownHandle(CiphertextHandle),

    /// The principal holds no grant on the handle.
    #[error("access denied: {principal:?} on {handle:?}")]
    AccessDenied {
        handle: CiphertextHandle,
        principal: Principal,
    },

    /// The provider refused or failed to record a grant.
    #[error("grant failed for {principal:?}: {reason}")]
    GrantFailed { principal: Principal, reason: String },

    /// The provider is not reachable. Callers must fail closed.
    #[error("compute provider unavailable")]
    Unavailable,

    /// A grant exists but no key share was issued for this principal.
    #[error("no key share for {principal:?} on {handle:?}")]
    NoKeyShare {
        handle: CiphertextHandle,
        principal: Principal,
    },

    /// The operation is not defined for this value kind.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Encryption error.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Decryption error.
    #[error("decryption error: {0}")]
    Decryption(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] shroud_core::CoreError),
}

/// Result type for compute operations.
pub type Result<T> = std::result::Result<T, ComputeError>;
