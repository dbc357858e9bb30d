//! Error types for the registry.

use shroud_compute::ComputeError;
use shroud_core::{CoreError, Principal};
use shroud_store::StoreError;
use thiserror::Error;

/// Errors that can occur during registry operations.
///
/// Every error means the call had no effect: no role written, no event
/// emitted, no grant left behind.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Caller failed the owner check.
    #[error("unauthorized caller {caller}: {message}")]
    Unauthorized {
        caller: Principal,
        message: &'static str,
    },

    /// The provider rejected the submitted ciphertext or its proof.
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(#[source] ComputeError),

    /// Granting access on a new handle failed.
    #[error("permission grant to {principal} failed: {source}")]
    Grant {
        principal: Principal,
        #[source]
        source: ComputeError,
    },

    /// Provider unavailable or failing outside verification.
    #[error("confidential compute error: {0}")]
    Compute(#[source] ComputeError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The persisted event log does not verify.
    #[error("event log error: {0}")]
    EventLog(#[from] CoreError),

    /// The store was initialized by a different owner.
    #[error("store belongs to owner {stored}, not {requested}")]
    OwnerMismatch {
        stored: Principal,
        requested: Principal,
    },

    /// Configuration could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl RegistryError {
    /// Whether this is an authorization failure.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
