//! Error types for Shroud Core.

use thiserror::Error;

use crate::event::EventId;

/// Errors raised by the core primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("unknown role ordinal: {0}")]
    UnknownRole(u8),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("event chain broken at seq {seq}: expected prev {expected:?}, got {got:?}")]
    BrokenChain {
        seq: u64,
        expected: Option<EventId>,
        got: Option<EventId>,
    },

    #[error("event sequence gap: expected {expected}, got {got}")]
    SequenceGap { expected: u64, got: u64 },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
