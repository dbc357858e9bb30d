//! # Shroud Core
//!
//! Pure primitives for the Shroud encrypted role registry: principals,
//! ciphertext handles, roles, input proofs and the event log.
//!
//! This crate contains no I/O, no storage and no ciphertext algebra. A
//! [`CiphertextHandle`] is only ever a reference to a value held by the
//! confidential-compute layer; nothing in here can turn one back into a role.
//!
//! ## Key Types
//!
//! - [`Principal`] - An externally authenticated identity (key or contract address)
//! - [`CiphertextHandle`] - Opaque reference to an encrypted value
//! - [`Role`] - The closed set `{NONE, USER, MODERATOR, ADMIN}`
//! - [`InputProof`] - Evidence that a submitted ciphertext was formed for an [`InputContext`]
//! - [`EventRecord`] - Hash-chained `RoleAssigned` / `RoleRevoked` notifications
//!
//! ## Canonicalization
//!
//! Proof messages and event ids are computed over deterministic CBOR. See
//! the [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod event;
pub mod input;
pub mod role;
pub mod types;

pub use canonical::{event_bytes, proof_message};
pub use crypto::{Keypair, Signature};
pub use error::{CoreError, Result};
pub use event::{verify_chain, EventId, EventLog, EventRecord, RoleEvent};
pub use input::{InputContext, InputProof};
pub use role::{Role, ROLE_ADMIN, ROLE_MODERATOR, ROLE_NONE, ROLE_USER};
pub use types::{CiphertextHandle, Principal};
