//! # Shroud
//!
//! An access-control registry that stores each principal's role as an
//! opaque encrypted value. Observers of the store or the event log learn
//! who was touched and when, never which role they hold.
//!
//! ## Overview
//!
//! - **Roles** are ordinals `NONE < USER < MODERATOR < ADMIN`, only ever
//!   held as ciphertext handles.
//! - **Writes** (`assign_role`, `revoke_role`) are owner-only. Each one
//!   verifies its input through the confidential-compute provider, grants
//!   the target access to the new handle and appends an identity-only event.
//! - **Reads** (`get_encrypted_role`) return the caller's own handle. Only
//!   a principal holding a grant can have it decrypted.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shroud::{RegistryConfig, Role, RoleRegistry};
//! use shroud::compute::{LocalCompute, X25519StaticSecret};
//! use shroud::core::Keypair;
//! use shroud::store::SqliteStore;
//!
//! async fn example() -> shroud::Result<()> {
//!     let owner = Keypair::generate().principal();
//!     let alice = Keypair::generate().principal();
//!     let alice_secret = X25519StaticSecret::generate();
//!
//!     let compute = Arc::new(LocalCompute::new());
//!     compute.register_decryption_key(alice, alice_secret.public_key());
//!
//!     let store = SqliteStore::open("registry.db")?;
//!     let mut registry =
//!         RoleRegistry::create(owner, store, compute.clone(), RegistryConfig::default()).await?;
//!
//!     // The owner encrypts a role bound to this registry and to themselves.
//!     let (handle, proof) = compute
//!         .encrypt_input(Role::Moderator.to_u8(), registry.input_context(&owner))
//!         .unwrap();
//!     registry.assign_role(&owner, &alice, &handle, &proof).await?;
//!
//!     // Alice reads back her handle and decrypts it.
//!     let mine = registry.get_encrypted_role(&alice).await?;
//!     let role = compute.user_decrypt(&mine, &alice, &alice_secret).unwrap();
//!     assert_eq!(role, Role::Moderator.to_u8());
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `shroud::core` - Principals, handles, roles, proofs, events
//! - `shroud::compute` - The provider trait and the local reference provider
//! - `shroud::store` - Storage abstraction and SQLite

pub mod config;
pub mod error;
pub mod policy;
pub mod registry;

// Re-export component crates
pub use shroud_compute as compute;
pub use shroud_core as core;
pub use shroud_store as store;

pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use policy::{AccessPolicy, MinimumRoleCheck, ADMIN_ONLY, OWNER_ONLY};
pub use registry::RoleRegistry;

pub use shroud_core::{
    CiphertextHandle, EventRecord, InputContext, InputProof, Principal, Role, RoleEvent,
    ROLE_ADMIN, ROLE_MODERATOR, ROLE_NONE, ROLE_USER,
};
