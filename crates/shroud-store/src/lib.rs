//! # Shroud Store
//!
//! Persistence for the role registry: the owner record, the role mapping
//! (principal to opaque handle) and the hash-chained event log.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`RegistryMetadata`] - Owner, address and name, recorded once
//!
//! ## Usage
//!
//! ```rust,no_run
//! use shroud_store::{SqliteStore, Store, RegistryMetadata};
//! use shroud_core::{Principal, RoleEvent, CiphertextHandle};
//!
//! async fn example(owner: Principal, handle: CiphertextHandle) {
//!     let store = SqliteStore::open("registry.db").unwrap();
//!
//!     let address = Principal::derive_contract(&owner, "roles");
//!     store
//!         .init_metadata(&RegistryMetadata { owner, address, name: "roles".into() })
//!         .await
//!         .unwrap();
//!
//!     // Role write and event append land together.
//!     let record = store
//!         .commit(&owner, &handle, RoleEvent::RoleAssigned { principal: owner })
//!         .await
//!         .unwrap();
//!     assert_eq!(record.seq, 1);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Handles only**: the store never sees a role value.
//! - **Entries are replaced, never deleted**: revocation writes a handle too.
//! - **Tamper evidence**: stored event ids are checked against recomputed ones on read.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{RegistryMetadata, Store, StoreExt};
