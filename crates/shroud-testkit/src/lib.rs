//! # Shroud Testkit
//!
//! Testing utilities for the Shroud role registry.
//!
//! ## Overview
//!
//! - **Fixtures**: an owner, a reference provider and a registry wired together
//! - **Generators**: proptest strategies for roles, principals and operation sequences
//! - **Faults**: provider and store wrappers that fail on demand
//! - **Golden vectors**: fixed canonical encodings of events and proof messages
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use shroud_testkit::fixtures::RegistryFixture;
//! use shroud::Role;
//!
//! async fn example() {
//!     let mut fx = RegistryFixture::new().await;
//!     let alice = fx.party(2);
//!
//!     fx.assign(&alice.principal, Role::User).await.unwrap();
//!     assert_eq!(fx.role_of(&alice).await.unwrap(), Role::User.to_u8());
//! }
//! ```
//!
//! ## Golden Vectors
//!
//! ```rust
//! use shroud_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().unwrap();
//! ```

pub mod faults;
pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use faults::{Fault, FlakyCompute, FlakyStore};
pub use fixtures::{RegistryFixture, TestParty};
pub use generators::RoleOp;
pub use vectors::{all_event_vectors, verify_all_vectors, EventVector};
