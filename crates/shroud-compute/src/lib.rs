//! # Shroud Compute
//!
//! The confidential-compute seam of the Shroud registry.
//!
//! ## Overview
//!
//! The registry never sees a plaintext role. Everything that touches one
//! (validating an encrypted input, producing a fresh encryption of a
//! constant, comparing a ciphertext against a threshold, deciding who may
//! decrypt what) sits behind the [`ConfidentialCompute`] trait.
//!
//! ## Reference Provider
//!
//! [`LocalCompute`] is an in-process provider for tests and single-node use.
//! It is not homomorphic: it holds each value's content key and evaluates
//! operations by opening the ciphertext internally. What it does model
//! faithfully is the access boundary:
//!
//! 1. **Ciphertexts**: each value is sealed under its own ChaCha20-Poly1305 content key
//! 2. **Access list**: per-handle set of principals allowed to use or decrypt it
//! 3. **Key shares**: on grant, the content key is wrapped to the principal's
//!    registered X25519 key, so only that principal can open it off-line
//! 4. **Input proofs**: inputs are attested with an Ed25519 signature bound to
//!    `(contract, submitter)`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use shroud_compute::{ConfidentialCompute, LocalCompute, X25519StaticSecret};
//! use shroud_core::{InputContext, Keypair, Principal, Role};
//!
//! async fn example() {
//!     let compute = LocalCompute::new();
//!     let alice = Keypair::generate().principal();
//!     let secret = X25519StaticSecret::generate();
//!     compute.register_decryption_key(alice, secret.public_key());
//!
//!     let contract = Principal::from_bytes([0xc0; 32]);
//!     let (handle, proof) = compute
//!         .encrypt_input(Role::User.to_u8(), InputContext::new(contract, alice))
//!         .unwrap();
//!     compute.grant_access(&handle, &alice).await.unwrap();
//!
//!     let value = compute.user_decrypt(&handle, &alice, &secret).unwrap();
//!     assert_eq!(value, Role::User.to_u8());
//! #   let _ = proof;
//! }
//! ```

pub mod acl;
pub mod ciphertext;
pub mod crypto;
pub mod error;
pub mod keyshare;
pub mod local;
pub mod provider;

pub use acl::{AccessGrant, AccessList};
pub use ciphertext::{Ciphertext, CiphertextFormat, ValueKind};
pub use crypto::{ContentKey, Nonce, X25519PublicKey, X25519StaticSecret};
pub use error::{ComputeError, Result};
pub use keyshare::KeyShare;
pub use local::LocalCompute;
pub use provider::ConfidentialCompute;
