//! In-process reference provider.
//!
//! Keeps every ciphertext, content key and access entry in memory. It
//! opens ciphertexts internally to evaluate operations, which a real
//! homomorphic backend would not do, but it enforces the same access
//! boundary: a principal can only read a value through a key share that
//! was issued to them on grant.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::{debug, trace};

use shroud_core::{CiphertextHandle, InputContext, InputProof, Keypair, Principal};

use crate::acl::AccessList;
use crate::ciphertext::{Ciphertext, ValueKind};
use crate::crypto::{ContentKey, X25519PublicKey, X25519StaticSecret};
use crate::error::{ComputeError, Result};
use crate::keyshare::KeyShare;
use crate::provider::ConfidentialCompute;

const HANDLE_DOMAIN: &str = "shroud-compute-v0 ciphertext handle";

/// Reference confidential-compute provider.
///
/// Thread-safe via RwLock. Can be switched offline with
/// [`set_available`](Self::set_available) to exercise fail-closed paths.
pub struct LocalCompute {
    /// Signs input proofs.
    issuer: Keypair,
    available: AtomicBool,
    inner: RwLock<LocalComputeInner>,
}

#[derive(Default)]
struct LocalComputeInner {
    values: HashMap<CiphertextHandle, StoredValue>,

    /// Handles issued by `encrypt_input`, with the context they are bound to.
    inputs: HashMap<CiphertextHandle, InputContext>,

    acl: AccessList,
    shares: HashMap<(CiphertextHandle, Principal), KeyShare>,
    decryption_keys: HashMap<Principal, X25519PublicKey>,

    /// Monotonic operation counter; also salts handle derivation.
    ops: u64,
}

struct StoredValue {
    ciphertext: Ciphertext,
    key: ContentKey,
}

impl LocalComputeInner {
    fn store(&mut self, value: u8, kind: ValueKind) -> Result<CiphertextHandle> {
        let key = ContentKey::generate();
        let ciphertext = Ciphertext::seal(value, kind, &key)?;

        self.ops += 1;
        let mut hasher = blake3::Hasher::new_derive_key(HANDLE_DOMAIN);
        hasher.update(&self.ops.to_be_bytes());
        hasher.update(&ciphertext.to_bytes());
        let handle = CiphertextHandle::from_bytes(*hasher.finalize().as_bytes());

        self.values.insert(handle, StoredValue { ciphertext, key });
        Ok(handle)
    }

    fn open(&self, handle: &CiphertextHandle) -> Result<u8> {
        if handle.is_absent() {
            return Ok(0);
        }
        let stored = self
            .values
            .get(handle)
            .ok_or(ComputeError::UnknownHandle(*handle))?;
        stored.ciphertext.open(&stored.key)
    }

    /// Grant `principal` on `handle`. Re-granting a held handle changes nothing.
    fn grant(&mut self, handle: &CiphertextHandle, principal: &Principal) -> Result<()> {
        let stored = self
            .values
            .get(handle)
            .ok_or(ComputeError::UnknownHandle(*handle))?;
        if self.acl.is_allowed(handle, principal) {
            return Ok(());
        }

        let share = match self.decryption_keys.get(principal) {
            Some(pk) => Some(
                KeyShare::create(*handle, *principal, pk, &stored.key).map_err(|e| {
                    ComputeError::GrantFailed {
                        principal: *principal,
                        reason: e.to_string(),
                    }
                })?,
            ),
            None => None,
        };

        self.ops += 1;
        let at = self.ops;
        self.acl.allow(*handle, *principal, at);
        if let Some(share) = share {
            self.shares.insert((*handle, *principal), share);
        }
        Ok(())
    }

    fn discard(&mut self, handle: &CiphertextHandle) -> usize {
        self.values.remove(handle);
        self.inputs.remove(handle);
        self.shares.retain(|(h, _), _| h != handle);
        self.acl.forget(handle)
    }
}

impl LocalCompute {
    /// Create a provider with a random proof-issuing key.
    pub fn new() -> Self {
        Self::with_issuer(Keypair::generate())
    }

    /// Create a provider that signs input proofs with `issuer`.
    pub fn with_issuer(issuer: Keypair) -> Self {
        Self {
            issuer,
            available: AtomicBool::new(true),
            inner: RwLock::new(LocalComputeInner::default()),
        }
    }

    /// The principal whose signature input proofs carry.
    pub fn issuer(&self) -> Principal {
        self.issuer.principal()
    }

    /// Take the provider on- or offline.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Register the X25519 key that future key shares for `principal` are wrapped to.
    ///
    /// Grants issued before registration carry no key share.
    pub fn register_decryption_key(&self, principal: Principal, key: X25519PublicKey) {
        if let Ok(mut inner) = self.inner.write() {
            inner.decryption_keys.insert(principal, key);
        }
    }

    /// Encrypt a client value for use by `context.user` against `context.contract`.
    pub fn encrypt_input(
        &self,
        value: u8,
        context: InputContext,
    ) -> Result<(CiphertextHandle, InputProof)> {
        self.ensure_available()?;
        let mut inner = self.write()?;

        let handle = inner.store(value, ValueKind::Uint8)?;
        inner.inputs.insert(handle, context);
        let proof = InputProof::issue(&self.issuer, &handle, context);

        trace!(handle = %handle, contract = %context.contract, "issued encrypted input");
        Ok((handle, proof))
    }

    /// Decrypt `handle` on behalf of `principal` using their secret.
    ///
    /// The absent sentinel decrypts to 0 for anyone. Any other handle needs
    /// both a grant and a key share for `principal`.
    pub fn user_decrypt(
        &self,
        handle: &CiphertextHandle,
        principal: &Principal,
        secret: &X25519StaticSecret,
    ) -> Result<u8> {
        self.ensure_available()?;
        if handle.is_absent() {
            return Ok(0);
        }

        let inner = self.read()?;
        if !inner.acl.is_allowed(handle, principal) {
            return Err(ComputeError::AccessDenied {
                handle: *handle,
                principal: *principal,
            });
        }

        let share = inner
            .shares
            .get(&(*handle, *principal))
            .ok_or(ComputeError::NoKeyShare {
                handle: *handle,
                principal: *principal,
            })?;
        let key = share.unwrap_key(secret)?;

        let stored = inner
            .values
            .get(handle)
            .ok_or(ComputeError::UnknownHandle(*handle))?;
        stored.ciphertext.open(&key)
    }

    /// The key share issued to `principal` for `handle`, if any.
    pub fn key_share(&self, handle: &CiphertextHandle, principal: &Principal) -> Option<KeyShare> {
        self.inner
            .read()
            .ok()
            .and_then(|inner| inner.shares.get(&(*handle, *principal)).cloned())
    }

    /// Principals holding a grant on `handle`.
    pub fn holders(&self, handle: &CiphertextHandle) -> Vec<Principal> {
        self.inner
            .read()
            .map(|inner| inner.acl.holders(handle))
            .unwrap_or_default()
    }

    /// Number of ciphertexts held.
    pub fn ciphertext_count(&self) -> usize {
        self.inner.read().map(|i| i.values.len()).unwrap_or(0)
    }

    fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(ComputeError::Unavailable)
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, LocalComputeInner>> {
        self.inner.read().map_err(|_| ComputeError::Unavailable)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, LocalComputeInner>> {
        self.inner.write().map_err(|_| ComputeError::Unavailable)
    }
}

impl Default for LocalCompute {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfidentialCompute for LocalCompute {
    async fn verify_encryption(
        &self,
        candidate: &CiphertextHandle,
        proof: &InputProof,
        context: &InputContext,
    ) -> Result<CiphertextHandle> {
        self.ensure_available()?;

        if candidate.is_absent() {
            return Err(ComputeError::InvalidCiphertext("absent handle".into()));
        }
        if proof.context != *context {
            return Err(ComputeError::InvalidProof(
                "proof is bound to a different contract or submitter".into(),
            ));
        }
        proof
            .verify(&self.issuer.principal(), candidate)
            .map_err(|e| ComputeError::InvalidProof(e.to_string()))?;

        let inner = self.read()?;
        match inner.inputs.get(candidate) {
            Some(bound) if bound == context => Ok(*candidate),
            Some(_) => Err(ComputeError::InvalidProof(
                "handle was issued for a different context".into(),
            )),
            None => Err(ComputeError::InvalidCiphertext(
                "handle was not issued as an input".into(),
            )),
        }
    }

    async fn trivial_encrypt(&self, value: u8) -> Result<CiphertextHandle> {
        self.ensure_available()?;
        self.write()?.store(value, ValueKind::Uint8)
    }

    async fn grant_access(&self, handle: &CiphertextHandle, principal: &Principal) -> Result<()> {
        self.ensure_available()?;
        self.write()?.grant(handle, principal)?;
        debug!(handle = %handle, principal = %principal, "granted access");
        Ok(())
    }

    async fn revoke_access(&self, handle: &CiphertextHandle, principal: &Principal) -> Result<()> {
        self.ensure_available()?;
        let mut inner = self.write()?;
        inner.acl.deny(handle, principal);
        inner.shares.remove(&(*handle, *principal));
        debug!(handle = %handle, principal = %principal, "revoked access");
        Ok(())
    }

    async fn discard(&self, handle: &CiphertextHandle) -> Result<()> {
        self.ensure_available()?;
        let grants = self.write()?.discard(handle);
        debug!(handle = %handle, grants, "discarded ciphertext");
        Ok(())
    }

    async fn is_allowed(&self, handle: &CiphertextHandle, principal: &Principal) -> Result<bool> {
        self.ensure_available()?;
        Ok(self.read()?.acl.is_allowed(handle, principal))
    }

    async fn compare_ge(
        &self,
        handle: &CiphertextHandle,
        threshold: u8,
        requester: &Principal,
    ) -> Result<CiphertextHandle> {
        self.ensure_available()?;
        let mut inner = self.write()?;

        if !handle.is_absent() && !inner.acl.is_allowed(handle, requester) {
            return Err(ComputeError::AccessDenied {
                handle: *handle,
                principal: *requester,
            });
        }

        let value = inner.open(handle)?;
        let result = inner.store(u8::from(value >= threshold), ValueKind::Bool)?;
        inner.grant(&result, requester)?;
        Ok(result)
    }
}
