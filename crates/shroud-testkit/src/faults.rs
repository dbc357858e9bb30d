//! Fault injection for the provider and the store.
//!
//! Wrappers that delegate to a real implementation until told to fail.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use shroud_compute::{ComputeError, ConfidentialCompute};
use shroud_core::{CiphertextHandle, EventRecord, InputContext, InputProof, Principal, RoleEvent};
use shroud_store::{RegistryMetadata, Store, StoreError};

/// A provider failure to inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// `grant_access` to this principal fails.
    GrantTo(Principal),
    /// Every call fails with `Unavailable`.
    Unavailable,
}

/// A provider that fails on demand.
pub struct FlakyCompute<C> {
    inner: Arc<C>,
    fault: RwLock<Option<Fault>>,
}

impl<C: ConfidentialCompute> FlakyCompute<C> {
    pub fn new(inner: Arc<C>) -> Self {
        Self {
            inner,
            fault: RwLock::new(None),
        }
    }

    pub fn inner(&self) -> &Arc<C> {
        &self.inner
    }

    /// Install `fault`, replacing any previous one.
    pub fn inject(&self, fault: Fault) {
        *self.fault.write().unwrap() = Some(fault);
    }

    pub fn clear(&self) {
        *self.fault.write().unwrap() = None;
    }

    fn check(&self) -> Result<(), ComputeError> {
        match *self.fault.read().unwrap() {
            Some(Fault::Unavailable) => Err(ComputeError::Unavailable),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<C: ConfidentialCompute> ConfidentialCompute for FlakyCompute<C> {
    async fn verify_encryption(
        &self,
        candidate: &CiphertextHandle,
        proof: &InputProof,
        context: &InputContext,
    ) -> Result<CiphertextHandle, ComputeError> {
        self.check()?;
        self.inner.verify_encryption(candidate, proof, context).await
    }

    async fn trivial_encrypt(&self, value: u8) -> Result<CiphertextHandle, ComputeError> {
        self.check()?;
        self.inner.trivial_encrypt(value).await
    }

    async fn grant_access(
        &self,
        handle: &CiphertextHandle,
        principal: &Principal,
    ) -> Result<(), ComputeError> {
        self.check()?;
        if *self.fault.read().unwrap() == Some(Fault::GrantTo(*principal)) {
            return Err(ComputeError::GrantFailed {
                principal: *principal,
                reason: "injected fault".into(),
            });
        }
        self.inner.grant_access(handle, principal).await
    }

    async fn revoke_access(
        &self,
        handle: &CiphertextHandle,
        principal: &Principal,
    ) -> Result<(), ComputeError> {
        self.check()?;
        self.inner.revoke_access(handle, principal).await
    }

    async fn discard(&self, handle: &CiphertextHandle) -> Result<(), ComputeError> {
        self.check()?;
        self.inner.discard(handle).await
    }

    async fn is_allowed(
        &self,
        handle: &CiphertextHandle,
        principal: &Principal,
    ) -> Result<bool, ComputeError> {
        self.check()?;
        self.inner.is_allowed(handle, principal).await
    }

    async fn compare_ge(
        &self,
        handle: &CiphertextHandle,
        threshold: u8,
        requester: &Principal,
    ) -> Result<CiphertextHandle, ComputeError> {
        self.check()?;
        self.inner.compare_ge(handle, threshold, requester).await
    }
}

/// A store whose `commit` fails on demand.
///
/// Shares the wrapped store, so state written through it stays visible
/// through the handle kept by the test.
pub struct FlakyStore<S> {
    inner: Arc<S>,
    fail_commits: AtomicBool,
}

impl<S: Store> FlakyStore<S> {
    pub fn new(inner: Arc<S>) -> Self {
        Self {
            inner,
            fail_commits: AtomicBool::new(false),
        }
    }

    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl<S: Store> Store for FlakyStore<S> {
    async fn load_metadata(&self) -> shroud_store::Result<Option<RegistryMetadata>> {
        self.inner.load_metadata().await
    }

    async fn init_metadata(&self, metadata: &RegistryMetadata) -> shroud_store::Result<()> {
        self.inner.init_metadata(metadata).await
    }

    async fn get_role(&self, principal: &Principal) -> shroud_store::Result<Option<CiphertextHandle>> {
        self.inner.get_role(principal).await
    }

    async fn list_principals(&self) -> shroud_store::Result<Vec<Principal>> {
        self.inner.list_principals().await
    }

    async fn commit(
        &self,
        principal: &Principal,
        handle: &CiphertextHandle,
        event: RoleEvent,
    ) -> shroud_store::Result<EventRecord> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::InvalidData("injected commit failure".into()));
        }
        self.inner.commit(principal, handle, event).await
    }

    async fn event_head(&self) -> shroud_store::Result<Option<EventRecord>> {
        self.inner.event_head().await
    }

    async fn events_since(&self, after_seq: u64) -> shroud_store::Result<Vec<EventRecord>> {
        self.inner.events_since(after_seq).await
    }

    async fn events_for(&self, principal: &Principal) -> shroud_store::Result<Vec<EventRecord>> {
        self.inner.events_for(principal).await
    }
}
