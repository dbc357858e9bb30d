//! In-memory implementation of the Store trait.
//!
//! Primarily for testing. Same semantics as SQLite, no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use shroud_core::{CiphertextHandle, EventLog, EventRecord, Principal, RoleEvent};

use crate::error::{Result, StoreError};
use crate::traits::{RegistryMetadata, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    metadata: Option<RegistryMetadata>,

    /// Role mapping, ordered by principal bytes.
    roles: BTreeMap<Principal, CiphertextHandle>,

    log: EventLog,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::InvalidData(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::InvalidData(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_metadata(&self) -> Result<Option<RegistryMetadata>> {
        Ok(self.read()?.metadata.clone())
    }

    async fn init_metadata(&self, metadata: &RegistryMetadata) -> Result<()> {
        let mut inner = self.write()?;
        if inner.metadata.is_some() {
            return Err(StoreError::AlreadyInitialized);
        }
        inner.metadata = Some(metadata.clone());
        Ok(())
    }

    async fn get_role(&self, principal: &Principal) -> Result<Option<CiphertextHandle>> {
        Ok(self.read()?.roles.get(principal).copied())
    }

    async fn list_principals(&self) -> Result<Vec<Principal>> {
        Ok(self.read()?.roles.keys().copied().collect())
    }

    async fn commit(
        &self,
        principal: &Principal,
        handle: &CiphertextHandle,
        event: RoleEvent,
    ) -> Result<EventRecord> {
        let mut inner = self.write()?;
        if inner.metadata.is_none() {
            return Err(StoreError::NotInitialized);
        }

        inner.roles.insert(*principal, *handle);
        Ok(inner.log.append(event).clone())
    }

    async fn event_head(&self) -> Result<Option<EventRecord>> {
        Ok(self.read()?.log.head().cloned())
    }

    async fn events_since(&self, after_seq: u64) -> Result<Vec<EventRecord>> {
        Ok(self.read()?.log.since(after_seq).to_vec())
    }

    async fn events_for(&self, principal: &Principal) -> Result<Vec<EventRecord>> {
        Ok(self
            .read()?
            .log
            .for_principal(principal)
            .into_iter()
            .cloned()
            .collect())
    }
}
