//! Store trait: the abstract interface for registry persistence.
//!
//! The registry is storage-agnostic. Implementations include SQLite
//! (primary) and in-memory (for tests).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use shroud_core::{CiphertextHandle, EventRecord, Principal, RoleEvent};

use crate::error::Result;

/// Fixed facts about a registry, recorded once at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMetadata {
    pub owner: Principal,

    /// The registry's own address, derived from owner and name.
    pub address: Principal,

    pub name: String,
}

/// Async interface for registry persistence.
///
/// # Design Notes
///
/// - **One row per touched principal**: entries are replaced, never deleted.
/// - **Atomic commit**: the role write and its event append land together or
///   not at all.
/// - **Chained log**: each committed event links to the previous one by id.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Metadata
    // ─────────────────────────────────────────────────────────────────────────

    /// Load the registry metadata, if the store has been initialized.
    async fn load_metadata(&self) -> Result<Option<RegistryMetadata>>;

    /// Record the registry metadata.
    ///
    /// Fails with `AlreadyInitialized` if metadata is already present.
    async fn init_metadata(&self, metadata: &RegistryMetadata) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Roles
    // ─────────────────────────────────────────────────────────────────────────

    /// The stored handle for `principal`, or None if never touched.
    async fn get_role(&self, principal: &Principal) -> Result<Option<CiphertextHandle>>;

    /// Every principal with an entry, in byte order.
    async fn list_principals(&self) -> Result<Vec<Principal>>;

    /// Replace `principal`'s handle and append `event` in one step.
    ///
    /// Returns the appended record. Fails with `NotInitialized` before
    /// `init_metadata`.
    async fn commit(
        &self,
        principal: &Principal,
        handle: &CiphertextHandle,
        event: RoleEvent,
    ) -> Result<EventRecord>;

    // ─────────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────────

    /// The most recent event record.
    async fn event_head(&self) -> Result<Option<EventRecord>>;

    /// Records with `seq > after_seq`, in order.
    async fn events_since(&self, after_seq: u64) -> Result<Vec<EventRecord>>;

    /// Records about `principal`, in order.
    async fn events_for(&self, principal: &Principal) -> Result<Vec<EventRecord>>;
}

/// Convenience methods on top of [`Store`].
pub trait StoreExt: Store {
    /// The stored handle, or the absent sentinel for an untouched principal.
    fn role_or_absent(
        &self,
        principal: &Principal,
    ) -> impl std::future::Future<Output = Result<CiphertextHandle>> + Send;

    /// The whole event log.
    fn all_events(&self) -> impl std::future::Future<Output = Result<Vec<EventRecord>>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn role_or_absent(&self, principal: &Principal) -> Result<CiphertextHandle> {
        Ok(self
            .get_role(principal)
            .await?
            .unwrap_or(CiphertextHandle::ABSENT))
    }

    async fn all_events(&self) -> Result<Vec<EventRecord>> {
        self.events_since(0).await
    }
}
