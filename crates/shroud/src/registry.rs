//! The role registry.
//!
//! Holds one opaque handle per touched principal. Writes are owner-gated,
//! go through the provider for verification and grants, and commit the
//! handle together with an identity-only event.

use std::sync::Arc;

use tracing::{debug, info, instrument, trace, warn};

use shroud_compute::{ComputeError, ConfidentialCompute};
use shroud_core::{
    verify_chain, CiphertextHandle, EventRecord, InputContext, InputProof, Principal, Role,
    RoleEvent, ROLE_NONE,
};
use shroud_store::{RegistryMetadata, Store, StoreError, StoreExt};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::policy::{AccessPolicy, ADMIN_ONLY, OWNER_ONLY};

/// Encrypted role registry.
///
/// Mutating operations take `&mut self`, so calls on one registry are
/// totally ordered. Reads take `&self`.
pub struct RoleRegistry<S: Store, C: ConfidentialCompute> {
    store: Arc<S>,
    compute: Arc<C>,
    config: RegistryConfig,
    policy: AccessPolicy,
    /// This registry's own principal; inputs are bound to it.
    address: Principal,
}

impl<S: Store, C: ConfidentialCompute> RoleRegistry<S, C> {
    /// Deploy a new registry owned by `owner` on an empty store.
    ///
    /// Fails with `OwnerMismatch` if the store already belongs to someone
    /// else, or `Store(AlreadyInitialized)` if it is already this owner's.
    pub async fn create(
        owner: Principal,
        store: S,
        compute: Arc<C>,
        config: RegistryConfig,
    ) -> Result<Self> {
        if let Some(existing) = store.load_metadata().await? {
            if existing.owner != owner {
                return Err(RegistryError::OwnerMismatch {
                    stored: existing.owner,
                    requested: owner,
                });
            }
            return Err(StoreError::AlreadyInitialized.into());
        }

        let address = Principal::derive_contract(&owner, &config.name);
        store
            .init_metadata(&RegistryMetadata {
                owner,
                address,
                name: config.name.clone(),
            })
            .await?;

        info!(owner = %owner, address = %address, name = %config.name, "created role registry");
        Ok(Self::assemble(owner, address, store, compute, config))
    }

    /// Reopen a registry from an initialized store.
    ///
    /// Owner, address and name come from the store. A differing configured
    /// name is replaced by the stored one.
    pub async fn open(store: S, compute: Arc<C>, mut config: RegistryConfig) -> Result<Self> {
        let metadata = store
            .load_metadata()
            .await?
            .ok_or(StoreError::NotInitialized)?;

        if metadata.name != config.name {
            debug!(stored = %metadata.name, configured = %config.name, "using stored registry name");
            config.name = metadata.name;
        }

        if config.verify_chain_on_open {
            let events = store.all_events().await?;
            verify_chain(&events)?;
            debug!(events = events.len(), "verified event chain");
        }

        info!(owner = %metadata.owner, address = %metadata.address, "opened role registry");
        Ok(Self::assemble(
            metadata.owner,
            metadata.address,
            store,
            compute,
            config,
        ))
    }

    fn assemble(
        owner: Principal,
        address: Principal,
        store: S,
        compute: Arc<C>,
        config: RegistryConfig,
    ) -> Self {
        Self {
            store: Arc::new(store),
            compute,
            config,
            policy: AccessPolicy::new(owner),
            address,
        }
    }

    pub fn owner(&self) -> &Principal {
        self.policy.owner()
    }

    /// The registry's own principal.
    pub fn address(&self) -> &Principal {
        &self.address
    }

    /// The context submitters must bind their inputs to.
    pub fn input_context(&self, submitter: &Principal) -> InputContext {
        InputContext::new(self.address, *submitter)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn compute(&self) -> &Arc<C> {
        &self.compute
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Store `encrypted_role` as `target`'s role.
    ///
    /// `proof` must bind the ciphertext to this registry and to `caller`.
    /// On success `target` (and the registry, if configured) can use the
    /// new handle and one `RoleAssigned` event has been appended.
    #[instrument(skip_all, fields(caller = %caller, target = %target))]
    pub async fn assign_role(
        &mut self,
        caller: &Principal,
        target: &Principal,
        encrypted_role: &CiphertextHandle,
        proof: &InputProof,
    ) -> Result<EventRecord> {
        self.policy.require_owner(caller, OWNER_ONLY)?;

        let context = self.input_context(caller);
        let handle = self
            .compute
            .verify_encryption(encrypted_role, proof, &context)
            .await
            .map_err(verification_error)?;

        let record = self
            .store_role(target, handle, RoleEvent::RoleAssigned { principal: *target })
            .await?;
        info!(seq = record.seq, "role assigned");
        Ok(record)
    }

    /// Reset `target`'s role to a fresh encryption of `NONE`.
    ///
    /// Works on never-assigned targets too; the entry is created.
    #[instrument(skip_all, fields(caller = %caller, target = %target))]
    pub async fn revoke_role(&mut self, caller: &Principal, target: &Principal) -> Result<EventRecord> {
        self.policy.require_owner(caller, OWNER_ONLY)?;

        let handle = self
            .compute
            .trivial_encrypt(ROLE_NONE)
            .await
            .map_err(RegistryError::Compute)?;

        let record = match self
            .store_role(target, handle, RoleEvent::RoleRevoked { principal: *target })
            .await
        {
            Ok(record) => record,
            Err(e) => {
                if let Err(discard) = self.compute.discard(&handle).await {
                    warn!(handle = %handle, error = %discard, "failed to discard ciphertext");
                }
                return Err(e);
            }
        };
        info!(seq = record.seq, "role revoked");
        Ok(record)
    }

    /// Owner-gated privileged operation. Mutates nothing.
    #[instrument(skip_all, fields(caller = %caller))]
    pub async fn admin_function(&self, caller: &Principal) -> Result<()> {
        self.policy.require_owner(caller, ADMIN_ONLY)?;
        debug!("admin function executed");
        Ok(())
    }

    /// Grant, then commit. Grants issued here are withdrawn if anything
    /// after them fails.
    async fn store_role(
        &self,
        target: &Principal,
        handle: CiphertextHandle,
        event: RoleEvent,
    ) -> Result<EventRecord> {
        let mut issued = Vec::new();

        for grantee in self.grantees(target) {
            match self.grant(&handle, &grantee).await {
                Ok(true) => issued.push(grantee),
                Ok(false) => {}
                Err(e) => {
                    self.rollback(&handle, &issued).await;
                    return Err(e);
                }
            }
        }

        match self.store.commit(target, &handle, event).await {
            Ok(record) => Ok(record),
            Err(e) => {
                self.rollback(&handle, &issued).await;
                Err(e.into())
            }
        }
    }

    fn grantees(&self, target: &Principal) -> Vec<Principal> {
        let mut out = vec![*target];
        if self.config.grant_registry_access && self.address != *target {
            out.push(self.address);
        }
        out
    }

    /// Grant `principal` on `handle`. Returns true if the grant is new.
    async fn grant(&self, handle: &CiphertextHandle, principal: &Principal) -> Result<bool> {
        let held = self
            .compute
            .is_allowed(handle, principal)
            .await
            .map_err(RegistryError::Compute)?;

        self.compute
            .grant_access(handle, principal)
            .await
            .map_err(|source| RegistryError::Grant {
                principal: *principal,
                source,
            })?;
        Ok(!held)
    }

    async fn rollback(&self, handle: &CiphertextHandle, issued: &[Principal]) {
        for principal in issued {
            if let Err(e) = self.compute.revoke_access(handle, principal).await {
                warn!(principal = %principal, error = %e, "failed to withdraw grant");
            }
        }
        if !issued.is_empty() {
            warn!(grants = issued.len(), "rolled back grants of failed call");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// The caller's own role handle, or the absent sentinel.
    ///
    /// Grants nothing. The caller can decrypt only if an earlier write
    /// granted them the handle.
    #[instrument(skip_all, fields(caller = %caller))]
    pub async fn get_encrypted_role(&self, caller: &Principal) -> Result<CiphertextHandle> {
        let handle = self.store.role_or_absent(caller).await?;
        trace!(absent = handle.is_absent(), "read role handle");
        Ok(handle)
    }

    /// Whether `caller` holds at least `threshold`.
    ///
    /// See [`MinimumRoleCheck`](crate::MinimumRoleCheck): currently always true.
    pub fn has_minimum_role(&self, caller: &Principal, threshold: Role) -> bool {
        self.policy.has_minimum_role(caller, threshold)
    }

    /// Every principal that has ever been assigned or revoked.
    pub async fn assigned_principals(&self) -> Result<Vec<Principal>> {
        Ok(self.store.list_principals().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────────

    /// The full event log.
    pub async fn events(&self) -> Result<Vec<EventRecord>> {
        Ok(self.store.all_events().await?)
    }

    /// Records with `seq > after_seq`.
    pub async fn events_since(&self, after_seq: u64) -> Result<Vec<EventRecord>> {
        Ok(self.store.events_since(after_seq).await?)
    }

    /// Records about `principal`.
    pub async fn events_for(&self, principal: &Principal) -> Result<Vec<EventRecord>> {
        Ok(self.store.events_for(principal).await?)
    }

    /// Re-verify the persisted hash chain.
    pub async fn verify_events(&self) -> Result<()> {
        verify_chain(&self.store.all_events().await?)?;
        Ok(())
    }
}

/// An unavailable provider is a refusal to proceed, not a bad input.
fn verification_error(e: ComputeError) -> RegistryError {
    match e {
        ComputeError::Unavailable => RegistryError::Compute(e),
        other => RegistryError::InvalidCiphertext(other),
    }
}
