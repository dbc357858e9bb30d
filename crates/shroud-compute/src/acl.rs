//! Per-handle access lists.
//!
//! An entry `(handle, principal)` means the principal may ask the provider
//! to decrypt the handle or to use it as an operand. Grants are not
//! transferable and are not inherited by handles derived from this one.

use std::collections::{BTreeSet, HashMap};

use shroud_core::{CiphertextHandle, Principal};

/// One access entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub handle: CiphertextHandle,
    pub principal: Principal,

    /// Provider operation counter at the first grant.
    pub granted_at: u64,

    /// How many times the grant was (re)issued.
    pub issue_count: u32,
}

/// Access list over all handles.
#[derive(Debug, Default)]
pub struct AccessList {
    grants: HashMap<(CiphertextHandle, Principal), AccessGrant>,

    /// Index: principal -> handles they may use.
    by_principal: HashMap<Principal, BTreeSet<CiphertextHandle>>,
}

impl AccessList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `principal` on `handle`. Returns true if the grant is new.
    pub fn allow(&mut self, handle: CiphertextHandle, principal: Principal, at: u64) -> bool {
        let key = (handle, principal);
        if let Some(grant) = self.grants.get_mut(&key) {
            grant.issue_count += 1;
            return false;
        }

        self.grants.insert(
            key,
            AccessGrant {
                handle,
                principal,
                granted_at: at,
                issue_count: 1,
            },
        );
        self.by_principal.entry(principal).or_default().insert(handle);
        true
    }

    /// Remove `principal` from `handle`. Returns true if a grant existed.
    pub fn deny(&mut self, handle: &CiphertextHandle, principal: &Principal) -> bool {
        if self.grants.remove(&(*handle, *principal)).is_none() {
            return false;
        }

        if let Some(handles) = self.by_principal.get_mut(principal) {
            handles.remove(handle);
            if handles.is_empty() {
                self.by_principal.remove(principal);
            }
        }
        true
    }

    /// Remove every grant on `handle`. Returns how many were removed.
    pub fn forget(&mut self, handle: &CiphertextHandle) -> usize {
        let holders = self.holders(handle);
        for principal in &holders {
            self.deny(handle, principal);
        }
        holders.len()
    }

    pub fn is_allowed(&self, handle: &CiphertextHandle, principal: &Principal) -> bool {
        self.grants.contains_key(&(*handle, *principal))
    }

    pub fn get(&self, handle: &CiphertextHandle, principal: &Principal) -> Option<&AccessGrant> {
        self.grants.get(&(*handle, *principal))
    }

    /// Handles `principal` may use.
    pub fn handles_for(&self, principal: &Principal) -> Vec<CiphertextHandle> {
        self.by_principal
            .get(principal)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Principals allowed on `handle`.
    pub fn holders(&self, handle: &CiphertextHandle) -> Vec<Principal> {
        let mut out: Vec<Principal> = self
            .grants
            .keys()
            .filter(|(h, _)| h == handle)
            .map(|(_, p)| *p)
            .collect();
        out.sort();
        out
    }
}
