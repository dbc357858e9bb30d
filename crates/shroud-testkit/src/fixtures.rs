//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use shroud::{RegistryConfig, RegistryError, RoleRegistry};
use shroud_compute::{ComputeError, LocalCompute, X25519StaticSecret};
use shroud_core::{CiphertextHandle, EventRecord, InputProof, Keypair, Principal, Role};
use shroud_store::MemoryStore;

/// Seed of the fixture owner's keys.
pub const OWNER_SEED: u8 = 0x01;

/// A principal with a signing key and a decryption secret.
pub struct TestParty {
    pub keypair: Keypair,
    pub principal: Principal,
    pub secret: X25519StaticSecret,
}

impl TestParty {
    /// Deterministic party from a one-byte seed.
    pub fn from_seed(seed: u8) -> Self {
        let keypair = Keypair::from_seed(&[seed; 32]);
        let mut secret_seed = [seed; 32];
        secret_seed[0] ^= 0x5a;

        Self {
            principal: keypair.principal(),
            keypair,
            secret: X25519StaticSecret::from_bytes(secret_seed),
        }
    }
}

/// An owner, a reference provider and a registry over a memory store.
pub struct RegistryFixture {
    pub owner: TestParty,
    pub compute: Arc<LocalCompute>,
    pub registry: RoleRegistry<MemoryStore, LocalCompute>,
}

impl RegistryFixture {
    /// Fixture with the default configuration.
    pub async fn new() -> Self {
        Self::with_config(RegistryConfig::default()).await
    }

    pub async fn with_config(config: RegistryConfig) -> Self {
        let owner = TestParty::from_seed(OWNER_SEED);
        let compute = Arc::new(LocalCompute::new());
        compute.register_decryption_key(owner.principal, owner.secret.public_key());

        let registry = RoleRegistry::create(owner.principal, MemoryStore::new(), compute.clone(), config)
            .await
            .expect("fixture registry creation failed");

        Self {
            owner,
            compute,
            registry,
        }
    }

    /// A party whose decryption key is registered with the provider.
    pub fn party(&self, seed: u8) -> TestParty {
        let party = TestParty::from_seed(seed);
        self.compute
            .register_decryption_key(party.principal, party.secret.public_key());
        party
    }

    /// `count` registered parties with distinct seeds, starting after the owner's.
    pub fn parties(&self, count: u8) -> Vec<TestParty> {
        (0..count).map(|i| self.party(OWNER_SEED + 1 + i)).collect()
    }

    /// Encrypt `role` as an input from the owner to this registry.
    pub fn encrypt_role(&self, role: Role) -> (CiphertextHandle, InputProof) {
        self.encrypt_as(&self.owner.principal, role.to_u8())
    }

    /// Encrypt `value` as an input from `submitter` to this registry.
    pub fn encrypt_as(&self, submitter: &Principal, value: u8) -> (CiphertextHandle, InputProof) {
        self.compute
            .encrypt_input(value, self.registry.input_context(submitter))
            .expect("fixture encryption failed")
    }

    /// Owner assigns `role` to `target`.
    pub async fn assign(&mut self, target: &Principal, role: Role) -> shroud::Result<EventRecord> {
        let (handle, proof) = self.encrypt_role(role);
        let owner = self.owner.principal;
        self.registry.assign_role(&owner, target, &handle, &proof).await
    }

    /// Owner revokes `target`.
    pub async fn revoke(&mut self, target: &Principal) -> shroud::Result<EventRecord> {
        let owner = self.owner.principal;
        self.registry.revoke_role(&owner, target).await
    }

    /// Decrypt `handle` as `party`.
    pub fn decrypt(&self, handle: &CiphertextHandle, party: &TestParty) -> Result<u8, ComputeError> {
        self.compute
            .user_decrypt(handle, &party.principal, &party.secret)
    }

    /// `party` reads and decrypts their own role.
    pub async fn role_of(&self, party: &TestParty) -> shroud::Result<u8> {
        let handle = self.registry.get_encrypted_role(&party.principal).await?;
        self.decrypt(&handle, party).map_err(RegistryError::Compute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shroud_compute::ConfidentialCompute;

    #[tokio::test]
    async fn test_parties_distinct_and_registered() {
        let fx = RegistryFixture::new().await;
        let ps = fx.parties(4);
        for (i, a) in ps.iter().enumerate() {
            assert_ne!(a.principal, fx.owner.principal);
            for b in &ps[i + 1..] {
                assert_ne!(a.principal, b.principal);
            }
        }

        let handle = fx.compute.trivial_encrypt(1).await.unwrap();
        fx.compute.grant_access(&handle, &ps[0].principal).await.unwrap();
        assert_eq!(fx.decrypt(&handle, &ps[0]).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fixture_roundtrip() {
        let mut fx = RegistryFixture::new().await;
        let alice = fx.party(2);

        fx.assign(&alice.principal, Role::Admin).await.unwrap();
        assert_eq!(fx.role_of(&alice).await.unwrap(), Role::Admin.to_u8());
    }
}
