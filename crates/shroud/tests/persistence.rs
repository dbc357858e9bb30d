//! Registries backed by SQLite on disk.

use std::sync::Arc;

use shroud::compute::LocalCompute;
use shroud::store::{SqliteStore, Store, StoreError};
use shroud::{RegistryConfig, RegistryError, Role, RoleEvent, RoleRegistry};
use shroud_testkit::TestParty;

struct Parties {
    owner: TestParty,
    alice: TestParty,
}

fn parties(compute: &LocalCompute) -> Parties {
    let owner = TestParty::from_seed(0x01);
    let alice = TestParty::from_seed(0x02);
    compute.register_decryption_key(alice.principal, alice.secret.public_key());
    Parties { owner, alice }
}

#[tokio::test]
async fn roles_and_events_survive_reopen() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("roles.db");
    let compute = Arc::new(LocalCompute::new());
    let p = parties(&compute);

    let (address, handle) = {
        let mut registry = RoleRegistry::create(
            p.owner.principal,
            SqliteStore::open(&path)?,
            compute.clone(),
            RegistryConfig::default(),
        )
        .await?;

        let (handle, proof) = compute
            .encrypt_input(Role::Admin.to_u8(), registry.input_context(&p.owner.principal))?;
        registry
            .assign_role(&p.owner.principal, &p.alice.principal, &handle, &proof)
            .await?;
        (*registry.address(), handle)
    };

    let registry = RoleRegistry::open(
        SqliteStore::open(&path)?,
        compute.clone(),
        RegistryConfig::default(),
    )
    .await?;

    assert_eq!(*registry.owner(), p.owner.principal);
    assert_eq!(*registry.address(), address);
    assert_eq!(registry.get_encrypted_role(&p.alice.principal).await?, handle);
    assert_eq!(
        compute.user_decrypt(&handle, &p.alice.principal, &p.alice.secret)?,
        Role::Admin.to_u8()
    );

    let events = registry.events().await?;
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].event,
        RoleEvent::RoleAssigned { principal: p.alice.principal }
    );
    Ok(())
}

#[tokio::test]
async fn reopened_registry_keeps_owner_gate() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("roles.db");
    let compute = Arc::new(LocalCompute::new());
    let p = parties(&compute);

    RoleRegistry::create(
        p.owner.principal,
        SqliteStore::open(&path)?,
        compute.clone(),
        RegistryConfig::default(),
    )
    .await?;

    let mut registry = RoleRegistry::open(
        SqliteStore::open(&path)?,
        compute.clone(),
        RegistryConfig::default(),
    )
    .await?;

    let err = registry
        .revoke_role(&p.alice.principal, &p.alice.principal)
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());

    registry
        .revoke_role(&p.owner.principal, &p.alice.principal)
        .await?;
    assert_eq!(registry.assigned_principals().await?, vec![p.alice.principal]);
    Ok(())
}

#[tokio::test]
async fn create_over_foreign_store_refused() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("roles.db");
    let compute = Arc::new(LocalCompute::new());
    let p = parties(&compute);

    RoleRegistry::create(
        p.owner.principal,
        SqliteStore::open(&path)?,
        compute.clone(),
        RegistryConfig::default(),
    )
    .await?;

    let result = RoleRegistry::create(
        p.alice.principal,
        SqliteStore::open(&path)?,
        compute.clone(),
        RegistryConfig::default(),
    )
    .await;

    match result {
        Err(RegistryError::OwnerMismatch { stored, requested }) => {
            assert_eq!(stored, p.owner.principal);
            assert_eq!(requested, p.alice.principal);
        }
        Err(other) => panic!("expected OwnerMismatch, got {:?}", other),
        Ok(_) => panic!("expected OwnerMismatch, got a registry"),
    }
    Ok(())
}

#[tokio::test]
async fn open_requires_created_store() {
    let result = RoleRegistry::open(
        SqliteStore::open_memory().unwrap(),
        Arc::new(LocalCompute::new()),
        RegistryConfig::default(),
    )
    .await;

    assert!(matches!(
        result,
        Err(RegistryError::Store(StoreError::NotInitialized))
    ));
}

#[tokio::test]
async fn config_from_json_drives_address() -> anyhow::Result<()> {
    let compute = Arc::new(LocalCompute::new());
    let p = parties(&compute);
    let config = RegistryConfig::from_json(r#"{"name": "staff", "grant_registry_access": false}"#)?;

    let store = SqliteStore::open_memory()?;
    let registry = RoleRegistry::create(p.owner.principal, store, compute.clone(), config).await?;

    assert_eq!(
        *registry.address(),
        shroud::Principal::derive_contract(&p.owner.principal, "staff")
    );
    let metadata = registry.store().load_metadata().await?.unwrap();
    assert_eq!(metadata.name, "staff");
    Ok(())
}

#[tokio::test]
async fn open_refuses_gapped_event_log() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("roles.db");
    let compute = Arc::new(LocalCompute::new());
    let p = parties(&compute);

    {
        let mut registry = RoleRegistry::create(
            p.owner.principal,
            SqliteStore::open(&path)?,
            compute.clone(),
            RegistryConfig::default(),
        )
        .await?;
        for seed in 2..5 {
            let target = TestParty::from_seed(seed).principal;
            registry.revoke_role(&p.owner.principal, &target).await?;
        }
    }

    let removed =
        rusqlite::Connection::open(&path)?.execute("DELETE FROM events WHERE seq = 2", [])?;
    assert_eq!(removed, 1);

    let result = RoleRegistry::open(
        SqliteStore::open(&path)?,
        compute.clone(),
        RegistryConfig::default(),
    )
    .await;
    assert!(matches!(result, Err(RegistryError::EventLog(_))));

    let unchecked = RegistryConfig {
        verify_chain_on_open: false,
        ..RegistryConfig::default()
    };
    let registry = RoleRegistry::open(SqliteStore::open(&path)?, compute.clone(), unchecked).await?;
    assert_eq!(registry.events().await?.len(), 2);
    assert!(matches!(
        registry.verify_events().await,
        Err(RegistryError::EventLog(_))
    ));
    Ok(())
}

#[tokio::test]
async fn open_adopts_stored_name() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("roles.db");
    let compute = Arc::new(LocalCompute::new());
    let p = parties(&compute);

    RoleRegistry::create(
        p.owner.principal,
        SqliteStore::open(&path)?,
        compute.clone(),
        RegistryConfig::default().with_name("staff"),
    )
    .await?;

    let registry = RoleRegistry::open(
        SqliteStore::open(&path)?,
        compute.clone(),
        RegistryConfig::default().with_name("other"),
    )
    .await?;

    assert_eq!(registry.config().name, "staff");
    assert_eq!(
        *registry.address(),
        shroud::Principal::derive_contract(&p.owner.principal, &registry.config().name)
    );
    Ok(())
}
