//! SQLite implementation of the Store trait.
//!
//! The primary storage backend. Uses rusqlite with bundled SQLite, wrapped
//! in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use shroud_core::{CiphertextHandle, EventId, EventRecord, Principal, RoleEvent};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{RegistryMetadata, Store};

const EVENT_COLUMNS: &str = "seq, prev_event_id, kind, principal, event_id";

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        debug!(path = %path.display(), "opened registry database");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` on the connection from the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| locked(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| locked(format!("spawn_blocking failed: {}", e)))?
    }
}

fn locked(message: String) -> StoreError {
    StoreError::Database(rusqlite::Error::SqliteFailure(
        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_LOCKED),
        Some(message),
    ))
}

/// An events row as stored, before decoding.
type EventRow = (u64, Option<Vec<u8>>, u8, Vec<u8>, Vec<u8>);

fn read_event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn decode_event((seq, prev, kind, principal, event_id): EventRow) -> Result<EventRecord> {
    let principal = principal_from(&principal)?;
    let event = RoleEvent::from_code(kind, principal)
        .ok_or_else(|| StoreError::InvalidData(format!("unknown event kind {}", kind)))?;
    let prev = prev.map(|b| event_id_from(&b)).transpose()?;

    let record = EventRecord { seq, prev, event };
    if record.compute_id() != event_id_from(&event_id)? {
        return Err(StoreError::InvalidData(format!(
            "event id mismatch at seq {}",
            seq
        )));
    }
    Ok(record)
}

fn query_events(
    conn: &Connection,
    filter: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<EventRecord>> {
    let sql = format!(
        "SELECT {} FROM events {} ORDER BY seq ASC",
        EVENT_COLUMNS, filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, read_event_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(decode_event).collect()
}

fn select_head(conn: &Connection) -> Result<Option<EventRecord>> {
    let sql = format!(
        "SELECT {} FROM events ORDER BY seq DESC LIMIT 1",
        EVENT_COLUMNS
    );
    conn.query_row(&sql, [], read_event_row)
        .optional()?
        .map(decode_event)
        .transpose()
}

fn principal_from(bytes: &[u8]) -> Result<Principal> {
    Principal::try_from(bytes)
        .map_err(|_| StoreError::InvalidData(format!("principal of {} bytes", bytes.len())))
}

fn handle_from(bytes: &[u8]) -> Result<CiphertextHandle> {
    CiphertextHandle::try_from(bytes)
        .map_err(|_| StoreError::InvalidData(format!("handle of {} bytes", bytes.len())))
}

fn event_id_from(bytes: &[u8]) -> Result<EventId> {
    EventId::try_from(bytes)
        .map_err(|_| StoreError::InvalidData(format!("event id of {} bytes", bytes.len())))
}

#[async_trait]
impl Store for SqliteStore {
    async fn load_metadata(&self) -> Result<Option<RegistryMetadata>> {
        self.blocking(|conn| {
            let row: Option<(Vec<u8>, Vec<u8>, String)> = conn
                .query_row(
                    "SELECT owner, address, name FROM registry_meta WHERE id = 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            row.map(|(owner, address, name)| {
                Ok(RegistryMetadata {
                    owner: principal_from(&owner)?,
                    address: principal_from(&address)?,
                    name,
                })
            })
            .transpose()
        })
        .await
    }

    async fn init_metadata(&self, metadata: &RegistryMetadata) -> Result<()> {
        let metadata = metadata.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM registry_meta WHERE id = 1)",
                [],
                |row| row.get(0),
            )?;
            if exists {
                return Err(StoreError::AlreadyInitialized);
            }

            tx.execute(
                "INSERT INTO registry_meta (id, owner, address, name, created_at)
                 VALUES (1, ?1, ?2, ?3, ?4)",
                params![
                    metadata.owner.as_bytes().as_slice(),
                    metadata.address.as_bytes().as_slice(),
                    metadata.name,
                    now_millis(),
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn get_role(&self, principal: &Principal) -> Result<Option<CiphertextHandle>> {
        let principal = *principal;

        self.blocking(move |conn| {
            let bytes: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT handle FROM roles WHERE principal = ?1",
                    params![principal.as_bytes().as_slice()],
                    |row| row.get(0),
                )
                .optional()?;
            bytes.map(|b| handle_from(&b)).transpose()
        })
        .await
    }

    async fn list_principals(&self) -> Result<Vec<Principal>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare("SELECT principal FROM roles ORDER BY principal ASC")?;
            let rows = stmt
                .query_map([], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.iter().map(|b| principal_from(b)).collect()
        })
        .await
    }

    async fn commit(
        &self,
        principal: &Principal,
        handle: &CiphertextHandle,
        event: RoleEvent,
    ) -> Result<EventRecord> {
        let principal = *principal;
        let handle = *handle;

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            let initialized: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM registry_meta WHERE id = 1)",
                [],
                |row| row.get(0),
            )?;
            if !initialized {
                return Err(StoreError::NotInitialized);
            }

            let head = select_head(&tx)?;
            let record = EventRecord::next(head.as_ref(), event);
            let event_id = record.compute_id();

            tx.execute(
                "INSERT INTO events (seq, event_id, prev_event_id, kind, principal, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.seq,
                    event_id.0.as_slice(),
                    record.prev.map(|p| p.0.to_vec()),
                    record.event.kind_code(),
                    record.principal().as_bytes().as_slice(),
                    now_millis(),
                ],
            )?;

            tx.execute(
                "INSERT INTO roles (principal, handle, updated_seq) VALUES (?1, ?2, ?3)
                 ON CONFLICT(principal) DO UPDATE SET
                    handle = excluded.handle,
                    updated_seq = excluded.updated_seq",
                params![
                    principal.as_bytes().as_slice(),
                    handle.as_bytes().as_slice(),
                    record.seq,
                ],
            )?;

            tx.commit()?;
            Ok(record)
        })
        .await
    }

    async fn event_head(&self) -> Result<Option<EventRecord>> {
        self.blocking(|conn| select_head(conn)).await
    }

    async fn events_since(&self, after_seq: u64) -> Result<Vec<EventRecord>> {
        self.blocking(move |conn| query_events(conn, "WHERE seq > ?1", params![after_seq]))
            .await
    }

    async fn events_for(&self, principal: &Principal) -> Result<Vec<EventRecord>> {
        let principal = *principal;

        self.blocking(move |conn| {
            query_events(
                conn,
                "WHERE principal = ?1",
                params![principal.as_bytes().as_slice()],
            )
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::StoreExt;
    use shroud_core::verify_chain;

    fn p(b: u8) -> Principal {
        Principal::from_bytes([b; 32])
    }

    fn h(b: u8) -> CiphertextHandle {
        CiphertextHandle::from_bytes([b; 32])
    }

    fn metadata() -> RegistryMetadata {
        RegistryMetadata {
            owner: p(0xaa),
            address: p(0xbb),
            name: "roles".into(),
        }
    }

    #[tokio::test]
    async fn test_metadata_roundtrip() {
        let store = SqliteStore::open_memory().unwrap();
        assert!(store.load_metadata().await.unwrap().is_none());

        store.init_metadata(&metadata()).await.unwrap();
        assert_eq!(store.load_metadata().await.unwrap(), Some(metadata()));
        assert!(matches!(
            store.init_metadata(&metadata()).await,
            Err(StoreError::AlreadyInitialized)
        ));
    }

    #[tokio::test]
    async fn test_commit_requires_metadata() {
        let store = SqliteStore::open_memory().unwrap();
        let result = store
            .commit(&p(1), &h(1), RoleEvent::RoleAssigned { principal: p(1) })
            .await;

        assert!(matches!(result, Err(StoreError::NotInitialized)));
        assert!(store.event_head().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_replaces_role_and_chains_events() {
        let store = SqliteStore::open_memory().unwrap();
        store.init_metadata(&metadata()).await.unwrap();

        let first = store
            .commit(&p(1), &h(1), RoleEvent::RoleAssigned { principal: p(1) })
            .await
            .unwrap();
        let second = store
            .commit(&p(1), &h(2), RoleEvent::RoleRevoked { principal: p(1) })
            .await
            .unwrap();

        assert_eq!(second.prev, Some(first.compute_id()));
        assert_eq!(store.get_role(&p(1)).await.unwrap(), Some(h(2)));
        assert_eq!(store.event_head().await.unwrap(), Some(second));

        let events = store.all_events().await.unwrap();
        assert_eq!(events.len(), 2);
        verify_chain(&events).unwrap();
    }

    #[tokio::test]
    async fn test_queries() {
        let store = SqliteStore::open_memory().unwrap();
        store.init_metadata(&metadata()).await.unwrap();

        for (who, handle) in [(2, 1), (1, 2), (2, 3)] {
            store
                .commit(&p(who), &h(handle), RoleEvent::RoleAssigned { principal: p(who) })
                .await
                .unwrap();
        }

        assert_eq!(store.list_principals().await.unwrap(), vec![p(1), p(2)]);
        assert_eq!(store.role_or_absent(&p(3)).await.unwrap(), CiphertextHandle::ABSENT);

        let for_two: Vec<u64> = store
            .events_for(&p(2))
            .await
            .unwrap()
            .iter()
            .map(|r| r.seq)
            .collect();
        assert_eq!(for_two, vec![1, 3]);
        assert_eq!(store.events_since(2).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reopen_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.init_metadata(&metadata()).await.unwrap();
            store
                .commit(&p(1), &h(7), RoleEvent::RoleAssigned { principal: p(1) })
                .await
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.load_metadata().await.unwrap(), Some(metadata()));
        assert_eq!(store.get_role(&p(1)).await.unwrap(), Some(h(7)));
        assert_eq!(store.all_events().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tampered_event_detected() {
        let store = SqliteStore::open_memory().unwrap();
        store.init_metadata(&metadata()).await.unwrap();
        store
            .commit(&p(1), &h(1), RoleEvent::RoleAssigned { principal: p(1) })
            .await
            .unwrap();

        store
            .blocking(|conn| {
                conn.execute("UPDATE events SET kind = 2 WHERE seq = 1", [])?;
                Ok(())
            })
            .await
            .unwrap();

        assert!(matches!(
            store.all_events().await,
            Err(StoreError::InvalidData(_))
        ));
    }
}
