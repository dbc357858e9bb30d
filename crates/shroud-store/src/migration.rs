//! Database schema migrations for SQLite.
//!
//! Versioned: each migration moves the schema from version N to N+1 inside
//! one transaction.

use rusqlite::Connection;
use tracing::debug;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema. Idempotent.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
            debug!(version, "applied schema migration");
        }

        tx.commit()?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Single-row registry metadata
        CREATE TABLE registry_meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            owner BLOB NOT NULL,              -- 32 bytes
            address BLOB NOT NULL,            -- 32 bytes, derived from owner + name
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL       -- local time (Unix ms)
        );

        -- One row per ever-touched principal
        CREATE TABLE roles (
            principal BLOB PRIMARY KEY,       -- 32 bytes
            handle BLOB NOT NULL,             -- 32 bytes, opaque ciphertext handle
            updated_seq INTEGER NOT NULL      -- seq of the event that last wrote it
        );

        -- Hash-chained event log
        CREATE TABLE events (
            seq INTEGER PRIMARY KEY,          -- starts at 1, contiguous
            event_id BLOB NOT NULL UNIQUE,    -- 32 bytes, Blake3 of canonical bytes
            prev_event_id BLOB,               -- nullable for seq 1
            kind INTEGER NOT NULL,            -- 1 = assigned, 2 = revoked
            principal BLOB NOT NULL,
            recorded_at INTEGER NOT NULL
        );

        CREATE INDEX idx_events_principal ON events(principal);
        "#,
    )?;

    Ok(())
}

/// Current time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
