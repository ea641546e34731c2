// crates/aecp-store/src/sqlite.rs
// ============================================================================
// Module: SQLite Storage Driver
// Description: Durable audit log, snapshot, and outbox persistence backed
//              by SQLite.
// Purpose: The production binding for the storage-backend contract named
//          by spec.md §6; the in-memory implementations in aecp-audit and
//          aecp-execution remain the reference/test binding.
// Dependencies: aecp-audit, aecp-core, aecp-execution, rusqlite
// ============================================================================

//! ## Overview
//! One `SQLite` connection, guarded by a mutex, backs all three storage
//! contracts against the schema in `schema.sql`. `spec.md` §6: "Audit
//! entries serialize as newline-delimited canonical JSON... Snapshots
//! serialize one object per file named by id... Outbox entries serialize
//! as rows keyed by idempotency key with columns `{state, result_blob,
//! attempts, updated_at}`" — this driver stores the same logical shape in
//! relational form per the companion schema rather than flat files.
//!
//! The [`aecp_execution::outbox::OutboxStore`] trait predates a storage
//! backend that can fail, so its methods do not return `Result`; this
//! driver fails safe on a database error (logs via `tracing` and falls
//! back to the behavior that forces re-execution rather than silently
//! replaying), documented further in the workspace `DESIGN.md`.

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use aecp_audit::AuditLogPersistence;
use aecp_audit::ChainError;
use aecp_audit::SnapshotPersistence;
use aecp_audit::SnapshotError;
use aecp_core::AuditEntry;
use aecp_core::PrincipalId;
use aecp_core::Provenance;
use aecp_core::Snapshot;
use aecp_core::SnapshotId;
use aecp_core::SnapshotTrigger;
use aecp_core::Timestamp;
use aecp_execution::outbox::OutboxDecision;
use aecp_execution::outbox::OutboxStore;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use serde_json::Value;
use thiserror::Error;

const SCHEMA_SQL: &str = include_str!("../schema.sql");
const SCHEMA_VERSION: i64 = 1;

/// Errors raised opening or operating the `SQLite` storage driver.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// The underlying `SQLite` engine returned an error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored JSON failed to parse back into a typed value.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// The store's connection mutex was poisoned by a prior panic.
    #[error("sqlite store mutex poisoned")]
    Poisoned,
}

impl From<SqliteStoreError> for ChainError {
    fn from(error: SqliteStoreError) -> Self {
        Self::Persistence(error.to_string())
    }
}

impl From<SqliteStoreError> for SnapshotError {
    fn from(error: SqliteStoreError) -> Self {
        Self::Persistence(error.to_string())
    }
}

/// Configuration for opening a [`SqliteStore`].
#[derive(Debug, Clone)]
pub struct SqliteStoreConfig {
    /// Path to the database file. Use `:memory:` for an ephemeral store.
    pub path: PathBuf,
    /// Busy timeout in milliseconds before a lock-contended call fails.
    pub busy_timeout_ms: u64,
}

impl SqliteStoreConfig {
    /// Configuration for a file-backed store at `path`.
    #[must_use]
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf(), busy_timeout_ms: 5_000 }
    }

    /// Configuration for an ephemeral in-process store, useful for tests
    /// that want SQL semantics without a file on disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { path: PathBuf::from(":memory:"), busy_timeout_ms: 5_000 }
    }
}

/// A `SQLite`-backed implementation of the audit log, snapshot, and outbox
/// storage contracts.
#[derive(Clone)]
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (creating if absent) a `SQLite` store at the configured path
    /// and applies the companion schema.
    ///
    /// # Errors
    /// Returns [`SqliteStoreError::Db`] if the connection cannot be opened
    /// or the schema cannot be applied.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        let connection = Connection::open(&config.path).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        connection
            .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        initialize_schema(&connection)?;
        Ok(Self { connection: Arc::new(Mutex::new(connection)) })
    }

    fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T, SqliteStoreError>) -> Result<T, SqliteStoreError> {
        let guard = self.connection.lock().map_err(|_| SqliteStoreError::Poisoned)?;
        f(&guard)
    }
}

fn initialize_schema(connection: &Connection) -> Result<(), SqliteStoreError> {
    connection.execute_batch(SCHEMA_SQL).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> =
        connection.query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0)).optional().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    if version.is_none() {
        connection
            .execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    }
    Ok(())
}

fn json_text(value: &Option<Value>) -> Result<Option<String>, SqliteStoreError> {
    value.as_ref().map(|v| serde_json::to_string(v).map_err(|err| SqliteStoreError::Invalid(err.to_string()))).transpose()
}

fn parse_json_text(text: Option<String>) -> Result<Option<Value>, SqliteStoreError> {
    text.map(|t| serde_json::from_str(&t).map_err(|err| SqliteStoreError::Invalid(err.to_string()))).transpose()
}

// ============================================================================
// SECTION: Audit Log Persistence
// ============================================================================

impl AuditLogPersistence for SqliteStore {
    fn append(&self, entry: AuditEntry) -> Result<(), ChainError> {
        self.with_connection(|conn| {
            let provenance_json = serde_json::to_string(&entry.provenance).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
            conn.execute(
                "INSERT INTO audit_entries (
                    sequence, id, timestamp_ms, actor, action_name,
                    state_before_json, state_after_json, diff_json,
                    content_hash, previous_hash, provenance_json
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    i64::try_from(entry.sequence).unwrap_or(i64::MAX),
                    entry.id,
                    entry.timestamp.unix_millis(),
                    entry.actor,
                    entry.action_name,
                    json_text(&entry.state_before)?,
                    json_text(&entry.state_after)?,
                    json_text(&entry.diff)?,
                    entry.content_hash,
                    entry.previous_hash,
                    provenance_json,
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(())
        })
        .map_err(ChainError::from)
    }

    fn load_all(&self) -> Result<Vec<AuditEntry>, ChainError> {
        self.with_connection(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT sequence, id, timestamp_ms, actor, action_name, state_before_json, \
                     state_after_json, diff_json, content_hash, previous_hash, provenance_json \
                     FROM audit_entries ORDER BY sequence ASC",
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let rows = stmt
                .query_map(params![], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, Option<String>>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, Option<String>>(9)?,
                        row.get::<_, String>(10)?,
                    ))
                })
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;

            let mut entries = Vec::new();
            for row in rows {
                let (sequence, id, timestamp_ms, actor, action_name, state_before, state_after, diff, content_hash, previous_hash, provenance_json) =
                    row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
                let provenance: Provenance = serde_json::from_str(&provenance_json).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
                entries.push(AuditEntry {
                    sequence: u64::try_from(sequence).unwrap_or_default(),
                    id,
                    timestamp: Timestamp::from_unix_millis(timestamp_ms),
                    actor,
                    action_name,
                    state_before: parse_json_text(state_before)?,
                    state_after: parse_json_text(state_after)?,
                    diff: parse_json_text(diff)?,
                    content_hash,
                    previous_hash,
                    provenance,
                });
            }
            Ok(entries)
        })
        .map_err(ChainError::from)
    }
}

// ============================================================================
// SECTION: Snapshot Persistence
// ============================================================================

impl SnapshotPersistence for SqliteStore {
    fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        self.with_connection(|conn| {
            let state_json = serde_json::to_string(&snapshot.state).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
            let pointers_json = serde_json::to_string(&snapshot.memory_pointers).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
            let trigger_json = serde_json::to_string(&snapshot.trigger).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
            conn.execute(
                "INSERT INTO snapshots (
                    id, timestamp_ms, state_json, verified, agent_id,
                    session_id, cycle_number, memory_pointers_json, trigger
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(id) DO UPDATE SET
                    timestamp_ms = excluded.timestamp_ms,
                    state_json = excluded.state_json,
                    verified = excluded.verified,
                    agent_id = excluded.agent_id,
                    session_id = excluded.session_id,
                    cycle_number = excluded.cycle_number,
                    memory_pointers_json = excluded.memory_pointers_json,
                    trigger = excluded.trigger",
                params![
                    snapshot.id.as_str(),
                    snapshot.timestamp.unix_millis(),
                    state_json,
                    snapshot.verified,
                    snapshot.agent_id.as_str(),
                    snapshot.session_id,
                    i64::try_from(snapshot.cycle_number).unwrap_or(i64::MAX),
                    pointers_json,
                    trigger_json,
                ],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(())
        })
        .map_err(SnapshotError::from)
    }

    fn load(&self, id: &SnapshotId) -> Result<Option<Snapshot>, SnapshotError> {
        self.with_connection(|conn| load_snapshot_row(conn, id.as_str())).map_err(SnapshotError::from)
    }

    fn load_all(&self) -> Result<Vec<Snapshot>, SnapshotError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT id FROM snapshots").map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let ids: Vec<String> =
                stmt.query_map(params![], |row| row.get(0)).map_err(|err| SqliteStoreError::Db(err.to_string()))?.collect::<Result<_, _>>().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let mut snapshots = Vec::new();
            for id in ids {
                if let Some(snapshot) = load_snapshot_row(conn, &id)? {
                    snapshots.push(snapshot);
                }
            }
            Ok(snapshots)
        })
        .map_err(SnapshotError::from)
    }

    fn delete(&self, id: &SnapshotId) -> Result<(), SnapshotError> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM snapshots WHERE id = ?1", params![id.as_str()]).map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok(())
        })
        .map_err(SnapshotError::from)
    }
}

fn load_snapshot_row(conn: &Connection, id: &str) -> Result<Option<Snapshot>, SqliteStoreError> {
    let row = conn
        .query_row(
            "SELECT id, timestamp_ms, state_json, verified, agent_id, session_id, cycle_number, \
             memory_pointers_json, trigger FROM snapshots WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, bool>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                ))
            },
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;

    let Some((id, timestamp_ms, state_json, verified, agent_id, session_id, cycle_number, pointers_json, trigger_json)) = row else {
        return Ok(None);
    };

    let state: Value = serde_json::from_str(&state_json).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    let memory_pointers: Vec<String> = serde_json::from_str(&pointers_json).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    let trigger: SnapshotTrigger = serde_json::from_str(&trigger_json).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;

    Ok(Some(Snapshot {
        id: SnapshotId::new(id),
        timestamp: Timestamp::from_unix_millis(timestamp_ms),
        state,
        verified,
        agent_id: PrincipalId::new(agent_id),
        session_id,
        cycle_number: u64::try_from(cycle_number).unwrap_or_default(),
        memory_pointers,
        trigger,
    }))
}

// ============================================================================
// SECTION: Outbox Store
// ============================================================================

fn parse_outbox_state(label: &str) -> aecp_core::OutboxState {
    match label {
        "committed" => aecp_core::OutboxState::Committed,
        "failed" => aecp_core::OutboxState::Failed,
        _ => aecp_core::OutboxState::Pending,
    }
}

impl SqliteStore {
    fn load_outbox_entry(&self, key: &str) -> Result<Option<aecp_core::OutboxEntry>, SqliteStoreError> {
        self.with_connection(|conn| {
            let row = conn
                .query_row("SELECT state, result_blob, attempts FROM outbox_entries WHERE idempotency_key = ?1", params![key], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?, row.get::<_, i64>(2)?))
                })
                .optional()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            let Some((state, result_blob, attempts)) = row else {
                return Ok(None);
            };
            let result = parse_json_text(result_blob)?;
            Ok(Some(aecp_core::OutboxEntry {
                idempotency_key: key.to_string(),
                state: parse_outbox_state(&state),
                result,
                attempt_count: u32::try_from(attempts).unwrap_or_default(),
            }))
        })
    }
}

impl OutboxStore for SqliteStore {
    fn get(&self, key: &str) -> Option<aecp_core::OutboxEntry> {
        self.load_outbox_entry(key).unwrap_or_else(|err| {
            tracing::error!(error = %err, key, "outbox get failed");
            None
        })
    }

    fn begin(&self, key: &str) -> OutboxDecision {
        let now = Timestamp::now().unix_millis();
        let result = self.with_connection(|conn| {
            let existing = conn
                .query_row("SELECT state, result_blob, attempts FROM outbox_entries WHERE idempotency_key = ?1", params![key], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?, row.get::<_, i64>(2)?))
                })
                .optional()
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;

            match existing {
                Some((state, result_blob, _)) if state == "committed" => {
                    let result = parse_json_text(result_blob)?.unwrap_or(Value::Null);
                    Ok(OutboxDecision::Replay(result))
                }
                Some((_, _, attempts)) => {
                    conn.execute(
                        "UPDATE outbox_entries SET state = 'pending', attempts = ?2, updated_at = ?3 WHERE idempotency_key = ?1",
                        params![key, attempts + 1, now],
                    )
                    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
                    Ok(OutboxDecision::Execute)
                }
                None => {
                    conn.execute(
                        "INSERT INTO outbox_entries (idempotency_key, state, result_blob, attempts, updated_at) VALUES (?1, 'pending', NULL, 1, ?2)",
                        params![key, now],
                    )
                    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
                    Ok(OutboxDecision::Execute)
                }
            }
        });

        result.unwrap_or_else(|err| {
            tracing::error!(error = %err, key, "outbox begin failed; forcing re-execution");
            OutboxDecision::Execute
        })
    }

    fn commit(&self, key: &str, result: Value) {
        let now = Timestamp::now().unix_millis();
        let outcome = self.with_connection(|conn| {
            let blob = serde_json::to_string(&result).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
            conn.execute(
                "INSERT INTO outbox_entries (idempotency_key, state, result_blob, attempts, updated_at) VALUES (?1, 'committed', ?2, 1, ?3)
                 ON CONFLICT(idempotency_key) DO UPDATE SET state = 'committed', result_blob = excluded.result_blob, updated_at = excluded.updated_at",
                params![key, blob, now],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok::<(), SqliteStoreError>(())
        });
        if let Err(err) = outcome {
            tracing::error!(error = %err, key, "outbox commit failed");
        }
    }

    fn fail(&self, key: &str) {
        let now = Timestamp::now().unix_millis();
        let outcome = self.with_connection(|conn| {
            conn.execute("UPDATE outbox_entries SET state = 'failed', updated_at = ?2 WHERE idempotency_key = ?1", params![key, now])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            Ok::<(), SqliteStoreError>(())
        });
        if let Err(err) = outcome {
            tracing::error!(error = %err, key, "outbox fail-mark failed");
        }
    }
}
