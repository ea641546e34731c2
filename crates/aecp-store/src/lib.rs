// crates/aecp-store/src/lib.rs
// ============================================================================
// Module: Control Plane SQLite Storage Driver
// Description: Public API surface for the production storage backend.
// Purpose: Bind the audit log, snapshot, and outbox persistence contracts
//          defined by aecp-audit / aecp-execution to a durable SQLite
//          database.
// Dependencies: crate::sqlite
// ============================================================================

//! ## Overview
//! `aecp-store` is the single durable binding named by `spec.md` §6: one
//! `SQLite` connection backing the audit log, snapshot store, and outbox,
//! against the schema in `schema.sql`. The in-memory implementations in
//! `aecp-audit` and `aecp-execution` remain the reference bindings used
//! in tests and for standalone/ephemeral use.

pub mod sqlite;

pub use sqlite::SqliteStore;
pub use sqlite::SqliteStoreConfig;
pub use sqlite::SqliteStoreError;
