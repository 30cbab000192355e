//! SQL schema for the Tabula SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    auth_subject  TEXT NOT NULL UNIQUE,
    created_date  TEXT NOT NULL
);

-- One row per (owner, uuid); backups upsert against this key.
CREATE TABLE IF NOT EXISTS files (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid           TEXT NOT NULL,
    name           TEXT NOT NULL,
    contents       TEXT,             -- JSON document or NULL
    version        TEXT,
    times_updated  INTEGER NOT NULL DEFAULT 1,
    created_date   TEXT NOT NULL,    -- RFC 3339 UTC
    updated_date   TEXT NOT NULL,    -- RFC 3339 UTC
    owner_id       INTEGER NOT NULL REFERENCES users(id),
    UNIQUE (owner_id, uuid)
);

CREATE INDEX IF NOT EXISTS files_owner_idx ON files(owner_id);

PRAGMA user_version = 1;
";
