//! SQL schema for the Vigia SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- The fixed state catalog. Rows are immutable once inserted.
CREATE TABLE IF NOT EXISTS states (
    state_id TEXT PRIMARY KEY,
    code     TEXT NOT NULL UNIQUE,
    name     TEXT NOT NULL,
    level    INTEGER NOT NULL,
    color    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS resources (
    resource_id  TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    active       INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS entities (
    entity_id    TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    active       INTEGER NOT NULL DEFAULT 1
);

-- Document types. The date/state columns are used only when is_universal=1;
-- non-universal documents carry dates and state on their assignments.
CREATE TABLE IF NOT EXISTS documents (
    document_id       TEXT PRIMARY KEY,
    code              TEXT NOT NULL UNIQUE,
    name              TEXT NOT NULL,
    validity_days     INTEGER NOT NULL,
    anticipation_days INTEGER NOT NULL,
    is_universal      INTEGER NOT NULL DEFAULT 0,
    emission_date     TEXT,
    processing_date   TEXT,
    expiration_date   TEXT,
    state_id          TEXT REFERENCES states(state_id)
);

CREATE TABLE IF NOT EXISTS resource_assignments (
    assignment_id   TEXT PRIMARY KEY,
    document_id     TEXT NOT NULL REFERENCES documents(document_id),
    resource_id     TEXT NOT NULL REFERENCES resources(resource_id),
    emission_date   TEXT,
    processing_date TEXT,
    expiration_date TEXT,
    state_id        TEXT REFERENCES states(state_id),
    UNIQUE (document_id, resource_id)
);

CREATE TABLE IF NOT EXISTS entity_assignments (
    assignment_id   TEXT PRIMARY KEY,
    document_id     TEXT NOT NULL REFERENCES documents(document_id),
    entity_id       TEXT NOT NULL REFERENCES entities(entity_id),
    emission_date   TEXT,
    processing_date TEXT,
    expiration_date TEXT,
    state_id        TEXT REFERENCES states(state_id),
    UNIQUE (document_id, entity_id)
);

-- The audit trail is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS audit_log (
    entry_id          TEXT PRIMARY KEY,
    kind              TEXT NOT NULL,   -- 'resource' | 'entity' | 'universal'
    document_id       TEXT NOT NULL REFERENCES documents(document_id),
    holder_id         TEXT,
    previous_state_id TEXT REFERENCES states(state_id),
    new_state_id      TEXT NOT NULL REFERENCES states(state_id),
    reason            TEXT NOT NULL,
    actor_user_id     TEXT,            -- NULL for automatic runs
    mode              TEXT NOT NULL,   -- 'manual' | 'automatic'
    recorded_at       TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

CREATE INDEX IF NOT EXISTS resource_assignments_doc_idx ON resource_assignments(document_id);
CREATE INDEX IF NOT EXISTS entity_assignments_doc_idx   ON entity_assignments(document_id);
CREATE INDEX IF NOT EXISTS audit_document_idx ON audit_log(document_id);
CREATE INDEX IF NOT EXISTS audit_holder_idx   ON audit_log(holder_id);
CREATE INDEX IF NOT EXISTS audit_recorded_idx ON audit_log(recorded_at);

PRAGMA user_version = 1;
";
