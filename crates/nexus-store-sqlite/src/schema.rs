//! SQL schema for the SorboNexus SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    is_admin      INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

-- Only the SHA-256 of the token secret is stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS alumni_profiles (
    alumni_id     TEXT PRIMARY KEY,
    user_id       TEXT UNIQUE REFERENCES users(user_id) ON DELETE SET NULL,
    name          TEXT NOT NULL,
    degree        TEXT NOT NULL DEFAULT '',
    position      TEXT NOT NULL DEFAULT '',
    fields_json   TEXT NOT NULL DEFAULT '[]',  -- JSON array of domain tags
    avatar        TEXT NOT NULL DEFAULT '',
    color         TEXT,
    gradient      TEXT,
    hidden        INTEGER NOT NULL DEFAULT 0,
    is_admin      INTEGER NOT NULL DEFAULT 0,
    future_goals  TEXT,
    annee_fin_l3  TEXT,
    nationalities TEXT,
    linkedin      TEXT,
    email         TEXT,
    created_at    TEXT NOT NULL,               -- ISO 8601 UTC
    updated_at    TEXT NOT NULL
);

-- Ordered child rows; position 0 is the undergraduate institution.
CREATE TABLE IF NOT EXISTS schools_applied (
    alumni_id TEXT NOT NULL REFERENCES alumni_profiles(alumni_id) ON DELETE CASCADE,
    position  INTEGER NOT NULL,
    name      TEXT NOT NULL,
    status    TEXT NOT NULL CHECK (status IN ('accepted', 'rejected')),
    PRIMARY KEY (alumni_id, position)
);

CREATE TABLE IF NOT EXISTS grades (
    alumni_id TEXT NOT NULL REFERENCES alumni_profiles(alumni_id) ON DELETE CASCADE,
    position  INTEGER NOT NULL,
    subject   TEXT NOT NULL,
    value     REAL NOT NULL,
    PRIMARY KEY (alumni_id, position)
);

CREATE TABLE IF NOT EXISTS links (
    link_id     TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    url         TEXT NOT NULL,
    description TEXT,
    category    TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS resources (
    resource_id TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    description TEXT,
    category    TEXT,
    file_url    TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- item_id points into alumni_profiles, resources or links depending on
-- item_type, so it carries no foreign key.
CREATE TABLE IF NOT EXISTS bookmarks (
    bookmark_id TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    item_id     TEXT NOT NULL,
    item_type   TEXT NOT NULL CHECK (item_type IN ('alumni', 'ressource', 'link')),
    created_at  TEXT NOT NULL,
    UNIQUE (user_id, item_id, item_type)
);

CREATE INDEX IF NOT EXISTS alumni_created_idx  ON alumni_profiles(created_at);
CREATE INDEX IF NOT EXISTS bookmarks_user_idx  ON bookmarks(user_id, item_type);
CREATE INDEX IF NOT EXISTS sessions_user_idx   ON sessions(user_id);

PRAGMA user_version = 1;
";
