//! Canonical SQLite schema for blotter.
//!
//! - `users` and `article` hold the owned entities
//! - `category` keeps per-owner category usage counts
//! - `article_view` and `article_like` are the duplicate-suppression ledger
//! - `store_meta` mirrors the applied schema version and `store_migration`
//!   records when each migration ran

/// Migration v1: entities, ledger tables, and store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(trim(name)) > 0),
    email TEXT NOT NULL UNIQUE,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS article (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '',
    categories TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL DEFAULT '',
    view_count INTEGER NOT NULL DEFAULT 0 CHECK (view_count >= 0),
    like_count INTEGER NOT NULL DEFAULT 0 CHECK (like_count >= 0),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS category (
    user_id INTEGER NOT NULL,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    article_count INTEGER NOT NULL DEFAULT 0 CHECK (article_count >= 0),
    created_at_us INTEGER NOT NULL,
    PRIMARY KEY (user_id, name)
);

CREATE TABLE IF NOT EXISTS article_view (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id INTEGER NOT NULL REFERENCES article(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL DEFAULT 0,
    ip TEXT,
    viewer_key TEXT NOT NULL,
    created_at_us INTEGER NOT NULL,
    UNIQUE (article_id, viewer_key)
);

CREATE TABLE IF NOT EXISTS article_like (
    article_id INTEGER NOT NULL REFERENCES article(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL CHECK (user_id > 0),
    state TEXT NOT NULL CHECK (state IN ('active', 'retracted')),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    PRIMARY KEY (article_id, user_id)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);

CREATE TABLE IF NOT EXISTS store_migration (
    version INTEGER PRIMARY KEY,
    applied_at_us INTEGER NOT NULL
);
";

/// Migration v2: read-path indexes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_article_created
    ON article(created_at_us DESC, id DESC);

CREATE INDEX IF NOT EXISTS idx_article_owner
    ON article(user_id, id);

CREATE INDEX IF NOT EXISTS idx_article_like_user_state
    ON article_like(user_id, state, article_id);

CREATE INDEX IF NOT EXISTS idx_category_user_name
    ON category(user_id, name);
";

/// Indexes expected after all migrations are applied.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_article_created",
    "idx_article_owner",
    "idx_article_like_user_state",
    "idx_category_user_name",
];
