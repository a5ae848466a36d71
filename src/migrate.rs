//! Catalog schema.
//!
//! Every statement is `IF NOT EXISTS`, so running `discover init` again is
//! a no-op. Timestamps are stored as Unix seconds, versions as text.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use crate::config::Config;
use crate::db;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        parent_id INTEGER REFERENCES categories(id) DEFERRABLE INITIALLY DEFERRED
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS authors (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        slug TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS addons (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        category_id INTEGER NOT NULL REFERENCES categories(id),
        author_id INTEGER NOT NULL REFERENCES authors(id),
        rating REAL NOT NULL DEFAULT 0,
        downloads INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL,
        version_min TEXT,
        version_max TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS addon_tags (
        addon_id INTEGER NOT NULL REFERENCES addons(id) ON DELETE CASCADE,
        tag_id INTEGER NOT NULL REFERENCES tags(id),
        PRIMARY KEY (addon_id, tag_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reviews (
        id INTEGER PRIMARY KEY,
        addon_id INTEGER NOT NULL REFERENCES addons(id) ON DELETE CASCADE,
        rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
        created_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_addons_category ON addons(category_id)",
    "CREATE INDEX IF NOT EXISTS idx_addons_author ON addons(author_id)",
    "CREATE INDEX IF NOT EXISTS idx_addons_created_at ON addons(created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_addon_tags_tag ON addon_tags(tag_id)",
    "CREATE INDEX IF NOT EXISTS idx_reviews_addon ON reviews(addon_id, created_at)",
];

/// Create the database file if needed and apply the schema.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply_schema(&pool).await?;
    pool.close().await;
    info!(path = %config.db.path.display(), "schema ready");
    Ok(())
}

/// Apply the schema to an open pool.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
