//! Catalog import.
//!
//! Reads a JSON [`Catalog`] and upserts every record in a single
//! transaction: either the whole file lands or nothing does. Records are
//! keyed by id, so re-importing the same file is idempotent. An addon's tag
//! links are replaced wholesale on each import.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;

use addon_discovery_core::models::Catalog;

/// Counts of records written by one import.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub categories: usize,
    pub authors: usize,
    pub tags: usize,
    pub addons: usize,
    pub reviews: usize,
}

pub fn read_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse catalog file: {}", path.display()))
}

/// Load `path` into the database behind `pool`.
pub async fn run_import(pool: &SqlitePool, path: &Path) -> Result<ImportSummary> {
    let catalog = read_catalog(path)?;
    let summary = import_catalog(pool, &catalog).await?;
    info!(
        file = %path.display(),
        addons = summary.addons,
        tags = summary.tags,
        reviews = summary.reviews,
        "catalog imported"
    );
    Ok(summary)
}

pub async fn import_catalog(pool: &SqlitePool, catalog: &Catalog) -> Result<ImportSummary> {
    let mut tx = pool.begin().await?;

    for c in &catalog.categories {
        sqlx::query(
            r#"
            INSERT INTO categories (id, name, parent_id) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                parent_id = excluded.parent_id
            "#,
        )
        .bind(c.id)
        .bind(&c.name)
        .bind(c.parent_id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to import category {}", c.id))?;
    }

    for a in &catalog.authors {
        sqlx::query(
            "INSERT INTO authors (id, name) VALUES (?, ?) ON CONFLICT(id) DO UPDATE SET name = excluded.name",
        )
        .bind(a.id)
        .bind(&a.name)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to import author {}", a.id))?;
    }

    for t in &catalog.tags {
        sqlx::query(
            r#"
            INSERT INTO tags (id, name, slug) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                slug = excluded.slug
            "#,
        )
        .bind(t.id)
        .bind(&t.name)
        .bind(&t.slug)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to import tag {}", t.id))?;
    }

    for item in &catalog.items {
        sqlx::query(
            r#"
            INSERT INTO addons (id, name, description, category_id, author_id,
                                rating, downloads, created_at, version_min, version_max)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                category_id = excluded.category_id,
                author_id = excluded.author_id,
                rating = excluded.rating,
                downloads = excluded.downloads,
                created_at = excluded.created_at,
                version_min = excluded.version_min,
                version_max = excluded.version_max
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(item.category_id)
        .bind(item.author_id)
        .bind(item.rating)
        .bind(item.downloads)
        .bind(item.created_at.timestamp())
        .bind(item.version_min.as_ref().map(|v| v.to_string()))
        .bind(item.version_max.as_ref().map(|v| v.to_string()))
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to import addon {}", item.id))?;

        replace_tags(&mut tx, item.id, item.tag_ids.iter().copied())
            .await
            .with_context(|| format!("Failed to link tags of addon {}", item.id))?;
    }

    for r in &catalog.reviews {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, addon_id, rating, created_at) VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                addon_id = excluded.addon_id,
                rating = excluded.rating,
                created_at = excluded.created_at
            "#,
        )
        .bind(r.id)
        .bind(r.item_id)
        .bind(r.rating)
        .bind(r.created_at.timestamp())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to import review {}", r.id))?;
    }

    tx.commit().await.context("Failed to commit catalog import")?;

    Ok(ImportSummary {
        categories: catalog.categories.len(),
        authors: catalog.authors.len(),
        tags: catalog.tags.len(),
        addons: catalog.items.len(),
        reviews: catalog.reviews.len(),
    })
}

async fn replace_tags(
    tx: &mut Transaction<'_, Sqlite>,
    addon_id: i64,
    tag_ids: impl Iterator<Item = i64>,
) -> Result<()> {
    sqlx::query("DELETE FROM addon_tags WHERE addon_id = ?")
        .bind(addon_id)
        .execute(&mut **tx)
        .await?;
    for tag_id in tag_ids {
        sqlx::query("INSERT INTO addon_tags (addon_id, tag_id) VALUES (?, ?)")
            .bind(addon_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}
