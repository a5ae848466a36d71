//! Catalog statistics.
//!
//! A quick summary of what has been imported: record counts per table,
//! database size, and the busiest categories. Used by `discover stats` to
//! confirm an import landed.

use anyhow::Result;
use serde::Serialize;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::output::print_json;
use crate::sqlite_store::SqliteStore;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CatalogStats {
    pub addons: i64,
    pub authors: i64,
    pub categories: i64,
    pub tags: i64,
    pub reviews: i64,
    pub size_bytes: u64,
    pub by_category: Vec<CategoryStats>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryStats {
    pub category_id: i64,
    pub name: String,
    pub addons: i64,
    pub downloads: i64,
}

async fn count(pool: &SqlitePool, table: &str) -> Result<i64> {
    let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await?;
    Ok(n)
}

/// Gather statistics from an open pool.
pub async fn collect_stats(pool: &SqlitePool, config: &Config) -> Result<CatalogStats> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.name, COUNT(a.id) AS addons, COALESCE(SUM(a.downloads), 0) AS downloads
        FROM categories c
        LEFT JOIN addons a ON a.category_id = c.id
        GROUP BY c.id, c.name
        ORDER BY addons DESC, c.id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(CatalogStats {
        addons: count(pool, "addons").await?,
        authors: count(pool, "authors").await?,
        categories: count(pool, "categories").await?,
        tags: count(pool, "tags").await?,
        reviews: count(pool, "reviews").await?,
        size_bytes: std::fs::metadata(&config.db.path)
            .map(|m| m.len())
            .unwrap_or(0),
        by_category: rows
            .iter()
            .map(|r| CategoryStats {
                category_id: r.get("id"),
                name: r.get("name"),
                addons: r.get("addons"),
                downloads: r.get("downloads"),
            })
            .collect(),
    })
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config, json: bool) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let result = collect_stats(store.pool(), config).await;
    store.close().await;
    let stats = result?;

    if json {
        return print_json(&stats);
    }

    println!("Addon Discovery: Catalog Stats");
    println!("==============================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(stats.size_bytes));
    println!();
    println!("  Addons:      {}", stats.addons);
    println!("  Authors:     {}", stats.authors);
    println!("  Categories:  {}", stats.categories);
    println!("  Tags:        {}", stats.tags);
    println!("  Reviews:     {}", stats.reviews);

    if !stats.by_category.is_empty() {
        println!();
        println!("  By category:");
        println!("  {:<28} {:>7} {:>12}", "CATEGORY", "ADDONS", "DOWNLOADS");
        println!("  {}", "-".repeat(49));
        for c in &stats.by_category {
            println!("  {:<28} {:>7} {:>12}", c.name, c.addons, c.downloads);
        }
    }
    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
