//! SQLite-backed [`TaxonomyStore`] implementation.
//!
//! Structural filters are pushed into SQL with [`QueryBuilder`]. Version
//! compatibility needs component-wise comparison, so fetched rows pass
//! through [`ItemFilter::matches`] before they are returned.

use std::collections::{BTreeSet, HashMap};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::config::Config;
use crate::db;

use addon_discovery_core::models::{Author, Category, Item, Review, Tag, Version};
use addon_discovery_core::store::{
    ItemFilter, ReviewFilter, SharedTagAuthor, TagCountScope, TaxonomyStore,
};

const ITEM_COLUMNS: &str = r#"
    SELECT a.id, a.name, a.description, a.category_id, a.author_id,
           a.rating, a.downloads, a.created_at, a.version_min, a.version_max,
           (SELECT GROUP_CONCAT(t.tag_id) FROM addon_tags t WHERE t.addon_id = a.id) AS tag_list
    FROM addons a
    WHERE 1 = 1
"#;

/// SQLite implementation of the [`TaxonomyStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to the configured database.
    pub async fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_items(&self, mut qb: QueryBuilder<'_, Sqlite>) -> Result<Vec<Item>> {
        qb.push(" ORDER BY a.id");
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(item_from_row).collect()
    }
}

/// Append ` AND <column> IN (?, ?, ...)`.
fn push_in(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, ids: &[i64]) {
    qb.push(" AND ").push(column).push(" IN (");
    let mut sep = qb.separated(", ");
    for id in ids {
        sep.push_bind(*id);
    }
    sep.push_unseparated(")");
}

fn ts_to_datetime(ts: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0).with_context(|| format!("timestamp out of range: {}", ts))
}

fn parse_version(raw: Option<String>) -> Result<Option<Version>> {
    raw.map(|s| s.parse::<Version>())
        .transpose()
        .context("malformed version stored in addons table")
}

fn item_from_row(row: &SqliteRow) -> Result<Item> {
    let tag_list: Option<String> = row.get("tag_list");
    let tag_ids = tag_list
        .as_deref()
        .unwrap_or("")
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>())
        .collect::<std::result::Result<BTreeSet<i64>, _>>()
        .context("malformed tag list")?;

    Ok(Item {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        category_id: row.get("category_id"),
        author_id: row.get("author_id"),
        tag_ids,
        rating: row.get("rating"),
        downloads: row.get("downloads"),
        created_at: ts_to_datetime(row.get("created_at"))?,
        version_min: parse_version(row.get("version_min"))?,
        version_max: parse_version(row.get("version_max"))?,
    })
}

#[async_trait]
impl TaxonomyStore for SqliteStore {
    async fn find_items(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        let mut qb = QueryBuilder::<Sqlite>::new(ITEM_COLUMNS);

        if !filter.category_ids.is_empty() {
            push_in(&mut qb, "a.category_id", &filter.category_ids);
        }
        if !filter.author_ids.is_empty() {
            push_in(&mut qb, "a.author_id", &filter.author_ids);
        }
        if !filter.tag_ids.is_empty() {
            qb.push(" AND EXISTS (SELECT 1 FROM addon_tags ft WHERE ft.addon_id = a.id");
            push_in(&mut qb, "ft.tag_id", &filter.tag_ids);
            qb.push(")");
        }
        if let Some(min) = filter.min_rating {
            qb.push(" AND a.rating >= ").push_bind(min);
        }
        if let Some(max) = filter.max_rating {
            qb.push(" AND a.rating <= ").push_bind(max);
        }
        if let Some(min) = filter.min_downloads {
            qb.push(" AND a.downloads >= ").push_bind(min);
        }
        if let Some(max) = filter.max_downloads {
            qb.push(" AND a.downloads <= ").push_bind(max);
        }
        if let Some(after) = filter.created_after {
            qb.push(" AND a.created_at >= ").push_bind(after.timestamp());
        }
        if let Some(before) = filter.created_before {
            qb.push(" AND a.created_at <= ").push_bind(before.timestamp());
        }

        let items = self.fetch_items(qb).await?;
        Ok(items.into_iter().filter(|i| filter.matches(i)).collect())
    }

    async fn find_items_by_ids(&self, ids: &[i64]) -> Result<Vec<Item>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(ITEM_COLUMNS);
        push_in(&mut qb, "a.id", ids);
        self.fetch_items(qb).await
    }

    async fn count_items_by_tag(&self, scope: &TagCountScope) -> Result<HashMap<i64, i64>> {
        if scope.tag_ids.as_ref().is_some_and(|t| t.is_empty())
            || scope.category_ids.as_ref().is_some_and(|c| c.is_empty())
        {
            return Ok(HashMap::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT t.tag_id, COUNT(DISTINCT t.addon_id) AS item_count
            FROM addon_tags t
            JOIN addons a ON a.id = t.addon_id
            WHERE 1 = 1
            "#,
        );
        if let Some(ref tags) = scope.tag_ids {
            push_in(&mut qb, "t.tag_id", tags);
        }
        if let Some(ref cats) = scope.category_ids {
            push_in(&mut qb, "a.category_id", cats);
        }
        if let Some(since) = scope.since {
            qb.push(" AND a.created_at >= ").push_bind(since.timestamp());
        }
        if let Some(until) = scope.until {
            qb.push(" AND a.created_at <= ").push_bind(until.timestamp());
        }
        qb.push(" GROUP BY t.tag_id");

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|r| (r.get::<i64, _>("tag_id"), r.get::<i64, _>("item_count")))
            .collect())
    }

    async fn find_authors_sharing_tags(
        &self,
        tag_ids: &[i64],
        exclude_author_id: i64,
    ) -> Result<Vec<SharedTagAuthor>> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT au.id AS author_id, au.name, COUNT(DISTINCT t.tag_id) AS shared
            FROM addon_tags t
            JOIN addons a ON a.id = t.addon_id
            JOIN authors au ON au.id = a.author_id
            WHERE a.author_id != "#,
        );
        qb.push_bind(exclude_author_id);
        push_in(&mut qb, "t.tag_id", tag_ids);
        qb.push(" GROUP BY au.id, au.name ORDER BY shared DESC, au.id ASC");

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|r| SharedTagAuthor {
                author_id: r.get("author_id"),
                name: r.get("name"),
                shared_tag_count: r.get("shared"),
            })
            .collect())
    }

    async fn get_item_tags(&self, item_id: i64) -> Result<BTreeSet<i64>> {
        let tags: Vec<i64> = sqlx::query_scalar("SELECT tag_id FROM addon_tags WHERE addon_id = ?")
            .bind(item_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(tags.into_iter().collect())
    }

    async fn get_author(&self, author_id: i64) -> Result<Option<Author>> {
        let row = sqlx::query("SELECT id, name FROM authors WHERE id = ?")
            .bind(author_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Author {
            id: r.get("id"),
            name: r.get("name"),
        }))
    }

    async fn get_author_items(&self, author_id: i64) -> Result<Vec<Item>> {
        let mut qb = QueryBuilder::<Sqlite>::new(ITEM_COLUMNS);
        qb.push(" AND a.author_id = ").push_bind(author_id);
        self.fetch_items(qb).await
    }

    async fn find_tags_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id, name, slug FROM tags WHERE 1 = 1");
        push_in(&mut qb, "id", ids);
        qb.push(" ORDER BY id");

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|r| Tag {
                id: r.get("id"),
                name: r.get("name"),
                slug: r.get("slug"),
            })
            .collect())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name, parent_id FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .iter()
            .map(|r| Category {
                id: r.get("id"),
                name: r.get("name"),
                parent_id: r.get("parent_id"),
            })
            .collect())
    }

    async fn find_reviews(&self, filter: &ReviewFilter) -> Result<Vec<Review>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, addon_id, rating, created_at FROM reviews WHERE 1 = 1",
        );
        if let Some(item_id) = filter.item_id {
            qb.push(" AND addon_id = ").push_bind(item_id);
        }
        if let Some(since) = filter.since {
            qb.push(" AND created_at >= ").push_bind(since.timestamp());
        }
        qb.push(" ORDER BY id");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|r| {
                Ok(Review {
                    id: r.get("id"),
                    item_id: r.get("addon_id"),
                    rating: r.get("rating"),
                    created_at: ts_to_datetime(r.get("created_at"))?,
                })
            })
            .collect()
    }
}
