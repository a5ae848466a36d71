//! Taxonomy store abstraction.
//!
//! The [`TaxonomyStore`] trait is the only boundary between the discovery
//! core and whatever holds the catalog (SQLite, in-memory fixtures, a
//! remote service). The core never writes through it.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::DiscoveryError;
use crate::models::{Author, Category, Item, Review, Tag, Version};

/// Structural item filter.
///
/// Distinct fields combine with AND. The id lists are any-of sets; an
/// empty list places no constraint. Unknown keys cannot be expressed.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub category_ids: Vec<i64>,
    pub author_ids: Vec<i64>,
    /// Item must carry at least one of these tags.
    pub tag_ids: Vec<i64>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub min_downloads: Option<i64>,
    pub max_downloads: Option<i64>,
    /// Item's supported version range must contain this version.
    pub compatible_with: Option<Version>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl ItemFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn categories(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.category_ids = ids.into_iter().collect();
        self
    }

    pub fn authors(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.author_ids = ids.into_iter().collect();
        self
    }

    pub fn tags(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.tag_ids = ids.into_iter().collect();
        self
    }

    pub fn rating_between(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_rating = min;
        self.max_rating = max;
        self
    }

    pub fn downloads_between(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_downloads = min;
        self.max_downloads = max;
        self
    }

    pub fn compatible_with(mut self, version: Version) -> Self {
        self.compatible_with = Some(version);
        self
    }

    pub fn created_between(
        mut self,
        after: Option<DateTime<Utc>>,
        before: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_after = after;
        self.created_before = before;
        self
    }

    /// Check that every bound is well-formed.
    pub fn validate(&self) -> crate::Result<()> {
        for (name, bound) in [("min_rating", self.min_rating), ("max_rating", self.max_rating)] {
            if let Some(r) = bound {
                if !(0.0..=5.0).contains(&r) {
                    return Err(DiscoveryError::invalid(format!(
                        "{} must be within 0.0..=5.0, got {}",
                        name, r
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_rating, self.max_rating) {
            if min > max {
                return Err(DiscoveryError::invalid(format!(
                    "min_rating {} exceeds max_rating {}",
                    min, max
                )));
            }
        }

        for (name, bound) in [
            ("min_downloads", self.min_downloads),
            ("max_downloads", self.max_downloads),
        ] {
            if let Some(d) = bound {
                if d < 0 {
                    return Err(DiscoveryError::invalid(format!(
                        "{} must be >= 0, got {}",
                        name, d
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_downloads, self.max_downloads) {
            if min > max {
                return Err(DiscoveryError::invalid(format!(
                    "min_downloads {} exceeds max_downloads {}",
                    min, max
                )));
            }
        }

        if let (Some(after), Some(before)) = (self.created_after, self.created_before) {
            if after > before {
                return Err(DiscoveryError::invalid(
                    "created_after is later than created_before",
                ));
            }
        }

        Ok(())
    }

    /// Reference predicate for every filter key.
    pub fn matches(&self, item: &Item) -> bool {
        if !self.category_ids.is_empty() && !self.category_ids.contains(&item.category_id) {
            return false;
        }
        if !self.author_ids.is_empty() && !self.author_ids.contains(&item.author_id) {
            return false;
        }
        if !self.tag_ids.is_empty() && !self.tag_ids.iter().any(|t| item.tag_ids.contains(t)) {
            return false;
        }
        if self.min_rating.is_some_and(|min| item.rating < min) {
            return false;
        }
        if self.max_rating.is_some_and(|max| item.rating > max) {
            return false;
        }
        if self.min_downloads.is_some_and(|min| item.downloads < min) {
            return false;
        }
        if self.max_downloads.is_some_and(|max| item.downloads > max) {
            return false;
        }
        if let Some(ref v) = self.compatible_with {
            if !item.is_compatible_with(v) {
                return false;
            }
        }
        if self.created_after.is_some_and(|after| item.created_at < after) {
            return false;
        }
        if self.created_before.is_some_and(|before| item.created_at > before) {
            return false;
        }
        true
    }
}

/// Scope for the per-tag item counting primitive.
#[derive(Debug, Clone, Default)]
pub struct TagCountScope {
    /// Count only these tags. `None` counts every tag.
    pub tag_ids: Option<Vec<i64>>,
    /// Count only items in these categories.
    pub category_ids: Option<Vec<i64>>,
    /// Count only items created at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Count only items created at or before this instant.
    pub until: Option<DateTime<Utc>>,
}

impl TagCountScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_categories(category_ids: Vec<i64>) -> Self {
        Self {
            category_ids: Some(category_ids),
            ..Self::default()
        }
    }

    pub fn since(since: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            ..Self::default()
        }
    }

    /// Items created within `[since, until]`.
    pub fn created_between(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: Some(until),
            ..Self::default()
        }
    }

    pub fn includes(&self, item: &Item) -> bool {
        if let Some(ref cats) = self.category_ids {
            if !cats.contains(&item.category_id) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if item.created_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if item.created_at > until {
                return false;
            }
        }
        true
    }
}

/// An author with items overlapping a tag set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedTagAuthor {
    pub author_id: i64,
    pub name: String,
    /// Number of distinct tags shared, not number of items.
    pub shared_tag_count: i64,
}

/// Review selection for activity bucketing.
#[derive(Debug, Clone, Default)]
pub struct ReviewFilter {
    pub item_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
}

impl ReviewFilter {
    pub fn matches(&self, review: &Review) -> bool {
        self.item_id.map_or(true, |id| review.item_id == id)
            && self.since.map_or(true, |since| review.created_at >= since)
    }
}

/// Read-only query interface over the catalog.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`find_items`](TaxonomyStore::find_items) | Items matching an [`ItemFilter`] |
/// | [`find_items_by_ids`](TaxonomyStore::find_items_by_ids) | Items by id |
/// | [`count_items_by_tag`](TaxonomyStore::count_items_by_tag) | Distinct item count per tag |
/// | [`find_authors_sharing_tags`](TaxonomyStore::find_authors_sharing_tags) | Authors overlapping a tag set |
/// | [`get_item_tags`](TaxonomyStore::get_item_tags) | Tag ids of one item |
/// | [`get_author`](TaxonomyStore::get_author) | Author by id |
/// | [`get_author_items`](TaxonomyStore::get_author_items) | Items created by an author |
/// | [`find_tags_by_ids`](TaxonomyStore::find_tags_by_ids) | Tag records by id |
/// | [`list_categories`](TaxonomyStore::list_categories) | The category tree |
/// | [`find_reviews`](TaxonomyStore::find_reviews) | Reviews matching a [`ReviewFilter`] |
#[async_trait]
pub trait TaxonomyStore: Send + Sync {
    /// Return every item matching `filter`.
    async fn find_items(&self, filter: &ItemFilter) -> Result<Vec<Item>>;

    /// Return the items with the given ids. Unknown ids are skipped.
    async fn find_items_by_ids(&self, ids: &[i64]) -> Result<Vec<Item>>;

    /// Count distinct items per tag within `scope`.
    ///
    /// Tags with no items in scope are absent from the map.
    async fn count_items_by_tag(&self, scope: &TagCountScope) -> Result<HashMap<i64, i64>>;

    /// Authors other than `exclude_author_id` owning at least one item
    /// tagged with any of `tag_ids`, with their distinct shared-tag count.
    async fn find_authors_sharing_tags(
        &self,
        tag_ids: &[i64],
        exclude_author_id: i64,
    ) -> Result<Vec<SharedTagAuthor>>;

    async fn get_item_tags(&self, item_id: i64) -> Result<BTreeSet<i64>>;

    async fn get_author(&self, author_id: i64) -> Result<Option<Author>>;

    async fn get_author_items(&self, author_id: i64) -> Result<Vec<Item>>;

    async fn find_tags_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn find_reviews(&self, filter: &ReviewFilter) -> Result<Vec<Review>>;
}
