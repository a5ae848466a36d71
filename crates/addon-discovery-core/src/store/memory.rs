//! In-memory [`TaxonomyStore`] implementation for tests and embedding.
//!
//! Uses `BTreeMap` behind `std::sync::RwLock` for thread safety. Every
//! query is a linear scan; results come back ordered by id.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Author, Catalog, Category, Item, Review, Tag};

use super::{ItemFilter, ReviewFilter, SharedTagAuthor, TagCountScope, TaxonomyStore};

/// In-memory catalog store.
pub struct InMemoryStore {
    items: RwLock<BTreeMap<i64, Item>>,
    tags: RwLock<BTreeMap<i64, Tag>>,
    categories: RwLock<BTreeMap<i64, Category>>,
    authors: RwLock<BTreeMap<i64, Author>>,
    reviews: RwLock<BTreeMap<i64, Review>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            tags: RwLock::new(BTreeMap::new()),
            categories: RwLock::new(BTreeMap::new()),
            authors: RwLock::new(BTreeMap::new()),
            reviews: RwLock::new(BTreeMap::new()),
        }
    }

    /// Build a store holding every record of `catalog`.
    pub fn from_catalog(catalog: Catalog) -> Self {
        let store = Self::new();
        for c in catalog.categories {
            store.upsert_category(c);
        }
        for a in catalog.authors {
            store.upsert_author(a);
        }
        for t in catalog.tags {
            store.upsert_tag(t);
        }
        for i in catalog.items {
            store.upsert_item(i);
        }
        for r in catalog.reviews {
            store.upsert_review(r);
        }
        store
    }

    pub fn upsert_item(&self, item: Item) {
        self.items.write().unwrap().insert(item.id, item);
    }

    pub fn upsert_tag(&self, tag: Tag) {
        self.tags.write().unwrap().insert(tag.id, tag);
    }

    pub fn upsert_category(&self, category: Category) {
        self.categories.write().unwrap().insert(category.id, category);
    }

    pub fn upsert_author(&self, author: Author) {
        self.authors.write().unwrap().insert(author.id, author);
    }

    pub fn upsert_review(&self, review: Review) {
        self.reviews.write().unwrap().insert(review.id, review);
    }

    pub fn item_count(&self) -> usize {
        self.items.read().unwrap().len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaxonomyStore for InMemoryStore {
    async fn find_items(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        let items = self.items.read().unwrap();
        Ok(items
            .values()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect())
    }

    async fn find_items_by_ids(&self, ids: &[i64]) -> Result<Vec<Item>> {
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        let items = self.items.read().unwrap();
        Ok(wanted
            .iter()
            .filter_map(|id| items.get(id).cloned())
            .collect())
    }

    async fn count_items_by_tag(&self, scope: &TagCountScope) -> Result<HashMap<i64, i64>> {
        let items = self.items.read().unwrap();
        let mut counts: HashMap<i64, i64> = HashMap::new();
        for item in items.values().filter(|i| scope.includes(i)) {
            for tag_id in &item.tag_ids {
                if let Some(ref only) = scope.tag_ids {
                    if !only.contains(tag_id) {
                        continue;
                    }
                }
                *counts.entry(*tag_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn find_authors_sharing_tags(
        &self,
        tag_ids: &[i64],
        exclude_author_id: i64,
    ) -> Result<Vec<SharedTagAuthor>> {
        let wanted: BTreeSet<i64> = tag_ids.iter().copied().collect();
        let items = self.items.read().unwrap();
        let authors = self.authors.read().unwrap();

        let mut shared: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
        for item in items.values() {
            if item.author_id == exclude_author_id {
                continue;
            }
            let overlap: Vec<i64> = item.tag_ids.intersection(&wanted).copied().collect();
            if overlap.is_empty() {
                continue;
            }
            shared.entry(item.author_id).or_default().extend(overlap);
        }

        let mut result: Vec<SharedTagAuthor> = shared
            .into_iter()
            .filter_map(|(author_id, tags)| {
                authors.get(&author_id).map(|a| SharedTagAuthor {
                    author_id,
                    name: a.name.clone(),
                    shared_tag_count: tags.len() as i64,
                })
            })
            .collect();
        result.sort_by(|a, b| {
            b.shared_tag_count
                .cmp(&a.shared_tag_count)
                .then(a.author_id.cmp(&b.author_id))
        });
        Ok(result)
    }

    async fn get_item_tags(&self, item_id: i64) -> Result<BTreeSet<i64>> {
        let items = self.items.read().unwrap();
        Ok(items
            .get(&item_id)
            .map(|i| i.tag_ids.clone())
            .unwrap_or_default())
    }

    async fn get_author(&self, author_id: i64) -> Result<Option<Author>> {
        Ok(self.authors.read().unwrap().get(&author_id).cloned())
    }

    async fn get_author_items(&self, author_id: i64) -> Result<Vec<Item>> {
        let items = self.items.read().unwrap();
        Ok(items
            .values()
            .filter(|i| i.author_id == author_id)
            .cloned()
            .collect())
    }

    async fn find_tags_by_ids(&self, ids: &[i64]) -> Result<Vec<Tag>> {
        let tags = self.tags.read().unwrap();
        let wanted: BTreeSet<i64> = ids.iter().copied().collect();
        Ok(wanted.iter().filter_map(|id| tags.get(id).cloned()).collect())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.read().unwrap().values().cloned().collect())
    }

    async fn find_reviews(&self, filter: &ReviewFilter) -> Result<Vec<Review>> {
        let reviews = self.reviews.read().unwrap();
        Ok(reviews
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }
}
