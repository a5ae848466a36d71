//! Relevance search over catalog items.
//!
//! The search algorithm operates entirely through the [`TaxonomyStore`]
//! trait. Callers build a [`SearchRequest`] and pass tuning knobs as
//! [`SearchParams`], decoupled from application config.
//!
//! # Scoring Algorithm
//!
//! 1. Validate pagination and filter bounds.
//! 2. Fetch the structurally filtered candidates from the store.
//! 3. Empty query: sort by name (asc), id (asc); no scores.
//! 4. Otherwise split the normalized query into distinct keywords. An item
//!    is kept if any keyword occurs in any requested field.
//! 5. For each (keyword, field) pair add `field_match_points` when the
//!    field contains the keyword, plus `prefix_bonus_points` when the field
//!    is primary and starts with it.
//! 6. Sort by score (desc), id (asc).
//! 7. Slice out the requested page.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DiscoveryError, Result};
use crate::models::{category_subtree, Item};
use crate::normalize::{keywords, CaseFoldNormalizer, Normalizer};
use crate::store::{ItemFilter, TaxonomyStore};

/// Item field that keyword matching can look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Name,
    Description,
}

impl SearchField {
    /// Prefix matches on the primary field earn the bonus.
    pub fn is_primary(self) -> bool {
        matches!(self, SearchField::Name)
    }

    pub fn value(self, item: &Item) -> &str {
        match self {
            SearchField::Name => &item.name,
            SearchField::Description => &item.description,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(SearchField::Name),
            "description" => Some(SearchField::Description),
            _ => None,
        }
    }
}

/// Scoring parameters.
///
/// The point values are tunable; only the ordering they produce (a prefix
/// hit on the primary field outranks a plain substring hit) is relied on.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub field_match_points: f64,
    pub prefix_bonus_points: f64,
    /// Already normalized.
    pub stop_words: HashSet<String>,
    pub normalizer: Arc<dyn Normalizer>,
}

impl SearchParams {
    /// Replace the stop-word list, normalizing each entry.
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_words = words
            .into_iter()
            .map(|w| self.normalizer.normalize(w.as_ref()))
            .collect();
        self
    }

    fn validate(&self) -> Result<()> {
        for (name, v) in [
            ("field_match_points", self.field_match_points),
            ("prefix_bonus_points", self.prefix_bonus_points),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(DiscoveryError::invalid(format!(
                    "{} must be a finite number >= 0, got {}",
                    name, v
                )));
            }
        }
        Ok(())
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            field_match_points: 1.0,
            prefix_bonus_points: 2.0,
            stop_words: HashSet::new(),
            normalizer: Arc::new(CaseFoldNormalizer),
        }
    }
}

/// Bundles all inputs for a single search invocation.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    /// Free-text query. Empty means "list, don't score".
    pub query: &'a str,
    pub fields: &'a [SearchField],
    pub filter: ItemFilter,
    /// Expand `filter.category_ids` to their descendant categories.
    pub include_subcategories: bool,
    /// 1-based.
    pub page: i64,
    pub page_size: i64,
}

/// An item with its relevance score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredResult {
    pub item: Item,
    /// `None` for unscored listings (empty query).
    pub score: Option<f64>,
}

/// One page of an ordered result list.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    /// Number of matches across all pages.
    pub total: i64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        if self.page_size < 1 {
            return 0;
        }
        self.total / self.page_size + i64::from(self.total % self.page_size != 0)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// Run a relevance search against a [`TaxonomyStore`].
pub async fn search<S: TaxonomyStore + ?Sized>(
    store: &S,
    req: &SearchRequest<'_>,
    params: &SearchParams,
) -> Result<Page<ScoredResult>> {
    if req.page < 1 {
        return Err(DiscoveryError::invalid(format!(
            "page must be >= 1, got {}",
            req.page
        )));
    }
    if req.page_size < 1 {
        return Err(DiscoveryError::invalid(format!(
            "page_size must be >= 1, got {}",
            req.page_size
        )));
    }
    req.filter.validate()?;
    params.validate()?;

    let mut filter = req.filter.clone();
    if req.include_subcategories && !filter.category_ids.is_empty() {
        let categories = store.list_categories().await?;
        filter.category_ids = category_subtree(&categories, &filter.category_ids);
    }

    let candidates = store.find_items(&filter).await?;
    let terms = keywords(params.normalizer.as_ref(), req.query, &params.stop_words);

    let ranked = if terms.is_empty() {
        debug!(candidates = candidates.len(), "listing without query");
        list_by_name(candidates)
    } else {
        let fields = distinct_fields(req.fields);
        let ranked = rank(candidates, &terms, &fields, params);
        debug!(
            keywords = terms.len(),
            matches = ranked.len(),
            "scored search"
        );
        ranked
    };

    Ok(paginate(ranked, req.page, req.page_size))
}

fn distinct_fields(fields: &[SearchField]) -> Vec<SearchField> {
    let mut seen = HashSet::new();
    fields.iter().copied().filter(|f| seen.insert(*f)).collect()
}

fn list_by_name(mut items: Vec<Item>) -> Vec<ScoredResult> {
    items.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    items
        .into_iter()
        .map(|item| ScoredResult { item, score: None })
        .collect()
}

fn rank(
    items: Vec<Item>,
    terms: &[String],
    fields: &[SearchField],
    params: &SearchParams,
) -> Vec<ScoredResult> {
    let mut results: Vec<ScoredResult> = items
        .into_iter()
        .filter_map(|item| {
            score_item(&item, terms, fields, params).map(|s| ScoredResult {
                item,
                score: Some(s),
            })
        })
        .collect();

    results.sort_by(|a, b| {
        let sa = a.score.unwrap_or(0.0);
        let sb = b.score.unwrap_or(0.0);
        sb.partial_cmp(&sa)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.item.id.cmp(&b.item.id))
    });
    results
}

/// Score one item, or `None` if no keyword occurs in any field.
pub fn score_item(
    item: &Item,
    terms: &[String],
    fields: &[SearchField],
    params: &SearchParams,
) -> Option<f64> {
    let normalized: Vec<(SearchField, String)> = fields
        .iter()
        .map(|f| (*f, params.normalizer.normalize(f.value(item))))
        .collect();

    let mut matched = false;
    let mut score = 0.0;
    for term in terms {
        for (field, value) in &normalized {
            if !value.contains(term.as_str()) {
                continue;
            }
            matched = true;
            score += params.field_match_points;
            if field.is_primary() && value.starts_with(term.as_str()) {
                score += params.prefix_bonus_points;
            }
        }
    }

    matched.then_some(score)
}

fn paginate<T>(all: Vec<T>, page: i64, page_size: i64) -> Page<T> {
    let total = all.len() as i64;
    let start = ((page - 1).saturating_mul(page_size)).min(total) as usize;
    let items: Vec<T> = all.into_iter().skip(start).take(page_size as usize).collect();
    Page {
        items,
        page,
        page_size,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Version};
    use crate::store::memory::fixtures::*;
    use crate::store::memory::InMemoryStore;

    const NAME: &[SearchField] = &[SearchField::Name];
    const BOTH: &[SearchField] = &[SearchField::Name, SearchField::Description];

    fn request<'a>(query: &'a str, fields: &'a [SearchField]) -> SearchRequest<'a> {
        SearchRequest {
            query,
            fields,
            filter: ItemFilter::new(),
            include_subcategories: false,
            page: 1,
            page_size: 50,
        }
    }

    fn ids(page: &Page<ScoredResult>) -> Vec<i64> {
        page.items.iter().map(|r| r.item.id).collect()
    }

    fn catalog() -> InMemoryStore {
        let store = InMemoryStore::new();
        let mut a = item(1, "Video Player", 1, 1, &[1]);
        a.description = "Plays local media files".into();
        a.rating = 4.5;
        let mut b = item(2, "Video Downloader", 1, 2, &[1, 2]);
        b.description = "Grab any video from the web".into();
        b.rating = 3.0;
        let mut c = item(3, "Weather Widget", 2, 1, &[3]);
        c.description = "Forecast without video ads".into();
        c.rating = 4.9;
        store.upsert_item(a);
        store.upsert_item(b);
        store.upsert_item(c);
        store
    }

    #[tokio::test]
    async fn test_prefix_matches_on_name() {
        let store = catalog();
        let page = search(&store, &request("video", NAME), &SearchParams::default())
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![1, 2]);
        assert_eq!(page.items[0].score, Some(3.0));
        assert_eq!(page.items[1].score, Some(3.0));
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_name_prefix_outranks_description_hit() {
        let store = catalog();
        let page = search(&store, &request("video", BOTH), &SearchParams::default())
            .await
            .unwrap();
        // 2 matches name prefix and description; 1 only name prefix; 3 only description.
        assert_eq!(ids(&page), vec![2, 1, 3]);
        assert_eq!(page.items[0].score, Some(4.0));
        assert_eq!(page.items[2].score, Some(1.0));
    }

    #[tokio::test]
    async fn test_keywords_are_or_combined() {
        let store = catalog();
        let page = search(
            &store,
            &request("weather downloader", NAME),
            &SearchParams::default(),
        )
        .await
        .unwrap();
        assert_eq!(ids(&page), vec![3, 2]);
        // "weather" is a prefix of item 3; "downloader" is a substring of item 2.
        assert_eq!(page.items[0].score, Some(3.0));
        assert_eq!(page.items[1].score, Some(1.0));
    }

    #[tokio::test]
    async fn test_matching_is_case_insensitive() {
        let store = catalog();
        let page = search(&store, &request("VIDEO", NAME), &SearchParams::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn test_additional_occurrence_never_lowers_score() {
        let store = InMemoryStore::new();
        let mut plain = item(1, "Clock", 1, 1, &[]);
        plain.description = "shows time".into();
        let mut richer = item(2, "Clock", 1, 1, &[]);
        richer.description = "clock that shows time".into();
        store.upsert_item(plain);
        store.upsert_item(richer);

        let page = search(&store, &request("clock", BOTH), &SearchParams::default())
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![2, 1]);
        assert!(page.items[0].score > page.items[1].score);
    }

    #[tokio::test]
    async fn test_filters_apply_before_scoring() {
        let store = catalog();
        let mut req = request("video", BOTH);
        req.filter = ItemFilter::new().rating_between(Some(4.0), None);
        let page = search(&store, &req, &SearchParams::default()).await.unwrap();
        assert_eq!(ids(&page), vec![1, 3]);
        assert!(page.items.iter().all(|r| r.item.rating >= 4.0));

        req.filter = ItemFilter::new().tags([2]);
        let page = search(&store, &req, &SearchParams::default()).await.unwrap();
        assert_eq!(ids(&page), vec![2]);
    }

    #[tokio::test]
    async fn test_version_filter() {
        let store = catalog();
        let mut old = item(4, "Video Legacy", 1, 1, &[]);
        old.version_min = Some("1.0".parse().unwrap());
        old.version_max = Some("1.9".parse().unwrap());
        store.upsert_item(old);

        let mut req = request("video", NAME);
        req.filter = ItemFilter::new().compatible_with("2.0".parse::<Version>().unwrap());
        let page = search(&store, &req, &SearchParams::default()).await.unwrap();
        assert!(!ids(&page).contains(&4));
    }

    #[tokio::test]
    async fn test_empty_query_lists_by_name() {
        let store = InMemoryStore::new();
        for i in 1..=15 {
            // Names deliberately out of id order.
            store.upsert_item(item(i, &format!("Addon {:02}", 16 - i), 5, 1, &[]));
        }
        store.upsert_item(item(99, "Elsewhere", 6, 1, &[]));

        let req = SearchRequest {
            query: "   ",
            fields: NAME,
            filter: ItemFilter::new().categories([5]),
            include_subcategories: false,
            page: 2,
            page_size: 10,
        };
        let page = search(&store, &req, &SearchParams::default()).await.unwrap();
        assert_eq!(page.total, 15);
        assert_eq!(page.items.len(), 5);
        let names: Vec<&str> = page.items.iter().map(|r| r.item.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Addon 11", "Addon 12", "Addon 13", "Addon 14", "Addon 15"]
        );
        assert!(page.items.iter().all(|r| r.score.is_none()));
        assert!(!page.has_next());
    }

    #[tokio::test]
    async fn test_invalid_pagination_is_rejected() {
        let store = catalog();
        for (page, size) in [(0, 10), (1, 0), (-3, 10), (1, -1)] {
            let mut req = request("video", NAME);
            req.page = page;
            req.page_size = size;
            let err = search(&store, &req, &SearchParams::default())
                .await
                .unwrap_err();
            assert!(err.is_invalid_argument());
        }
    }

    #[tokio::test]
    async fn test_malformed_filter_is_rejected() {
        let store = catalog();
        let mut req = request("video", NAME);
        req.filter = ItemFilter::new().rating_between(Some(f64::NAN), None);
        assert!(search(&store, &req, &SearchParams::default())
            .await
            .unwrap_err()
            .is_invalid_argument());
    }

    #[tokio::test]
    async fn test_pages_concatenate_to_full_result() {
        let store = InMemoryStore::new();
        for i in 1..=23 {
            let name = if i % 3 == 0 {
                format!("Tool {}", i)
            } else {
                format!("My tool {}", i)
            };
            store.upsert_item(item(i, &name, 1, 1, &[]));
        }
        let params = SearchParams::default();
        let mut whole = request("tool", NAME);
        whole.page_size = 1000;
        let full = ids(&search(&store, &whole, &params).await.unwrap());

        let mut stitched = Vec::new();
        for page in 1..=5 {
            let mut req = request("tool", NAME);
            req.page = page;
            req.page_size = 5;
            stitched.extend(ids(&search(&store, &req, &params).await.unwrap()));
        }
        assert_eq!(stitched, full);
        assert_eq!(full.len(), 23);
    }

    #[tokio::test]
    async fn test_repeated_searches_are_identical() {
        let store = catalog();
        let params = SearchParams::default();
        let first = ids(&search(&store, &request("video web", BOTH), &params)
            .await
            .unwrap());
        for _ in 0..5 {
            let again = ids(&search(&store, &request("video web", BOTH), &params)
                .await
                .unwrap());
            assert_eq!(again, first);
        }
    }

    #[tokio::test]
    async fn test_subcategories_expand_filter() {
        let store = catalog();
        store.upsert_category(Category {
            id: 1,
            name: "Media".into(),
            parent_id: None,
        });
        store.upsert_category(Category {
            id: 7,
            name: "Streaming".into(),
            parent_id: Some(1),
        });
        store.upsert_item(item(8, "Video Stream", 7, 1, &[]));

        let mut req = request("video", NAME);
        req.filter = ItemFilter::new().categories([1]);
        let flat = search(&store, &req, &SearchParams::default()).await.unwrap();
        assert!(!ids(&flat).contains(&8));

        req.include_subcategories = true;
        let deep = search(&store, &req, &SearchParams::default()).await.unwrap();
        assert!(ids(&deep).contains(&8));
    }

    #[tokio::test]
    async fn test_stop_words_and_custom_points() {
        let store = catalog();
        let params = SearchParams {
            field_match_points: 5.0,
            prefix_bonus_points: 0.0,
            ..SearchParams::default()
        }
        .with_stop_words(["The"]);
        let page = search(&store, &request("the video", NAME), &params)
            .await
            .unwrap();
        assert_eq!(page.items[0].score, Some(5.0));

        let bad = SearchParams {
            prefix_bonus_points: -1.0,
            ..SearchParams::default()
        };
        assert!(search(&store, &request("video", NAME), &bad)
            .await
            .unwrap_err()
            .is_invalid_argument());
    }

    #[tokio::test]
    async fn test_page_past_end_is_empty() {
        let store = catalog();
        let mut req = request("video", NAME);
        req.page = 9;
        req.page_size = 10;
        let page = search(&store, &req, &SearchParams::default()).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages(), 1);
    }

    #[test]
    fn test_total_pages_with_huge_page_size() {
        let page = |total, page_size| Page::<ScoredResult> {
            items: Vec::new(),
            page: 1,
            page_size,
            total,
        };
        assert_eq!(page(2, i64::MAX).total_pages(), 1);
        assert!(!page(2, i64::MAX).has_next());
        assert_eq!(page(0, 10).total_pages(), 0);
        assert_eq!(page(20, 10).total_pages(), 2);
        assert_eq!(page(21, 10).total_pages(), 3);
    }

    #[tokio::test]
    async fn test_max_page_size_is_accepted() {
        let store = catalog();
        let mut req = request("video", NAME);
        req.page_size = i64::MAX;
        let page = search(&store, &req, &SearchParams::default()).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.total_pages(), 1);
    }
}
