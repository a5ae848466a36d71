//! Tag analytics: usage counts, co-occurrence, trending, and tag clouds.
//!
//! Every operation reduces to the same primitive: count items per tag over
//! some item scope, drop zero counts, then rank by count (desc) with the
//! tag id (asc) as tie-break. Tag records are attached last.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{check_limit, DiscoveryError, Result};
use crate::models::Tag;
use crate::store::{ItemFilter, TagCountScope, TaxonomyStore};

/// A tag with the number of items carrying it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagFrequency {
    pub tag: Tag,
    pub count: i64,
}

/// A tag-cloud entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedTag {
    pub tag: Tag,
    /// Raw usage count.
    pub count: i64,
    /// Count mapped onto `1..=max_weight`.
    pub weight: u32,
}

/// Tag cloud scaling.
#[derive(Debug, Clone, Copy)]
pub struct CloudParams {
    pub max_weight: u32,
}

impl Default for CloudParams {
    fn default() -> Self {
        Self { max_weight: 10 }
    }
}

/// Every tag used by at least one item, with its item count.
///
/// Callers sort as needed; entries come back in tag id order.
pub async fn tags_with_counts<S: TaxonomyStore + ?Sized>(
    store: &S,
) -> Result<Vec<TagFrequency>> {
    let counts = store.count_items_by_tag(&TagCountScope::all()).await?;
    let ordered: Vec<(i64, i64)> = counts
        .into_iter()
        .filter(|(_, c)| *c > 0)
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .collect();
    attach_tags(store, ordered).await
}

/// Tags that appear alongside `tag_id`, most frequent first.
pub async fn related_tags<S: TaxonomyStore + ?Sized>(
    store: &S,
    tag_id: i64,
    limit: i64,
) -> Result<Vec<TagFrequency>> {
    let limit = check_limit("limit", limit)?;
    if limit == 0 {
        return Ok(Vec::new());
    }

    let items = store.find_items(&ItemFilter::new().tags([tag_id])).await?;
    let mut counts: HashMap<i64, i64> = HashMap::new();
    for item in &items {
        for other in item.tag_ids.iter().filter(|t| **t != tag_id) {
            *counts.entry(*other).or_insert(0) += 1;
        }
    }

    debug!(tag_id, items = items.len(), related = counts.len(), "related tags");
    attach_tags(store, rank_counts(counts, limit)).await
}

/// Most used tags among items created in the last `window_days` days.
pub async fn trending_tags<S: TaxonomyStore + ?Sized>(
    store: &S,
    window_days: i64,
    limit: i64,
) -> Result<Vec<TagFrequency>> {
    trending_tags_at(store, window_days, limit, Utc::now()).await
}

/// [`trending_tags`] with an explicit "now".
pub async fn trending_tags_at<S: TaxonomyStore + ?Sized>(
    store: &S,
    window_days: i64,
    limit: i64,
    now: DateTime<Utc>,
) -> Result<Vec<TagFrequency>> {
    if window_days < 0 {
        return Err(DiscoveryError::invalid(format!(
            "window_days must be >= 0, got {}",
            window_days
        )));
    }
    let limit = check_limit("limit", limit)?;
    if limit == 0 {
        return Ok(Vec::new());
    }

    let since = Duration::try_days(window_days)
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let counts = store
        .count_items_by_tag(&TagCountScope::created_between(since, now))
        .await?;
    debug!(window_days, %since, tags = counts.len(), "trending tags");
    attach_tags(store, rank_counts(counts, limit)).await
}

/// Top `limit` tags with counts scaled onto `1..=max_weight`.
///
/// With `category_id`, only that category's items are counted.
pub async fn tag_cloud<S: TaxonomyStore + ?Sized>(
    store: &S,
    limit: i64,
    category_id: Option<i64>,
    params: &CloudParams,
) -> Result<Vec<WeightedTag>> {
    if params.max_weight < 1 {
        return Err(DiscoveryError::invalid("max_weight must be >= 1"));
    }
    let limit = check_limit("limit", limit)?;
    if limit == 0 {
        return Ok(Vec::new());
    }

    let scope = match category_id {
        Some(id) => TagCountScope::in_categories(vec![id]),
        None => TagCountScope::all(),
    };
    let counts = store.count_items_by_tag(&scope).await?;
    let top = attach_tags(store, rank_counts(counts, limit)).await?;

    let min = top.iter().map(|t| t.count).min().unwrap_or(0);
    let max = top.iter().map(|t| t.count).max().unwrap_or(0);

    Ok(top
        .into_iter()
        .map(|tf| WeightedTag {
            weight: scale_weight(tf.count, min, max, params.max_weight),
            count: tf.count,
            tag: tf.tag,
        })
        .collect())
}

/// Most used tags across the union of `category_ids`' items.
pub async fn tags_by_categories<S: TaxonomyStore + ?Sized>(
    store: &S,
    category_ids: &[i64],
    limit: i64,
) -> Result<Vec<TagFrequency>> {
    let limit = check_limit("limit", limit)?;
    if limit == 0 || category_ids.is_empty() {
        return Ok(Vec::new());
    }

    let counts = store
        .count_items_by_tag(&TagCountScope::in_categories(category_ids.to_vec()))
        .await?;
    attach_tags(store, rank_counts(counts, limit)).await
}

/// Linear map of `count` from `[min, max]` onto `[1, max_weight]`.
///
/// A degenerate range (one tag, or all counts equal) maps to `max_weight`.
///
/// The map is strictly linear, so counts 1, 5 and 10 weigh 1, 5 and 10. A
/// curve that lifts the middle (giving 5 a weight near 6) is not applied.
pub fn scale_weight(count: i64, min: i64, max: i64, max_weight: u32) -> u32 {
    if max <= min || max_weight <= 1 {
        return max_weight;
    }
    let span = (max_weight - 1) as f64;
    let ratio = (count - min) as f64 / (max - min) as f64;
    let weight = 1.0 + (ratio * span).round();
    (weight as u32).clamp(1, max_weight)
}

/// Drop zero counts, sort by count (desc) then tag id (asc), keep `limit`.
pub fn rank_counts(counts: HashMap<i64, i64>, limit: usize) -> Vec<(i64, i64)> {
    let mut ranked: Vec<(i64, i64)> = counts.into_iter().filter(|(_, c)| *c > 0).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

/// Pair ranked `(tag_id, count)` rows with their tag records, keeping order.
async fn attach_tags<S: TaxonomyStore + ?Sized>(
    store: &S,
    ranked: Vec<(i64, i64)>,
) -> Result<Vec<TagFrequency>> {
    if ranked.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = ranked.iter().map(|(id, _)| *id).collect();
    let tags: HashMap<i64, Tag> = store
        .find_tags_by_ids(&ids)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let mut out = Vec::with_capacity(ranked.len());
    for (id, count) in ranked {
        match tags.get(&id) {
            Some(tag) => out.push(TagFrequency {
                tag: tag.clone(),
                count,
            }),
            None => warn!(tag_id = id, "store counted a tag it cannot resolve"),
        }
    }
    Ok(out)
}
