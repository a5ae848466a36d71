//! "Similar items" recommendation.
//!
//! Two tiers, never blended: items sharing at least one tag with the source
//! item when it has tags, otherwise items from the same category. Either
//! way candidates are ranked by popularity (downloads desc, id asc).

use tracing::debug;

use crate::error::{check_limit, DiscoveryError, Result};
use crate::models::Item;
use crate::store::{ItemFilter, TaxonomyStore};

/// Which candidate pool a recommendation was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityTier {
    SharedTags,
    SameCategory,
}

/// Up to `limit` items similar to `item_id`, most downloaded first.
///
/// Fails with `NotFound` when the source item does not exist.
pub async fn find_similar<S: TaxonomyStore + ?Sized>(
    store: &S,
    item_id: i64,
    limit: i64,
) -> Result<Vec<Item>> {
    find_similar_with_tier(store, item_id, limit)
        .await
        .map(|(items, _)| items)
}

/// Same as [`find_similar`], also reporting the tier that was used.
pub async fn find_similar_with_tier<S: TaxonomyStore + ?Sized>(
    store: &S,
    item_id: i64,
    limit: i64,
) -> Result<(Vec<Item>, SimilarityTier)> {
    let limit = check_limit("limit", limit)?;

    let source = store
        .find_items_by_ids(&[item_id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| DiscoveryError::not_found("item", item_id))?;

    let tags = store.get_item_tags(item_id).await?;
    let (filter, tier) = if tags.is_empty() {
        (
            ItemFilter::new().categories([source.category_id]),
            SimilarityTier::SameCategory,
        )
    } else {
        (ItemFilter::new().tags(tags), SimilarityTier::SharedTags)
    };

    if limit == 0 {
        return Ok((Vec::new(), tier));
    }

    let mut candidates: Vec<Item> = store
        .find_items(&filter)
        .await?
        .into_iter()
        .filter(|i| i.id != item_id)
        .collect();

    candidates.sort_by(|a, b| b.downloads.cmp(&a.downloads).then(a.id.cmp(&b.id)));
    candidates.truncate(limit);

    debug!(item_id, ?tier, results = candidates.len(), "similar items");
    Ok((candidates, tier))
}
