//! `discover similar`: recommendations for one addon.

use anyhow::Result;
use serde::Serialize;

use addon_discovery_core::models::Item;
use addon_discovery_core::similar::{find_similar_with_tier, SimilarityTier};

use crate::config::Config;
use crate::output::{print_json, truncate};
use crate::sqlite_store::SqliteStore;

#[derive(Serialize)]
struct SimilarResponse {
    item_id: i64,
    basis: &'static str,
    items: Vec<Item>,
}

pub async fn run_similar(
    config: &Config,
    item_id: i64,
    limit: Option<i64>,
    json: bool,
) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let result =
        find_similar_with_tier(&store, item_id, limit.unwrap_or(config.similar.limit)).await;
    store.close().await;
    let (items, tier) = result?;

    let basis = match tier {
        SimilarityTier::SharedTags => "shared tags",
        SimilarityTier::SameCategory => "same category",
    };

    if json {
        return print_json(&SimilarResponse {
            item_id,
            basis,
            items,
        });
    }

    if items.is_empty() {
        println!("No similar addons.");
        return Ok(());
    }

    println!("Similar to addon {} (by {}):", item_id, basis);
    println!("{:>6}  {:<32} {:>9}", "ID", "NAME", "DOWNLOADS");
    for item in &items {
        println!(
            "{:>6}  {:<32} {:>9}",
            item.id,
            truncate(&item.name, 32),
            item.downloads
        );
    }
    Ok(())
}
