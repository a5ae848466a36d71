//! `discover tags ...`: tag analytics.

use anyhow::Result;

use addon_discovery_core::tags::{self, TagFrequency};

use crate::config::Config;
use crate::output::print_json;
use crate::sqlite_store::SqliteStore;

/// Which tag report to produce.
#[derive(Debug, Clone)]
pub enum TagReport {
    Counts,
    Related { tag_id: i64 },
    Trending { days: Option<i64> },
    Cloud { category: Option<i64> },
    Categories { category_ids: Vec<i64> },
}

pub async fn run_tags(
    config: &Config,
    report: &TagReport,
    limit: Option<i64>,
    json: bool,
) -> Result<()> {
    let store = SqliteStore::open(config).await?;
    let result = render(&store, config, report, limit.unwrap_or(config.tags.limit), json).await;
    store.close().await;
    result
}

async fn render(
    store: &SqliteStore,
    config: &Config,
    report: &TagReport,
    limit: i64,
    json: bool,
) -> Result<()> {
    let frequencies = match report {
        TagReport::Counts => tags::tags_with_counts(store).await?,
        TagReport::Related { tag_id } => tags::related_tags(store, *tag_id, limit).await?,
        TagReport::Trending { days } => {
            let window = days.unwrap_or(config.tags.trending_window_days);
            tags::trending_tags(store, window, limit).await?
        }
        TagReport::Categories { category_ids } => {
            tags::tags_by_categories(store, category_ids, limit).await?
        }
        TagReport::Cloud { category } => {
            let cloud =
                tags::tag_cloud(store, limit, *category, &config.tags.cloud_params()).await?;
            if json {
                return print_json(&cloud);
            }
            if cloud.is_empty() {
                println!("No tags.");
            }
            for w in &cloud {
                println!("{:<24} {:>6}  {}", w.tag.name, w.count, "*".repeat(w.weight as usize));
            }
            return Ok(());
        }
    };

    if json {
        return print_json(&frequencies);
    }
    print_frequencies(&frequencies);
    Ok(())
}

fn print_frequencies(frequencies: &[TagFrequency]) {
    if frequencies.is_empty() {
        println!("No tags.");
        return;
    }
    println!("{:>6}  {:<24} {:<24} {:>6}", "ID", "TAG", "SLUG", "ITEMS");
    for f in frequencies {
        println!(
            "{:>6}  {:<24} {:<24} {:>6}",
            f.tag.id, f.tag.name, f.tag.slug, f.count
        );
    }
}
