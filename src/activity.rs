//! `discover activity`: review volume over time.

use anyhow::Result;

use addon_discovery_core::activity::{review_activity, ActivityBucket};
use addon_discovery_core::store::ReviewFilter;

use crate::config::Config;
use crate::output::{parse_date, print_json};
use crate::sqlite_store::SqliteStore;

pub async fn run_activity(
    config: &Config,
    item_id: Option<i64>,
    bucket: &str,
    since: Option<&str>,
    json: bool,
) -> Result<()> {
    let bucket: ActivityBucket = bucket.parse()?;
    let filter = ReviewFilter {
        item_id,
        since: since.map(|s| parse_date("since", s)).transpose()?,
    };

    let store = SqliteStore::open(config).await?;
    let result = review_activity(&store, &filter, bucket).await;
    store.close().await;
    let points = result?;

    if json {
        return print_json(&points);
    }
    if points.is_empty() {
        println!("No reviews.");
        return Ok(());
    }

    println!("{:<12} {:>8} {:>8}", bucket.to_string().to_uppercase(), "REVIEWS", "AVG");
    for p in &points {
        println!(
            "{:<12} {:>8} {:>8.2}",
            p.period_start.format("%Y-%m-%d").to_string(),
            p.review_count,
            p.average_rating
        );
    }
    Ok(())
}
