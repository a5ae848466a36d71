//! `discover search`: filtered keyword search over the catalog.

use anyhow::{bail, Result};

use addon_discovery_core::models::Version;
use addon_discovery_core::search::{self, SearchField, SearchRequest};
use addon_discovery_core::store::ItemFilter;

use crate::config::Config;
use crate::output::{parse_date, parse_end_of_day, print_json, truncate};
use crate::sqlite_store::SqliteStore;

/// Everything the `search` subcommand accepts.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub query: String,
    /// Empty means `search.default_fields` from config.
    pub fields: Vec<String>,
    pub categories: Vec<i64>,
    pub subcategories: bool,
    pub authors: Vec<i64>,
    pub tags: Vec<i64>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub min_downloads: Option<i64>,
    pub max_downloads: Option<i64>,
    pub version: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub page: i64,
    pub page_size: Option<i64>,
    pub json: bool,
}

impl SearchOptions {
    fn search_fields(&self, config: &Config) -> Result<Vec<SearchField>> {
        if self.fields.is_empty() {
            return Ok(config.search.fields());
        }
        self.fields
            .iter()
            .map(|f| match SearchField::parse(f) {
                Some(field) => Ok(field),
                None => bail!("Unknown search field: {}. Use name or description.", f),
            })
            .collect()
    }

    fn filter(&self) -> Result<ItemFilter> {
        let mut filter = ItemFilter::new()
            .categories(self.categories.iter().copied())
            .authors(self.authors.iter().copied())
            .tags(self.tags.iter().copied())
            .rating_between(self.min_rating, self.max_rating)
            .downloads_between(self.min_downloads, self.max_downloads);

        if let Some(ref v) = self.version {
            filter = filter.compatible_with(v.parse::<Version>()?);
        }
        let since = self
            .since
            .as_deref()
            .map(|s| parse_date("since", s))
            .transpose()?;
        let until = self
            .until
            .as_deref()
            .map(|s| parse_end_of_day("until", s))
            .transpose()?;
        Ok(filter.created_between(since, until))
    }
}

pub async fn run_search(config: &Config, opts: &SearchOptions) -> Result<()> {
    let fields = opts.search_fields(config)?;
    let request = SearchRequest {
        query: &opts.query,
        fields: &fields,
        filter: opts.filter()?,
        include_subcategories: opts.subcategories,
        page: opts.page,
        page_size: opts.page_size.unwrap_or(config.search.page_size),
    };

    let store = SqliteStore::open(config).await?;
    let result = search::search(&store, &request, &config.search.params()).await;
    store.close().await;
    let page = result?;

    if opts.json {
        return print_json(&page);
    }

    if page.items.is_empty() {
        println!("No results.");
        return Ok(());
    }

    println!(
        "{:>6}  {:>6}  {:<32} {:>9} {:>6}",
        "ID", "SCORE", "NAME", "DOWNLOADS", "RATING"
    );
    for r in &page.items {
        let score = r
            .score
            .map(|s| format!("{:.1}", s))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6}  {:>6}  {:<32} {:>9} {:>6.1}",
            r.item.id,
            score,
            truncate(&r.item.name, 32),
            r.item.downloads,
            r.item.rating
        );
    }
    println!();
    println!(
        "page {} of {} ({} matches)",
        page.page,
        page.total_pages(),
        page.total
    );
    Ok(())
}
