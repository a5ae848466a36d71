//! # Addon Discovery CLI (`discover`)
//!
//! ## Usage
//!
//! ```bash
//! discover --config ./config/discover.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `discover init` | Create the SQLite database and run schema migrations |
//! | `discover import <file>` | Load a JSON catalog snapshot |
//! | `discover search "<query>"` | Keyword search with structural filters |
//! | `discover similar <id>` | Addons similar to one addon |
//! | `discover tags <report>` | Tag counts, related, trending, cloud, per-category |
//! | `discover network <author>` | Author collaboration network |
//! | `discover activity` | Review volume over time |
//! | `discover stats` | Catalog summary |
//!
//! Logs go to stderr and are controlled by `RUST_LOG`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use addon_discovery::search::SearchOptions;
use addon_discovery::tags::TagReport;
use addon_discovery::{
    activity, config, db, import, migrate, network, search, similar, stats, tags,
};

/// Addon Discovery CLI: search, recommendations, and tag analytics for an
/// addon catalog.
#[derive(Parser)]
#[command(name = "discover", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/discover.toml")]
    config: PathBuf,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Import a JSON catalog (categories, authors, tags, items, reviews).
    ///
    /// Records are upserted by id in one transaction.
    Import {
        file: PathBuf,
    },

    /// Search addons by keyword.
    ///
    /// An empty query lists matching addons by name without scoring.
    Search {
        #[arg(default_value = "")]
        query: String,

        /// Field to match keywords against (`name`, `description`). Repeatable.
        #[arg(long = "field")]
        fields: Vec<String>,

        /// Restrict to a category id. Repeatable.
        #[arg(long = "category")]
        categories: Vec<i64>,

        /// Include descendants of the given categories.
        #[arg(long)]
        subcategories: bool,

        /// Restrict to an author id. Repeatable.
        #[arg(long = "author")]
        authors: Vec<i64>,

        /// Require any of these tag ids. Repeatable.
        #[arg(long = "tag")]
        tags: Vec<i64>,

        #[arg(long)]
        min_rating: Option<f64>,

        #[arg(long)]
        max_rating: Option<f64>,

        #[arg(long)]
        min_downloads: Option<i64>,

        #[arg(long)]
        max_downloads: Option<i64>,

        /// Only addons compatible with this host version.
        #[arg(long)]
        version: Option<String>,

        /// Only addons created on or after this date (YYYY-MM-DD).
        #[arg(long)]
        since: Option<String>,

        /// Only addons created on or before this date (YYYY-MM-DD).
        #[arg(long)]
        until: Option<String>,

        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        page: i64,

        #[arg(long, allow_negative_numbers = true)]
        page_size: Option<i64>,
    },

    /// Addons similar to the given addon.
    Similar {
        item_id: i64,

        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },

    /// Tag analytics.
    Tags {
        #[command(subcommand)]
        report: TagsCommand,

        /// Maximum number of tags to report.
        #[arg(long, global = true, allow_negative_numbers = true)]
        limit: Option<i64>,
    },

    /// Collaboration network of authors sharing tags.
    Network {
        author_id: i64,

        /// Maximum hops from the origin author.
        #[arg(long, allow_negative_numbers = true)]
        depth: Option<i64>,

        /// Minimum shared tags for a link.
        #[arg(long)]
        min_strength: Option<i64>,
    },

    /// Review counts and average rating per day, week, or month.
    Activity {
        /// Only reviews of this addon.
        #[arg(long = "item")]
        item_id: Option<i64>,

        #[arg(long, default_value = "day")]
        bucket: String,

        /// Only reviews on or after this date (YYYY-MM-DD).
        #[arg(long)]
        since: Option<String>,
    },

    /// Show catalog statistics.
    Stats,
}

#[derive(Subcommand)]
enum TagsCommand {
    /// Every used tag with its addon count.
    Counts,
    /// Tags that co-occur with a tag.
    Related { tag_id: i64 },
    /// Most used tags among recently created addons.
    Trending {
        /// Window in days (defaults to `tags.trending_window_days`).
        #[arg(long)]
        days: Option<i64>,
    },
    /// Weighted tag cloud.
    Cloud {
        #[arg(long)]
        category: Option<i64>,
    },
    /// Most used tags within categories.
    Categories {
        #[arg(required = true)]
        category_ids: Vec<i64>,
    },
}

impl From<TagsCommand> for TagReport {
    fn from(cmd: TagsCommand) -> Self {
        match cmd {
            TagsCommand::Counts => TagReport::Counts,
            TagsCommand::Related { tag_id } => TagReport::Related { tag_id },
            TagsCommand::Trending { days } => TagReport::Trending { days },
            TagsCommand::Cloud { category } => TagReport::Cloud { category },
            TagsCommand::Categories { category_ids } => TagReport::Categories { category_ids },
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "addon_discovery=info,addon_discovery_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let json = cli.json;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { file } => {
            let pool = db::connect(&cfg).await?;
            let result = import::run_import(&pool, &file).await;
            pool.close().await;
            let summary = result?;
            if json {
                addon_discovery::output::print_json(&summary)?;
            } else {
                println!(
                    "Imported {} addons, {} authors, {} categories, {} tags, {} reviews.",
                    summary.addons,
                    summary.authors,
                    summary.categories,
                    summary.tags,
                    summary.reviews
                );
            }
        }
        Commands::Search {
            query,
            fields,
            categories,
            subcategories,
            authors,
            tags,
            min_rating,
            max_rating,
            min_downloads,
            max_downloads,
            version,
            since,
            until,
            page,
            page_size,
        } => {
            let opts = SearchOptions {
                query,
                fields,
                categories,
                subcategories,
                authors,
                tags,
                min_rating,
                max_rating,
                min_downloads,
                max_downloads,
                version,
                since,
                until,
                page,
                page_size,
                json,
            };
            search::run_search(&cfg, &opts).await?;
        }
        Commands::Similar { item_id, limit } => {
            similar::run_similar(&cfg, item_id, limit, json).await?;
        }
        Commands::Tags { report, limit } => {
            tags::run_tags(&cfg, &report.into(), limit, json).await?;
        }
        Commands::Network {
            author_id,
            depth,
            min_strength,
        } => {
            network::run_network(&cfg, author_id, depth, min_strength, json).await?;
        }
        Commands::Activity {
            item_id,
            bucket,
            since,
        } => {
            activity::run_activity(&cfg, item_id, &bucket, since.as_deref(), json).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg, json).await?;
        }
    }

    Ok(())
}
