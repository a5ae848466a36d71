//! `discover network`: collaboration graph around one author.

use anyhow::Result;

use addon_discovery_core::network::build_network;

use crate::config::Config;
use crate::output::print_json;
use crate::sqlite_store::SqliteStore;

pub async fn run_network(
    config: &Config,
    author_id: i64,
    depth: Option<i64>,
    min_strength: Option<i64>,
    json: bool,
) -> Result<()> {
    let mut params = config.network.params();
    if let Some(s) = min_strength {
        params.min_strength = s;
    }
    let depth = depth.unwrap_or(config.network.max_depth);

    let store = SqliteStore::open(config).await?;
    let result = build_network(&store, author_id, depth, &params).await;
    store.close().await;
    let network = result?;

    if json {
        return print_json(&network);
    }

    println!("Authors ({}):", network.nodes.len());
    for n in &network.nodes {
        println!("  {}[{}] {} (level {})", "  ".repeat(n.level as usize), n.author_id, n.name, n.level);
    }
    if !network.edges.is_empty() {
        println!();
        println!("Links ({}):", network.edges.len());
        for e in &network.edges {
            println!("  {} -> {}  shared tags: {}", e.source, e.target, e.strength);
        }
    }
    Ok(())
}
