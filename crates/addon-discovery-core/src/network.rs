//! Author collaboration network.
//!
//! Two authors are linked when their items share tags. Starting from an
//! origin author the graph is expanded breadth-first, one level at a time,
//! up to `max_depth` hops.
//!
//! # Traversal
//!
//! 1. `visited = {origin}`, `nodes = [origin @ 0]`, `frontier = [origin]`.
//! 2. For each frontier author (level `L < max_depth`), collect the tags of
//!    all its items and ask the store which other authors share them.
//!    Lookups for one frontier run concurrently; no lock is held across
//!    them.
//! 3. Keep neighbors whose distinct shared-tag count reaches
//!    `min_strength`, strongest first (ties by id).
//! 4. Every kept neighbor adds an edge. Unvisited neighbors become nodes at
//!    `L + 1` and form the next frontier.
//! 5. Results are merged in frontier order, so output does not depend on
//!    which lookup finished first.
//!
//! Each author is expanded at most once and depth is bounded, so the walk
//! terminates on any finite catalog.

use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use futures::future::try_join_all;
use serde::Serialize;
use tracing::debug;

use crate::error::{DiscoveryError, Result};
use crate::store::{SharedTagAuthor, TaxonomyStore};

/// Traversal parameters.
#[derive(Debug, Clone, Copy)]
pub struct NetworkParams {
    /// Minimum distinct shared tags for an edge. The default of 2 drops
    /// single-tag overlaps.
    pub min_strength: i64,
    /// Abort with `DeadlineExceeded` once this instant has passed.
    pub deadline: Option<Instant>,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            min_strength: 2,
            deadline: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkNode {
    pub author_id: i64,
    pub name: String,
    /// Hops from the origin at first discovery.
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkEdge {
    pub source: i64,
    pub target: i64,
    /// Distinct tags shared by the two authors.
    pub strength: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollaborationNetwork {
    pub nodes: Vec<NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

impl CollaborationNetwork {
    pub fn node(&self, author_id: i64) -> Option<&NetworkNode> {
        self.nodes.iter().find(|n| n.author_id == author_id)
    }

    pub fn edges_from(&self, author_id: i64) -> impl Iterator<Item = &NetworkEdge> {
        self.edges.iter().filter(move |e| e.source == author_id)
    }
}

/// Build the collaboration network around `origin_author_id`.
pub async fn build_network<S: TaxonomyStore + ?Sized>(
    store: &S,
    origin_author_id: i64,
    max_depth: i64,
    params: &NetworkParams,
) -> Result<CollaborationNetwork> {
    if max_depth < 0 {
        return Err(DiscoveryError::invalid(format!(
            "max_depth must be >= 0, got {}",
            max_depth
        )));
    }
    if params.min_strength < 1 {
        return Err(DiscoveryError::invalid(format!(
            "min_strength must be >= 1, got {}",
            params.min_strength
        )));
    }

    let origin = store
        .get_author(origin_author_id)
        .await?
        .ok_or_else(|| DiscoveryError::not_found("author", origin_author_id))?;

    let mut visited: HashSet<i64> = HashSet::from([origin.id]);
    let mut nodes = vec![NetworkNode {
        author_id: origin.id,
        name: origin.name,
        level: 0,
    }];
    let mut edges = Vec::new();
    let mut frontier = vec![origin.id];
    let mut level: u32 = 0;

    while !frontier.is_empty() && i64::from(level) < max_depth {
        check_deadline(params.deadline, visited.len())?;

        let seen = visited.len();
        let lookups = frontier
            .iter()
            .map(|&author_id| neighbors_of(store, author_id, params, seen));
        let expansions = try_join_all(lookups).await?;

        let mut next = Vec::new();
        for (&source, neighbors) in frontier.iter().zip(expansions) {
            for n in neighbors {
                edges.push(NetworkEdge {
                    source,
                    target: n.author_id,
                    strength: n.shared_tag_count,
                });
                if visited.insert(n.author_id) {
                    nodes.push(NetworkNode {
                        author_id: n.author_id,
                        name: n.name,
                        level: level + 1,
                    });
                    next.push(n.author_id);
                }
            }
        }

        debug!(
            depth = level,
            frontier = frontier.len(),
            discovered = next.len(),
            "expanded network level"
        );
        frontier = next;
        level += 1;
    }

    Ok(CollaborationNetwork { nodes, edges })
}

/// Qualifying neighbors of one author, strongest first.
async fn neighbors_of<S: TaxonomyStore + ?Sized>(
    store: &S,
    author_id: i64,
    params: &NetworkParams,
    visited: usize,
) -> Result<Vec<SharedTagAuthor>> {
    check_deadline(params.deadline, visited)?;

    let tags: BTreeSet<i64> = store
        .get_author_items(author_id)
        .await?
        .iter()
        .flat_map(|i| i.tag_ids.iter().copied())
        .collect();
    if tags.is_empty() {
        return Ok(Vec::new());
    }

    let tag_ids: Vec<i64> = tags.into_iter().collect();
    let mut neighbors: Vec<SharedTagAuthor> = store
        .find_authors_sharing_tags(&tag_ids, author_id)
        .await?
        .into_iter()
        .filter(|n| n.author_id != author_id && n.shared_tag_count >= params.min_strength)
        .collect();
    neighbors.sort_by(|a, b| {
        b.shared_tag_count
            .cmp(&a.shared_tag_count)
            .then(a.author_id.cmp(&b.author_id))
    });
    Ok(neighbors)
}

fn check_deadline(deadline: Option<Instant>, visited: usize) -> Result<()> {
    match deadline {
        Some(d) if Instant::now() >= d => Err(DiscoveryError::DeadlineExceeded { visited }),
        _ => Ok(()),
    }
}
