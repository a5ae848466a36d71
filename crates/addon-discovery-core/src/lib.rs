//! # Addon Discovery Core
//!
//! Storage-agnostic discovery logic for an addon catalog: data models,
//! the taxonomy store abstraction, relevance search, similar-item
//! recommendation, tag analytics, author collaboration networks, and
//! review activity bucketing.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. Every operation reads through the
//! [`store::TaxonomyStore`] trait and returns plain value objects.
//!
//! | Module | Operation |
//! |--------|-----------|
//! | [`search`] | [`search::search`]: scored keyword search with structural filters |
//! | [`similar`] | [`similar::find_similar`]: items sharing taxonomy, by popularity |
//! | [`tags`] | related, trending, cloud, and per-category tag frequencies |
//! | [`network`] | [`network::build_network`]: bounded BFS over shared tags |
//! | [`activity`] | [`activity::review_activity`]: time-bucketed review counts |

pub mod activity;
pub mod error;
pub mod models;
pub mod network;
pub mod normalize;
pub mod search;
pub mod similar;
pub mod store;
pub mod tags;

pub use error::{DiscoveryError, Result};
