//! # Addon Discovery
//!
//! Content discovery for an addon catalog, backed by SQLite.
//!
//! The discovery algorithms live in [`addon_discovery_core`]; this crate
//! supplies the storage they read from and the `discover` command line.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────────────┐
//! │ catalog.json│──▶│   import     │──▶│      SQLite        │
//! └─────────────┘   └──────────────┘   │ addons/tags/authors│
//!                                      └─────────┬──────────┘
//!                                                │ SqliteStore
//!                                                ▼
//!                                      ┌────────────────────┐
//!                                      │ addon-discovery-   │
//!                                      │ core operations    │
//!                                      └─────────┬──────────┘
//!                                                ▼
//!                                          discover CLI
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! discover init                         # create database
//! discover import catalog.json          # load a catalog snapshot
//! discover search "video" --tag 3
//! discover similar 42
//! discover tags trending --days 14
//! discover network 7 --depth 2
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | `TaxonomyStore` over SQLite |
//! | [`import`] | JSON catalog import |
//! | [`search`], [`similar`], [`tags`], [`network`], [`activity`], [`stats`] | CLI commands |

pub mod activity;
pub mod config;
pub mod db;
pub mod import;
pub mod migrate;
pub mod network;
pub mod output;
pub mod search;
pub mod similar;
pub mod sqlite_store;
pub mod stats;
pub mod tags;
