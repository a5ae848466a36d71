//! TOML configuration.
//!
//! Only `[db]` is required. Every other section falls back to defaults
//! that reproduce the engine's stock behavior.
//!
//! ```toml
//! [db]
//! path = "./data/catalog.sqlite"
//!
//! [search]
//! default_fields = ["name", "description"]
//! page_size = 20
//!
//! [network]
//! max_depth = 2
//! min_strength = 2
//! timeout_ms = 5000
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use addon_discovery_core::network::NetworkParams;
use addon_discovery_core::search::{SearchField, SearchParams};
use addon_discovery_core::tags::CloudParams;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub similar: SimilarConfig,
    #[serde(default)]
    pub tags: TagsConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_field_points")]
    pub field_match_points: f64,
    #[serde(default = "default_prefix_points")]
    pub prefix_bonus_points: f64,
    #[serde(default = "default_fields")]
    pub default_fields: Vec<String>,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default)]
    pub stop_words: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            field_match_points: default_field_points(),
            prefix_bonus_points: default_prefix_points(),
            default_fields: default_fields(),
            page_size: default_page_size(),
            stop_words: Vec::new(),
        }
    }
}

fn default_field_points() -> f64 {
    1.0
}
fn default_prefix_points() -> f64 {
    2.0
}
fn default_fields() -> Vec<String> {
    vec!["name".to_string(), "description".to_string()]
}
fn default_page_size() -> i64 {
    20
}

impl SearchConfig {
    pub fn params(&self) -> SearchParams {
        SearchParams {
            field_match_points: self.field_match_points,
            prefix_bonus_points: self.prefix_bonus_points,
            ..SearchParams::default()
        }
        .with_stop_words(&self.stop_words)
    }

    /// Parsed `default_fields`. Names are checked by [`load_config`].
    pub fn fields(&self) -> Vec<SearchField> {
        self.default_fields
            .iter()
            .filter_map(|f| SearchField::parse(f))
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimilarConfig {
    #[serde(default = "default_similar_limit")]
    pub limit: i64,
}

impl Default for SimilarConfig {
    fn default() -> Self {
        Self {
            limit: default_similar_limit(),
        }
    }
}

fn default_similar_limit() -> i64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct TagsConfig {
    #[serde(default = "default_tags_limit")]
    pub limit: i64,
    #[serde(default = "default_trending_window")]
    pub trending_window_days: i64,
    #[serde(default = "default_cloud_max_weight")]
    pub cloud_max_weight: u32,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            limit: default_tags_limit(),
            trending_window_days: default_trending_window(),
            cloud_max_weight: default_cloud_max_weight(),
        }
    }
}

fn default_tags_limit() -> i64 {
    20
}
fn default_trending_window() -> i64 {
    7
}
fn default_cloud_max_weight() -> u32 {
    10
}

impl TagsConfig {
    pub fn cloud_params(&self) -> CloudParams {
        CloudParams {
            max_weight: self.cloud_max_weight,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: i64,
    #[serde(default = "default_min_strength")]
    pub min_strength: i64,
    /// Wall-clock budget for one traversal. `0` disables the deadline.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            min_strength: default_min_strength(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_max_depth() -> i64 {
    2
}
fn default_min_strength() -> i64 {
    2
}
fn default_timeout_ms() -> u64 {
    5000
}

impl NetworkConfig {
    /// Traversal parameters with the deadline measured from now.
    pub fn params(&self) -> NetworkParams {
        let deadline = (self.timeout_ms > 0)
            .then(|| std::time::Instant::now() + Duration::from_millis(self.timeout_ms));
        NetworkParams {
            min_strength: self.min_strength,
            deadline,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Validate search
    let s = &config.search;
    for (name, v) in [
        ("search.field_match_points", s.field_match_points),
        ("search.prefix_bonus_points", s.prefix_bonus_points),
    ] {
        if !v.is_finite() || v < 0.0 {
            anyhow::bail!("{} must be a finite number >= 0", name);
        }
    }
    if s.page_size < 1 {
        anyhow::bail!("search.page_size must be >= 1");
    }
    if s.default_fields.is_empty() {
        anyhow::bail!("search.default_fields must name at least one field");
    }
    for f in &s.default_fields {
        if SearchField::parse(f).is_none() {
            anyhow::bail!(
                "Unknown search field: '{}'. Must be name or description.",
                f
            );
        }
    }

    if config.similar.limit < 0 {
        anyhow::bail!("similar.limit must be >= 0");
    }

    // Validate tags
    if config.tags.limit < 0 {
        anyhow::bail!("tags.limit must be >= 0");
    }
    if config.tags.trending_window_days < 0 {
        anyhow::bail!("tags.trending_window_days must be >= 0");
    }
    if config.tags.cloud_max_weight < 1 {
        anyhow::bail!("tags.cloud_max_weight must be >= 1");
    }

    // Validate network
    if config.network.max_depth < 0 {
        anyhow::bail!("network.max_depth must be >= 0");
    }
    if config.network.min_strength < 1 {
        anyhow::bail!("network.min_strength must be >= 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse("[db]\npath = \"catalog.sqlite\"\n").unwrap();
        assert_eq!(config.search.page_size, 20);
        assert_eq!(
            config.search.fields(),
            vec![SearchField::Name, SearchField::Description]
        );
        assert_eq!(config.similar.limit, 5);
        assert_eq!(config.tags.trending_window_days, 7);
        assert_eq!(config.tags.cloud_params().max_weight, 10);
        assert_eq!(config.network.min_strength, 2);
        assert!(config.network.params().deadline.is_some());
    }

    #[test]
    fn test_stop_words_are_normalized() {
        let config = parse(
            r#"
            [db]
            path = "catalog.sqlite"

            [search]
            stop_words = ["The", "AND"]
            "#,
        )
        .unwrap();
        let params = config.search.params();
        assert!(params.stop_words.contains("the"));
        assert!(params.stop_words.contains("and"));
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config = parse("[db]\npath = \"x\"\n[network]\ntimeout_ms = 0\n").unwrap();
        assert!(config.network.params().deadline.is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        for bad in [
            "[search]\npage_size = 0",
            "[search]\nfield_match_points = -1.0",
            "[search]\ndefault_fields = [\"title\"]",
            "[search]\ndefault_fields = []",
            "[tags]\ncloud_max_weight = 0",
            "[tags]\ntrending_window_days = -3",
            "[network]\nmin_strength = 0",
            "[network]\nmax_depth = -1",
        ] {
            let src = format!("[db]\npath = \"x\"\n{}\n", bad);
            assert!(parse(&src).is_err(), "accepted: {}", bad);
        }
    }

    #[test]
    fn test_missing_db_section() {
        assert!(parse("[search]\npage_size = 5\n").is_err());
    }
}
