//! Catalog entities consumed by the discovery engine.
//!
//! These are read-only views: the taxonomy store owns them, and the core
//! only ever receives copies. Derived results (scored lists, tag
//! frequencies, networks) live next to the operations that produce them.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An addon listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category_id: i64,
    pub author_id: i64,
    #[serde(default)]
    pub tag_ids: BTreeSet<i64>,
    /// Average rating in `0.0..=5.0`.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub downloads: i64,
    pub created_at: DateTime<Utc>,
    /// Oldest host version the addon supports.
    #[serde(default)]
    pub version_min: Option<Version>,
    /// Newest host version the addon supports; `None` means open-ended.
    #[serde(default)]
    pub version_max: Option<Version>,
}

impl Item {
    /// Whether this item runs on host version `v`.
    pub fn is_compatible_with(&self, v: &Version) -> bool {
        let above_min = self.version_min.as_ref().map_or(true, |min| min <= v);
        let below_max = self.version_max.as_ref().map_or(true, |max| max >= v);
        above_min && below_max
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub item_id: i64,
    /// Star rating, `1..=5`.
    pub rating: i64,
    pub created_at: DateTime<Utc>,
}

/// A full catalog snapshot, used to seed stores from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

/// Dotted numeric host version such as `1.4` or `2.0.10`.
///
/// Missing trailing components compare as zero, so `1.2 == 1.2.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    parts: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version '{0}': expected dot-separated numbers")]
pub struct ParseVersionError(String);

impl Version {
    pub fn new(parts: &[u64]) -> Self {
        Self {
            parts: parts.to_vec(),
        }
    }
}

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseVersionError(s.to_string()));
        }
        let parts = trimmed
            .split('.')
            .map(|p| p.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ParseVersionError(s.to_string()))?;
        Ok(Self { parts })
    }
}

impl TryFrom<String> for Version {
    type Error = ParseVersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.parts.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", joined.join("."))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

/// Expand `roots` to include every descendant category.
///
/// The store guarantees the category tree is acyclic; the visited set keeps
/// the walk finite even if it is not. Returned ids are sorted.
pub fn category_subtree(categories: &[Category], roots: &[i64]) -> Vec<i64> {
    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    for c in categories {
        if let Some(parent) = c.parent_id {
            children.entry(parent).or_default().push(c.id);
        }
    }

    let mut seen = BTreeSet::new();
    let mut queue: VecDeque<i64> = roots.iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(kids) = children.get(&id) {
            queue.extend(kids.iter().copied());
        }
    }

    seen.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    fn category(id: i64, parent_id: Option<i64>) -> Category {
        Category {
            id,
            name: format!("cat-{}", id),
            parent_id,
        }
    }

    #[test]
    fn test_version_ordering() {
        assert!(v("1.2") < v("1.10"));
        assert!(v("2.0") > v("1.99.99"));
        assert_eq!(v("1.2"), v("1.2.0"));
        assert_eq!(v("3").to_string(), "3");
    }

    #[test]
    fn test_version_rejects_garbage() {
        assert!("".parse::<Version>().is_err());
        assert!("1.x".parse::<Version>().is_err());
        assert!("1..2".parse::<Version>().is_err());
    }

    #[test]
    fn test_version_serde_as_string() {
        let json = serde_json::to_string(&v("1.4.2")).unwrap();
        assert_eq!(json, "\"1.4.2\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v("1.4.2"));
        assert!(serde_json::from_str::<Version>("\"beta\"").is_err());
    }

    #[test]
    fn test_compatibility_interval() {
        let mut item = Item {
            id: 1,
            name: "x".into(),
            description: String::new(),
            category_id: 1,
            author_id: 1,
            tag_ids: BTreeSet::new(),
            rating: 0.0,
            downloads: 0,
            created_at: Utc::now(),
            version_min: Some(v("1.0")),
            version_max: None,
        };
        assert!(item.is_compatible_with(&v("1.0")));
        assert!(item.is_compatible_with(&v("9.0")));
        assert!(!item.is_compatible_with(&v("0.9")));

        item.version_max = Some(v("2.0"));
        assert!(item.is_compatible_with(&v("2.0")));
        assert!(!item.is_compatible_with(&v("2.0.1")));

        item.version_min = None;
        assert!(item.is_compatible_with(&v("0.1")));
    }

    #[test]
    fn test_category_subtree() {
        let cats = vec![
            category(1, None),
            category(2, Some(1)),
            category(3, Some(2)),
            category(4, None),
            category(5, Some(4)),
        ];
        assert_eq!(category_subtree(&cats, &[1]), vec![1, 2, 3]);
        assert_eq!(category_subtree(&cats, &[2, 5]), vec![2, 3, 5]);
        assert_eq!(category_subtree(&cats, &[99]), vec![99]);
    }

    #[test]
    fn test_category_subtree_survives_cycle() {
        let cats = vec![category(1, Some(2)), category(2, Some(1))];
        assert_eq!(category_subtree(&cats, &[1]), vec![1, 2]);
    }
}
