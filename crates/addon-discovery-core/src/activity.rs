//! Review activity over time.
//!
//! Reviews are grouped into calendar buckets keyed by the bucket's first
//! day (UTC). Weeks start on Monday.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DiscoveryError, Result};
use crate::store::{ReviewFilter, TaxonomyStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityBucket {
    #[default]
    Day,
    Week,
    Month,
}

impl ActivityBucket {
    /// First day of the bucket containing `date`.
    pub fn start_of(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
            Self::Month => date.with_day(1).unwrap_or(date),
        }
    }
}

impl fmt::Display for ActivityBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        })
    }
}

impl FromStr for ActivityBucket {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(DiscoveryError::invalid(format!(
                "unknown activity bucket: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityPoint {
    pub period_start: NaiveDate,
    pub review_count: i64,
    pub average_rating: f64,
}

/// Review counts and mean rating per bucket, oldest first.
///
/// Buckets without reviews are omitted.
pub async fn review_activity<S: TaxonomyStore + ?Sized>(
    store: &S,
    filter: &ReviewFilter,
    bucket: ActivityBucket,
) -> Result<Vec<ActivityPoint>> {
    let reviews = store.find_reviews(filter).await?;

    let mut periods: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for r in &reviews {
        let start = bucket.start_of(r.created_at.date_naive());
        let entry = periods.entry(start).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += r.rating;
    }

    debug!(
        reviews = reviews.len(),
        periods = periods.len(),
        %bucket,
        "review activity"
    );

    Ok(periods
        .into_iter()
        .map(|(period_start, (count, sum))| ActivityPoint {
            period_start,
            review_count: count,
            average_rating: sum as f64 / count as f64,
        })
        .collect())
}
