//! Text normalization for keyword matching.
//!
//! Search never calls locale-sensitive string functions directly: both the
//! query and every searched field go through the same [`Normalizer`], so
//! matching behavior is fixed by whichever strategy the caller injects.

use std::collections::HashSet;
use std::fmt::Debug;

/// Strategy that maps raw text to its comparable form.
pub trait Normalizer: Send + Sync + Debug {
    fn normalize(&self, text: &str) -> String;
}

/// Unicode lowercase folding. Independent of the process locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseFoldNormalizer;

impl Normalizer for CaseFoldNormalizer {
    fn normalize(&self, text: &str) -> String {
        text.to_lowercase()
    }
}

/// Split a query into distinct normalized keywords.
///
/// Keywords are whitespace-delimited. Stop words (compared after
/// normalization) are dropped, and repeated keywords are kept once in
/// first-occurrence order.
pub fn keywords(
    normalizer: &dyn Normalizer,
    query: &str,
    stop_words: &HashSet<String>,
) -> Vec<String> {
    let normalized = normalizer.normalize(query);
    let mut seen = HashSet::new();
    normalized
        .split_whitespace()
        .filter(|w| !stop_words.contains(*w))
        .filter(|w| seen.insert(w.to_string()))
        .map(str::to_string)
        .collect()
}
