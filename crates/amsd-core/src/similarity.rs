//! Near-duplicate detection over lookup table values

use crate::diagnostics::Diagnostic;
use crate::registry::{Key, Registry};
use crate::schema::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-category distance thresholds; categories without an entry are not checked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Thresholds(BTreeMap<Category, usize>);

impl Default for Thresholds {
    fn default() -> Self {
        Self(BTreeMap::from([
            (Category::SourceCitation, 5),
            (Category::HolderFile, 5),
            (Category::LingArea, 3),
            (Category::Keywords, 3),
            (Category::SemDomain, 3),
            (Category::Material, 2),
            (Category::Technique, 2),
            (Category::ItemType, 2),
            (Category::SourceType, 2),
            (Category::DataEntry, 2),
        ]))
    }
}

impl Thresholds {
    /// No category is checked
    pub fn none() -> Self {
        Self(BTreeMap::new())
    }

    pub fn get(&self, category: Category) -> Option<usize> {
        self.0.get(&category).copied()
    }

    pub fn set(&mut self, category: Category, threshold: usize) {
        self.0.insert(category, threshold);
    }

    pub fn remove(&mut self, category: Category) {
        self.0.remove(&category);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, usize)> + '_ {
        self.0.iter().map(|(c, t)| (*c, *t))
    }
}

/// Two values of one category that are closer than its threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityHit {
    pub category: Category,
    pub first_key: Key,
    pub first: String,
    pub second_key: Key,
    pub second: String,
    pub distance: usize,
}

impl From<SimilarityHit> for Diagnostic {
    fn from(hit: SimilarityHit) -> Self {
        Diagnostic::Similarity {
            category: hit.category,
            first: hit.first,
            second: hit.second,
            distance: hit.distance,
        }
    }
}

/// Levenshtein distance with unit costs, counted in chars
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Every pair of values whose distance is strictly below `threshold`
pub fn similar_pairs(
    category: Category,
    values: &[(Key, String)],
    threshold: usize,
) -> Vec<SimilarityHit> {
    let mut hits = Vec::new();
    for (i, (first_key, first)) in values.iter().enumerate() {
        let first_len = first.chars().count();
        for (second_key, second) in &values[i + 1..] {
            // length difference is a lower bound of the distance
            if first_len.abs_diff(second.chars().count()) >= threshold {
                continue;
            }
            let distance = levenshtein(first, second);
            if distance < threshold {
                hits.push(SimilarityHit {
                    category,
                    first_key: *first_key,
                    first: first.clone(),
                    second_key: *second_key,
                    second: second.clone(),
                    distance,
                });
            }
        }
    }
    hits
}

/// Check every configured category of the registry
pub fn check_similarity(registry: &Registry, thresholds: &Thresholds) -> Vec<SimilarityHit> {
    let mut hits = Vec::new();
    for category in Category::ALL {
        let Some(threshold) = thresholds.get(category) else {
            continue;
        };
        let values = registry.display_values(category);
        let found = similar_pairs(category, &values, threshold);
        tracing::debug!(
            "{}: {} values, {} similar pair(s)",
            category,
            values.len(),
            found.len()
        );
        hits.extend(found);
    }
    hits
}
