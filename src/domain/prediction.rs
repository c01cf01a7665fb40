// ============================================================
// Layer 3 - Prediction Domain Type
// ============================================================
// The output of the predictor for a single query: every
// category with its confidence, highest first.
//
// Scores are independent per category (multi-label), so they
// do NOT sum to 1. Ties are broken by category name so the
// ordering is fully deterministic.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub text:       String,
    pub categories: Vec<(String, f64)>,
}

impl Prediction {
    /// Build a prediction from unordered scores, ranking them
    /// descending by score and ascending by name on ties.
    pub fn ranked(text: impl Into<String>, scores: BTreeMap<String, f64>) -> Self {
        let mut categories: Vec<(String, f64)> = scores.into_iter().collect();
        categories.sort_by(rank_order);
        Self { text: text.into(), categories }
    }

    /// The highest-scoring category, if any.
    pub fn best(&self) -> Option<(&str, f64)> {
        self.categories.first().map(|(c, s)| (c.as_str(), *s))
    }

    /// The first `n` categories.
    pub fn top(&self, n: usize) -> &[(String, f64)] {
        &self.categories[..n.min(self.categories.len())]
    }

    /// Categories whose score is at least `threshold`, still ranked.
    pub fn above(&self, threshold: f64) -> Vec<(&str, f64)> {
        self.categories
            .iter()
            .filter(|(_, s)| *s >= threshold)
            .map(|(c, s)| (c.as_str(), *s))
            .collect()
    }
}

fn rank_order(a: &(String, f64), b: &(String, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}
