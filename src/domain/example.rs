// ============================================================
// Layer 3 - Labelled Example Domain Types
// ============================================================
// A query text paired with one score per intent category.
//
// Multi-label means every category is scored independently:
//   "Are there extra fees for the hostel?"
//     fee_structure     = 1.0
//     hostel_facilities = 1.0   (both can be true at once)
//     scholarships      = 0.0
//
// After normalisation every example carries exactly the same
// key set: the CategoryVocabulary of the whole dataset.
//
// Reference: Rust Book §8 (Collections)

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

// ─── RawExample ───────────────────────────────────────────────────────────────
/// One example exactly as it appears in the dataset file.
/// `labels` may omit categories and values are not yet coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct RawExample {
    pub text:   String,
    pub labels: BTreeMap<String, serde_json::Value>,
}

// ─── LabeledExample ───────────────────────────────────────────────────────────
/// A normalised example with a dense label vector.
/// Every value is a float in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub text:   String,
    pub labels: BTreeMap<String, f64>,
}

impl LabeledExample {
    pub fn new(text: impl Into<String>, labels: BTreeMap<String, f64>) -> Self {
        Self { text: text.into(), labels }
    }

    /// Label value for `category`, 0.0 when absent.
    pub fn label(&self, category: &str) -> f64 {
        self.labels.get(category).copied().unwrap_or(0.0)
    }

    /// Labels laid out in vocabulary order, the shape the engine trains on.
    pub fn dense_labels(&self, vocabulary: &CategoryVocabulary) -> Vec<f32> {
        vocabulary
            .iter()
            .map(|c| self.label(c) as f32)
            .collect()
    }
}

// ─── CategoryVocabulary ───────────────────────────────────────────────────────
/// Sorted, de-duplicated set of intent category names.
/// Built once by the normaliser and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryVocabulary {
    categories: Vec<String>,
}

impl CategoryVocabulary {
    /// Collect categories from any iterator of names.
    /// Duplicates collapse and the result is sorted for determinism.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        Self { categories: set.into_iter().collect() }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(category))
            .is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.categories
    }
}
