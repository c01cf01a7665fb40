// ============================================================
// Layer 4 - Dataset Normaliser
// ============================================================
// Turns raw examples with inconsistent label sets into dense,
// uniformly keyed LabeledExamples.
//
// Why is this needed?
//   The authoring script only lists the categories it cared
//   about for each question. One example may mention
//   "curriculum", another "cutoff" instead. The engine needs
//   every example scored against EVERY category, so:
//
//   1. Vocabulary = sorted union of all category keys
//   2. Each example gets every vocabulary key
//   3. Missing keys default to 0.0
//   4. Present values are coerced to float (true → 1.0)
//
// Any value that is not coercible, or lands outside [0, 1],
// aborts with a DataFormat error before training starts.
//
// Reference: Rust Book §8 (Hash Maps), §13 (Iterators)

use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::Value;

use crate::domain::error::IntentError;
use crate::domain::example::{CategoryVocabulary, LabeledExample, RawExample};

/// Output of normalisation: the shared vocabulary plus dense examples.
#[derive(Debug, Clone)]
pub struct NormalizedDataset {
    pub vocabulary: CategoryVocabulary,
    pub examples:   Vec<LabeledExample>,
}

pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Compute the vocabulary and densify every example.
    pub fn normalize(&self, raw: Vec<RawExample>) -> Result<NormalizedDataset> {
        if raw.is_empty() {
            return Err(IntentError::DataFormat("dataset contains no examples".into()).into());
        }

        // ── Step 1: Vocabulary from the union of all observed keys ───────────
        let vocabulary = CategoryVocabulary::from_names(
            raw.iter().flat_map(|ex| ex.labels.keys().cloned()),
        );

        // ── Step 2: Dense label vector per example ───────────────────────────
        let mut examples = Vec::with_capacity(raw.len());
        for (index, ex) in raw.into_iter().enumerate() {
            let mut labels = BTreeMap::new();
            for category in vocabulary.iter() {
                let value = match ex.labels.get(category) {
                    Some(v) => coerce_label(v).ok_or_else(|| {
                        IntentError::DataFormat(format!(
                            "example {index}: label '{category}' = {v} is not a float in [0, 1]"
                        ))
                    })?,
                    None => 0.0,
                };
                labels.insert(category.to_string(), value);
            }
            examples.push(LabeledExample::new(ex.text, labels));
        }

        tracing::info!(
            "Normalised {} examples over {} categories: {:?}",
            examples.len(),
            vocabulary.len(),
            vocabulary.as_slice()
        );

        Ok(NormalizedDataset { vocabulary, examples })
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Coerce a raw JSON label to a float in [0, 1].
/// Booleans, numbers, and numeric strings are accepted.
pub fn coerce_label(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Bool(b)   => if *b { 1.0 } else { 0.0 },
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _                => return None,
    };
    (0.0..=1.0).contains(&v).then_some(v)
}
