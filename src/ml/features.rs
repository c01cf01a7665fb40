// ============================================================
// Layer 5 - Feature Batcher
// ============================================================
// Converts a slice of LabeledExamples into the two tensors the
// model trains on.
//
// How batching works here:
//   Input:  N examples, a tokenizer with V ids, C categories
//   Output: features [N, V]  1.0 where the word occurs, else 0.0
//           targets  [N, C]  dense labels in vocabulary order
//
//   Each row is built flat, then the Vec is reshaped:
//   [r1_v1, r1_v2, ..., r1_vV, r2_v1, ..., rN_vV] → [N, V]
//
// [PAD] never sets a feature. [UNK] does, so the model can
// learn how much weight to give out-of-vocabulary words.
//
// Reference: Burn Book §4 (Batcher)

use anyhow::Result;
use burn::prelude::*;
use tokenizers::Tokenizer;

use crate::domain::example::{CategoryVocabulary, LabeledExample};
use crate::infra::tokenizer_store::PAD_ID;

/// A batch ready for the forward pass.
#[derive(Debug, Clone)]
pub struct IntentBatch<B: Backend> {
    pub features: Tensor<B, 2>,
    pub targets:  Tensor<B, 2>,
}

/// Holds the device and the vocabulary width.
#[derive(Clone, Debug)]
pub struct FeatureBatcher<B: Backend> {
    pub device:     B::Device,
    pub vocab_size: usize,
}

impl<B: Backend> FeatureBatcher<B> {
    pub fn new(device: B::Device, vocab_size: usize) -> Self {
        Self { device, vocab_size }
    }

    /// Bag-of-words presence vector for one text.
    pub fn encode(&self, tokenizer: &Tokenizer, text: &str) -> Result<Vec<f32>> {
        let enc = tokenizer
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;

        let mut row = vec![0.0f32; self.vocab_size];
        for &id in enc.get_ids() {
            let id = id as usize;
            if id != PAD_ID as usize && id < self.vocab_size {
                row[id] = 1.0;
            }
        }
        Ok(row)
    }

    /// Features only, for inference.
    pub fn features(&self, tokenizer: &Tokenizer, texts: &[&str]) -> Result<Tensor<B, 2>> {
        let mut flat = Vec::with_capacity(texts.len() * self.vocab_size);
        for text in texts {
            flat.extend(self.encode(tokenizer, text)?);
        }
        Ok(Tensor::from_data(
            TensorData::new(flat, [texts.len(), self.vocab_size]),
            &self.device,
        ))
    }

    pub fn batch(
        &self,
        tokenizer:  &Tokenizer,
        categories: &CategoryVocabulary,
        items:      &[LabeledExample],
    ) -> Result<IntentBatch<B>> {
        let texts: Vec<&str> = items.iter().map(|ex| ex.text.as_str()).collect();
        let features = self.features(tokenizer, &texts)?;

        let targets_flat: Vec<f32> = items
            .iter()
            .flat_map(|ex| ex.dense_labels(categories))
            .collect();
        let targets = Tensor::from_data(
            TensorData::new(targets_flat, [items.len(), categories.len()]),
            &self.device,
        );

        Ok(IntentBatch { features, targets })
    }
}
