// ============================================================
// Layer 5 - Validation Evaluator
// ============================================================
// Scores the engine on the held-out split with a multi-label
// binary cross-entropy:
//
//   for each example:
//     p_c  = clip(engine score for category c, 1e-15, 1 - 1e-15)
//     l_c  = -( y_c * ln(p_c) + (1 - y_c) * ln(1 - p_c) )
//     loss = mean over categories
//   val_loss = mean over examples
//
// Clipping keeps ln() finite when the engine is fully
// confident. The engine is only queried through predict(), so
// evaluation never touches the trainable state.
//
// The evaluator cannot be built over zero examples: that is
// EmptySplit, and the training loop treats it as "evaluation
// unavailable" instead of dividing by zero.

use anyhow::Result;

use crate::domain::error::IntentError;
use crate::domain::example::LabeledExample;
use crate::domain::traits::ClassificationEngine;

pub const CLIP_EPSILON: f64 = 1e-15;

/// Binary cross-entropy for one category, with clipping.
pub fn binary_cross_entropy(label: f64, score: f64) -> f64 {
    let p = score.clamp(CLIP_EPSILON, 1.0 - CLIP_EPSILON);
    -(label * p.ln() + (1.0 - label) * (1.0 - p).ln())
}

pub struct ValidationEvaluator<'a> {
    examples: &'a [LabeledExample],
}

impl<'a> ValidationEvaluator<'a> {
    pub fn new(examples: &'a [LabeledExample]) -> Result<Self, IntentError> {
        if examples.is_empty() {
            return Err(IntentError::EmptySplit);
        }
        Ok(Self { examples })
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Mean multi-label BCE of `engine` over the validation examples.
    /// May be NaN if the engine emits NaN scores; the caller decides.
    pub fn evaluate<E: ClassificationEngine + ?Sized>(&self, engine: &E) -> Result<f64> {
        let mut total  = 0.0;
        let mut scored = 0usize;

        for ex in self.examples {
            let scores = engine.predict(&ex.text)?;
            if scores.is_empty() {
                tracing::warn!("No predictions for text: {}", ex.text);
                continue;
            }

            let mut example_loss = 0.0;
            for (category, &label) in &ex.labels {
                let score = scores
                    .get(category)
                    .copied()
                    .ok_or_else(|| IntentError::MissingScore(category.clone()))?;
                example_loss += binary_cross_entropy(label, score);
            }
            total  += example_loss / ex.labels.len().max(1) as f64;
            scored += 1;
        }

        if scored == 0 {
            return Err(IntentError::EmptySplit.into());
        }
        Ok(total / scored as f64)
    }
}
