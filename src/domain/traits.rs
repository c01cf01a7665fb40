// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The pipeline is written against these traits, never against
// a concrete loader or model. Any bag-of-words linear model,
// embedding classifier, or scripted test double that implements
// ClassificationEngine can be dropped in without touching the
// training loop, the evaluator, or the predictor.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

use crate::domain::example::{CategoryVocabulary, LabeledExample, RawExample};

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Any component that can produce raw labelled examples.
///
/// Implementations:
///   - JsonDatasetLoader → reads the `[[text, {"cats": {...}}], ...]` file
pub trait DatasetSource {
    fn load_raw(&self) -> Result<Vec<RawExample>>;
}

// ─── ClassificationEngine ─────────────────────────────────────────────────────
/// A trainable multi-label text classifier.
///
/// Implementations:
///   - BurnEngine     → bag-of-words MLP on the burn NdArray backend
///   - ScriptedEngine → deterministic double used by the loop tests
pub trait ClassificationEngine {
    /// Reset the engine for `categories`. `examples` is the training
    /// corpus, available for building feature vocabularies.
    fn initialize(
        &mut self,
        categories: &CategoryVocabulary,
        examples:   &[LabeledExample],
    ) -> Result<()>;

    /// Apply one gradient step on `batch` and return its loss.
    fn update(&mut self, batch: &[LabeledExample]) -> Result<f64>;

    /// Score `text` against every category, in inference mode.
    fn predict(&self, text: &str) -> Result<BTreeMap<String, f64>>;

    /// Persist the trainable state into the directory `dir`.
    fn save(&self, dir: &Path) -> Result<()>;

    /// Replace the working state with the one stored in `dir`.
    fn load(&mut self, dir: &Path) -> Result<()>;

    /// The vocabulary the engine was initialised or loaded with.
    /// `None` means the engine is not ready to predict.
    fn categories(&self) -> Option<&CategoryVocabulary>;
}
