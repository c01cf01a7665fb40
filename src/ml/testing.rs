// Deterministic ClassificationEngine doubles for unit tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Result;

use crate::domain::error::IntentError;
use crate::domain::example::{CategoryVocabulary, LabeledExample};
use crate::domain::traits::ClassificationEngine;

// ─── FixedEngine ──────────────────────────────────────────────────────────────
/// Returns the same scores for every text.
pub struct FixedEngine {
    categories: Option<CategoryVocabulary>,
    scores:     BTreeMap<String, f64>,
}

impl FixedEngine {
    pub fn new(scores: &[(&str, f64)]) -> Self {
        let scores: BTreeMap<String, f64> =
            scores.iter().map(|(c, s)| (c.to_string(), *s)).collect();
        Self {
            categories: Some(CategoryVocabulary::from_names(scores.keys().cloned())),
            scores,
        }
    }

    pub fn unready() -> Self {
        Self { categories: None, scores: BTreeMap::new() }
    }
}

impl ClassificationEngine for FixedEngine {
    fn initialize(&mut self, categories: &CategoryVocabulary, _: &[LabeledExample]) -> Result<()> {
        self.categories = Some(categories.clone());
        Ok(())
    }

    fn update(&mut self, _: &[LabeledExample]) -> Result<f64> {
        Ok(0.0)
    }

    fn predict(&self, _: &str) -> Result<BTreeMap<String, f64>> {
        if self.categories.is_none() {
            return Err(IntentError::ModelNotReady("fixed engine".into()).into());
        }
        Ok(self.scores.clone())
    }

    fn save(&self, _: &Path) -> Result<()> {
        Ok(())
    }

    fn load(&mut self, _: &Path) -> Result<()> {
        Ok(())
    }

    fn categories(&self) -> Option<&CategoryVocabulary> {
        self.categories.as_ref()
    }
}

// ─── ScriptedEngine ───────────────────────────────────────────────────────────
/// Replays a scripted validation-loss curve.
///
/// `marker` counts update() calls. With one training example
/// there is exactly one update per epoch, so the marker equals
/// the epoch number and predict() emits scores whose BCE
/// against all-zero labels is `losses[marker - 1]`.
///
/// save()/load() persist the marker, so a restored engine
/// reveals which epoch its checkpoint came from.
pub struct ScriptedEngine {
    losses:     Vec<f64>,
    categories: Option<CategoryVocabulary>,
    marker:     usize,
    fail_saves: bool,
    nan_update: Option<usize>,
}

impl ScriptedEngine {
    pub fn new(losses: Vec<f64>) -> Self {
        Self { losses, categories: None, marker: 0, fail_saves: false, nan_update: None }
    }

    pub fn ready(categories: &[&str]) -> Self {
        let mut engine = Self::new(vec![0.5]);
        engine.categories = Some(CategoryVocabulary::from_names(categories.iter().copied()));
        engine
    }

    pub fn marker(&self) -> usize {
        self.marker
    }

    pub fn set_marker(&mut self, marker: usize) {
        self.marker = marker;
    }

    pub fn fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    /// Make the `n`-th update() call return NaN.
    pub fn nan_on_update(mut self, n: usize) -> Self {
        self.nan_update = Some(n);
        self
    }

    fn scripted_loss(&self) -> f64 {
        let idx = self.marker.saturating_sub(1).min(self.losses.len().saturating_sub(1));
        self.losses.get(idx).copied().unwrap_or(0.5)
    }
}

impl ClassificationEngine for ScriptedEngine {
    fn initialize(&mut self, categories: &CategoryVocabulary, _: &[LabeledExample]) -> Result<()> {
        self.categories = Some(categories.clone());
        self.marker     = 0;
        Ok(())
    }

    fn update(&mut self, _: &[LabeledExample]) -> Result<f64> {
        self.marker += 1;
        if self.nan_update == Some(self.marker) {
            return Ok(f64::NAN);
        }
        Ok(1.0 / self.marker as f64)
    }

    fn predict(&self, _: &str) -> Result<BTreeMap<String, f64>> {
        let categories = self
            .categories
            .as_ref()
            .ok_or_else(|| IntentError::ModelNotReady("scripted engine".into()))?;

        // -ln(1 - p) = loss  ⇒  p = 1 - e^(-loss)
        let p = 1.0 - (-self.scripted_loss()).exp();
        Ok(categories.iter().map(|c| (c.to_string(), p)).collect())
    }

    fn save(&self, dir: &Path) -> Result<()> {
        if self.fail_saves {
            anyhow::bail!("disk full");
        }
        fs::write(dir.join("marker"), self.marker.to_string())?;
        fs::write(dir.join("categories.json"), serde_json::to_string(&self.categories)?)?;
        Ok(())
    }

    fn load(&mut self, dir: &Path) -> Result<()> {
        self.marker     = fs::read_to_string(dir.join("marker"))?.trim().parse()?;
        self.categories = serde_json::from_str(&fs::read_to_string(dir.join("categories.json"))?)?;
        Ok(())
    }

    fn categories(&self) -> Option<&CategoryVocabulary> {
        self.categories.as_ref()
    }
}
