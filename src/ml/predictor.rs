// ============================================================
// Layer 5 - Predictor
// ============================================================
// Wraps a trained engine and turns raw per-category scores into
// ranked Predictions.
//
//   text → engine.predict(text) → {category: score}
//        → Prediction::ranked   → [(category, score), ...] desc
//
// The handle only ever calls predict(), which takes &self, so
// predicting can never move the engine away from its restored
// checkpoint.

use anyhow::Result;

use crate::domain::error::IntentError;
use crate::domain::example::CategoryVocabulary;
use crate::domain::prediction::Prediction;
use crate::domain::traits::ClassificationEngine;

/// A ready-to-query engine.
pub struct ModelHandle<E: ClassificationEngine> {
    engine: E,
}

impl<E: ClassificationEngine> ModelHandle<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn categories(&self) -> Option<&CategoryVocabulary> {
        self.engine.categories()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Ranked predictions, one per input text, in input order.
    pub fn predict<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Prediction>> {
        let categories = self.engine.categories().ok_or_else(|| {
            IntentError::ModelNotReady("model has not been trained or loaded".into())
        })?;

        texts
            .iter()
            .map(|text| {
                let text   = text.as_ref();
                let scores = self.engine.predict(text)?;

                if let Some(missing) = categories.iter().find(|c| !scores.contains_key(*c)) {
                    return Err(IntentError::MissingScore(missing.to_string()).into());
                }
                Ok(Prediction::ranked(text, scores))
            })
            .collect()
    }

    pub fn predict_one(&self, text: &str) -> Result<Prediction> {
        let mut out = self.predict(&[text])?;
        out.pop()
            .ok_or_else(|| anyhow::anyhow!("engine produced no prediction for '{text}'"))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::testing::FixedEngine;

    #[test]
    fn test_predictions_are_ranked_and_deterministic() {
        let handle = ModelHandle::new(FixedEngine::new(&[("fees", 0.2), ("hostel", 0.9), ("cutoff", 0.5)]));

        let first  = handle.predict(&["where do I stay"]).unwrap();
        let second = handle.predict(&["where do I stay"]).unwrap();
        assert_eq!(first, second);

        let names: Vec<&str> = first[0].categories.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names, vec!["hostel", "cutoff", "fees"]);
    }

    #[test]
    fn test_ties_are_broken_by_name() {
        let handle = ModelHandle::new(FixedEngine::new(&[("b", 0.5), ("a", 0.5), ("c", 0.5)]));
        let p      = handle.predict_one("x").unwrap();
        let names: Vec<&str> = p.categories.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_one_prediction_per_text_in_order() {
        let handle = ModelHandle::new(FixedEngine::new(&[("a", 0.1)]));
        let out    = handle.predict(&["first".to_string(), "second".to_string()]).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "first");
        assert_eq!(out[1].text, "second");
    }

    #[test]
    fn test_engine_omitting_a_category_is_reported() {
        let mut engine = FixedEngine::new(&[("fees", 0.4)]);
        engine
            .initialize(&CategoryVocabulary::from_names(["fees", "hostel"]), &[])
            .unwrap();

        let err = ModelHandle::new(engine).predict(&["x"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IntentError>(),
            Some(IntentError::MissingScore(c)) if c == "hostel"
        ));
    }

    #[test]
    fn test_untrained_engine_is_not_ready() {
        let handle = ModelHandle::new(FixedEngine::unready());
        let err    = handle.predict(&["x"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IntentError>(),
            Some(IntentError::ModelNotReady(_))
        ));
    }
}
