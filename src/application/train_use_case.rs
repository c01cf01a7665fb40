// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration
//   Step 2: Load the raw JSON dataset      (Layer 4 - data)
//   Step 3: Normalise labels               (Layer 4 - data)
//   Step 4: Train / validation split       (Layer 4 - data)
//   Step 5: Save config, open metrics      (Layer 6 - infra)
//   Step 6: Run the training loop          (Layer 5 - ml)
//
// The result is a ModelHandle over the engine restored from
// the best checkpoint, plus the per-epoch report.
//
// Reference: Rust Book §13 (Iterators and Closures)

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Result;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::data::{
    batcher::BatchSchedule,
    loader::JsonDatasetLoader,
    normalizer::Normalizer,
    splitter::split_train_val,
};
use crate::domain::error::IntentError;
use crate::domain::traits::{ClassificationEngine, DatasetSource};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    engine::{DefaultEngine, EngineConfig},
    predictor::ModelHandle,
    trainer::{TrainReport, Trainer},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it can be saved next to the checkpoint and
// reloaded to rebuild the engine for prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub dataset_path:   String,
    pub checkpoint_dir: String,
    pub epochs:         usize,
    pub patience:       usize,
    pub train_ratio:    f64,
    /// None draws the shuffle seed from the OS
    pub seed:           Option<u64>,
    pub schedule:       BatchSchedule,
    pub engine:         EngineConfig,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataset_path:   "data/train_data.json".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            epochs:         30,
            patience:       5,
            train_ratio:    0.8,
            seed:           None,
            schedule:       BatchSchedule::default(),
            engine:         EngineConfig::default(),
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<(), IntentError> {
        if self.epochs == 0 {
            return Err(IntentError::InvalidConfig("epochs must be at least 1".into()));
        }
        if self.patience == 0 {
            return Err(IntentError::InvalidConfig("patience must be at least 1".into()));
        }
        if !(self.train_ratio > 0.0 && self.train_ratio < 1.0) {
            return Err(IntentError::InvalidConfig(format!(
                "train ratio must be in (0, 1), got {}",
                self.train_ratio
            )));
        }
        self.schedule.validate()?;
        self.engine.validate()
    }
}

// ─── Outcome ──────────────────────────────────────────────────────────────────
pub struct TrainOutcome<E: ClassificationEngine> {
    pub report:              TrainReport,
    /// Engine restored from the best checkpoint
    pub handle:              ModelHandle<E>,
    pub train_examples:      usize,
    pub validation_examples: usize,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
    cancel: Option<Arc<AtomicBool>>,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config, cancel: None }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Stop between epochs once `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Train the burn engine described by the config.
    pub fn execute(&self) -> Result<TrainOutcome<DefaultEngine>> {
        let engine = DefaultEngine::cpu(self.config.engine.clone());
        self.execute_with(engine)
    }

    /// Run the pipeline against any engine.
    pub fn execute_with<E: ClassificationEngine>(&self, mut engine: E) -> Result<TrainOutcome<E>> {
        let cfg = &self.config;

        // ── Step 1: Validate ─────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Load the raw dataset ─────────────────────────────────────
        tracing::info!("Loading dataset from '{}'", cfg.dataset_path);
        let raw = JsonDatasetLoader::new(&cfg.dataset_path).load_raw()?;
        println!("Total number of examples: {}", raw.len());

        // ── Step 3: Normalise labels ─────────────────────────────────────────
        let dataset = Normalizer::new().normalize(raw)?;
        println!("Categories found: {:?}", dataset.vocabulary.as_slice());

        // ── Step 4: Train / validation split ─────────────────────────────────
        // One RNG drives the split and every epoch's batch shuffle
        let mut rng = match cfg.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None       => ChaCha8Rng::from_entropy(),
        };
        let (train, validation) = split_train_val(dataset.examples, cfg.train_ratio, &mut rng);
        println!("Training set size: {}", train.len());
        println!("Validation set size: {}", validation.len());

        let train_examples      = train.len();
        let validation_examples = validation.len();

        // ── Step 5: Persist config, open metrics ─────────────────────────────
        let checkpoints = CheckpointManager::new(&cfg.checkpoint_dir)?;
        checkpoints.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        // ── Step 6: Training loop (Layer 5) ──────────────────────────────────
        let mut trainer = Trainer::new(cfg, &mut engine, &checkpoints).with_metrics(&metrics);
        if let Some(flag) = &self.cancel {
            trainer = trainer.with_cancel(Arc::clone(flag));
        }
        let report = trainer.run(&dataset.vocabulary, train, &validation, &mut rng)?;

        Ok(TrainOutcome {
            report,
            handle: ModelHandle::new(engine),
            train_examples,
            validation_examples,
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::testing::ScriptedEngine;
    use crate::ml::trainer::StopReason;
    use std::sync::atomic::Ordering;

    const TOY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/train_data.json");

    fn config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            dataset_path:   TOY.to_string(),
            checkpoint_dir: dir.to_string_lossy().into_owned(),
            seed:           Some(42),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_toy_dataset_end_to_end_with_scripted_engine() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());

        // Flat validation loss: epoch 1 improves, then patience runs out
        let outcome = TrainUseCase::new(cfg).execute_with(ScriptedEngine::new(vec![0.5])).unwrap();

        assert_eq!(outcome.train_examples, 17);
        assert_eq!(outcome.validation_examples, 5);
        assert_eq!(outcome.report.stop_reason, StopReason::EarlyStopped);
        assert_eq!(outcome.report.history.len(), 6);
        assert_eq!(outcome.report.best_epoch, 1);

        let p = outcome.handle.predict_one("Tell me about hostel facilities").unwrap();
        assert_eq!(p.categories.len(), 9);

        assert!(dir.path().join("train_config.json").is_file());
        assert!(dir.path().join("metrics.csv").is_file());
    }

    #[test]
    fn test_same_seed_gives_same_history() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();

        let run = |dir: &std::path::Path| {
            let cfg = TrainConfig { epochs: 3, ..config(dir) };
            TrainUseCase::new(cfg)
                .execute_with(ScriptedEngine::new(vec![0.9, 0.8, 0.7]))
                .unwrap()
                .report
        };
        assert_eq!(run(a.path()), run(b.path()));
    }

    #[test]
    fn test_invalid_config_is_rejected_before_loading() {
        let dir = tempfile::tempdir().unwrap();
        for cfg in [
            TrainConfig { train_ratio: 1.0, ..config(dir.path()) },
            TrainConfig { patience: 0, ..config(dir.path()) },
            TrainConfig { epochs: 0, ..config(dir.path()) },
            TrainConfig {
                schedule: BatchSchedule { start: 8.0, end: 4.0, growth: 1.001 },
                ..config(dir.path())
            },
        ] {
            let err = TrainUseCase::new(cfg)
                .execute_with(ScriptedEngine::new(vec![0.5]))
                .err()
                .expect("config should be rejected");
            assert!(matches!(
                err.downcast_ref::<IntentError>(),
                Some(IntentError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_cancelled_run_still_returns_a_handle() {
        let dir  = tempfile::tempdir().unwrap();
        let flag = Arc::new(AtomicBool::new(false));
        flag.store(true, Ordering::Relaxed);

        let outcome = TrainUseCase::new(config(dir.path()))
            .with_cancel(flag)
            .execute_with(ScriptedEngine::new(vec![0.5]))
            .unwrap();

        assert_eq!(outcome.report.stop_reason, StopReason::Cancelled);
        assert!(outcome.handle.categories().is_some());
    }

    #[test]
    fn test_burn_engine_trains_on_toy_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig { epochs: 3, ..config(dir.path()) };

        let outcome = TrainUseCase::new(cfg).execute().unwrap();
        assert_eq!(outcome.report.history.len(), 3);
        assert!(outcome.report.best_val_loss.is_some_and(f64::is_finite));

        let p = outcome.handle.predict_one("What are the hostel facilities?").unwrap();
        assert_eq!(p.categories.len(), 9);
    }
}
