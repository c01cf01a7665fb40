// ============================================================
// Layer 5 - Training Loop / Early-Stopping Controller
// ============================================================
// Drives epochs over any ClassificationEngine:
//
//   for each epoch:
//     1. reshuffle + slice the training set into growing batches
//     2. engine.update(batch) for every batch, summing the loss
//     3. evaluate on the validation split (only after ALL batches)
//     4. early-stopping decision:
//          val_loss < best  → IMPROVED: reset patience, checkpoint
//          otherwise        → STALLED:  patience_counter += 1
//          counter ≥ patience → STOPPED
//   finally: restore the best checkpoint into the engine
//
// The returned engine is therefore always the best one seen on
// validation, never simply the last one.
//
// A NaN/inf loss aborts with NonFiniteLoss and leaves the last
// good checkpoint on disk.
//
// A cancel flag is checked between epochs, never mid-batch.
//
// Reference: Prechelt (1998) "Early Stopping - But When?"

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::data::batcher::BatchScheduler;
use crate::domain::error::IntentError;
use crate::domain::example::{CategoryVocabulary, LabeledExample};
use crate::domain::traits::ClassificationEngine;
use crate::infra::checkpoint::{CheckpointManager, CheckpointMeta};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::evaluator::ValidationEvaluator;

// ─── Stop Reason ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxEpochsReached,
    EarlyStopped,
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::MaxEpochsReached => "max_epochs_reached",
            StopReason::EarlyStopped     => "early_stopped",
            StopReason::Cancelled        => "cancelled",
        };
        f.write_str(s)
    }
}

// ─── Early Stopping State Machine ─────────────────────────────────────────────
/// Mutable per-run bookkeeping, updated once per epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingState {
    pub epoch:            usize,
    pub best_val_loss:    f64,
    pub patience_counter: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Improved,
    Stalled,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct EarlyStopping {
    patience: usize,
    state:    TrainingState,
    phase:    LoopState,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            state: TrainingState { epoch: 0, best_val_loss: f64::INFINITY, patience_counter: 0 },
            phase: LoopState::Running,
        }
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    pub fn phase(&self) -> LoopState {
        self.phase
    }

    /// Feed one epoch's validation loss and return the new state.
    pub fn observe(&mut self, epoch: usize, val_loss: f64) -> LoopState {
        self.state.epoch = epoch;

        self.phase = if val_loss < self.state.best_val_loss {
            self.state.best_val_loss    = val_loss;
            self.state.patience_counter = 0;
            LoopState::Improved
        } else {
            self.state.patience_counter += 1;
            if self.state.patience_counter >= self.patience {
                LoopState::Stopped
            } else {
                LoopState::Stalled
            }
        };
        self.phase
    }

    /// An epoch without evaluation. Never improves, never stops.
    pub fn skip(&mut self, epoch: usize) -> LoopState {
        self.state.epoch = epoch;
        self.phase       = LoopState::Running;
        self.phase
    }
}

// ─── Train Report ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    pub history:       Vec<EpochMetrics>,
    pub stop_reason:   StopReason,
    /// Epoch of the restored checkpoint
    pub best_epoch:    usize,
    /// None when there was no validation split
    pub best_val_loss: Option<f64>,
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
pub struct Trainer<'a, E: ClassificationEngine + ?Sized> {
    cfg:         &'a TrainConfig,
    engine:      &'a mut E,
    checkpoints: &'a CheckpointManager,
    metrics:     Option<&'a MetricsLogger>,
    cancel:      Option<Arc<AtomicBool>>,
}

impl<'a, E: ClassificationEngine + ?Sized> Trainer<'a, E> {
    pub fn new(cfg: &'a TrainConfig, engine: &'a mut E, checkpoints: &'a CheckpointManager) -> Self {
        Self { cfg, engine, checkpoints, metrics: None, cancel: None }
    }

    pub fn with_metrics(mut self, logger: &'a MetricsLogger) -> Self {
        self.metrics = Some(logger);
        self
    }

    /// Stop cleanly before the next epoch once `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|f| f.load(Ordering::Relaxed))
    }

    pub fn run<R: Rng + ?Sized>(
        self,
        vocabulary: &CategoryVocabulary,
        mut train:  Vec<LabeledExample>,
        validation: &[LabeledExample],
        rng:        &mut R,
    ) -> Result<TrainReport> {
        let cfg = self.cfg;
        if train.is_empty() {
            return Err(IntentError::DataFormat("training split is empty".into()).into());
        }

        self.engine.initialize(vocabulary, &train)?;

        let evaluator = match ValidationEvaluator::new(validation) {
            Ok(ev) => {
                tracing::info!("Validating on {} examples each epoch", ev.len());
                Some(ev)
            }
            Err(IntentError::EmptySplit) => {
                tracing::warn!(
                    "Validation split is empty: evaluation and early stopping are disabled"
                );
                None
            }
            Err(e) => return Err(e.into()),
        };

        let scheduler   = BatchScheduler::new(cfg.schedule);
        let mut early   = EarlyStopping::new(cfg.patience);
        let mut history = Vec::with_capacity(cfg.epochs);
        let mut best_epoch: Option<usize> = None;
        let mut stop_reason = StopReason::MaxEpochsReached;

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in 1..=cfg.epochs {
            if self.is_cancelled() {
                tracing::info!("Cancellation requested before epoch {}", epoch);
                stop_reason = StopReason::Cancelled;
                break;
            }

            // ── Training phase ────────────────────────────────────────────────
            let mut train_loss = 0.0f64;
            let mut batches    = 0usize;
            for batch in scheduler.epoch(&mut train, rng) {
                let loss = self.engine.update(batch)?;
                if !loss.is_finite() {
                    return Err(IntentError::NonFiniteLoss { stage: "training", epoch }.into());
                }
                train_loss += loss;
                batches    += 1;
            }
            tracing::debug!("Epoch {} applied {} batches", epoch, batches);

            // ── Validation phase ──────────────────────────────────────────────
            let (val_loss, phase) = match &evaluator {
                Some(ev) => {
                    let v = ev.evaluate(&*self.engine)?;
                    if !v.is_finite() {
                        return Err(IntentError::NonFiniteLoss { stage: "validation", epoch }.into());
                    }
                    (Some(v), early.observe(epoch, v))
                }
                None => (None, early.skip(epoch)),
            };

            // ── Checkpoint on improvement ─────────────────────────────────────
            let improved = phase == LoopState::Improved;
            if improved {
                let meta = CheckpointMeta { epoch, val_loss, categories: vocabulary.clone() };
                self.checkpoints.save_best(&*self.engine, &meta)?;
                best_epoch = Some(epoch);
            }

            let metrics = EpochMetrics::new(epoch, train_loss, val_loss, improved);
            println!(
                "Epoch {:>3}/{} | train_loss={:.4} | val_loss={}{}",
                epoch,
                cfg.epochs,
                train_loss,
                val_loss.map(|v| format!("{v:.4}")).unwrap_or_else(|| "n/a".into()),
                if improved { " | saved" } else { "" },
            );
            if let Some(logger) = self.metrics {
                logger.log(&metrics)?;
            }
            history.push(metrics);

            if phase == LoopState::Stopped {
                println!("Early stopping triggered.");
                stop_reason = StopReason::EarlyStopped;
                break;
            }
        }

        // ── Without evaluation nothing was captured: keep the final state ────
        if best_epoch.is_none() {
            let last = history.last().map(|m: &EpochMetrics| m.epoch).unwrap_or(0);
            let meta = CheckpointMeta { epoch: last, val_loss: None, categories: vocabulary.clone() };
            self.checkpoints.save_best(&*self.engine, &meta)?;
        }

        // ── Restore best model ────────────────────────────────────────────────
        let restored = self.checkpoints.restore_best(&mut *self.engine)?;

        tracing::info!(
            "Training finished ({}); best epoch {} val_loss={:?}",
            stop_reason,
            restored.epoch,
            restored.val_loss
        );

        Ok(TrainReport {
            history,
            stop_reason,
            best_epoch:    restored.epoch,
            best_val_loss: restored.val_loss,
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::testing::ScriptedEngine;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::BTreeMap;

    fn example(text: &str) -> LabeledExample {
        LabeledExample::new(text, BTreeMap::from([("a".to_string(), 0.0)]))
    }

    fn vocab() -> CategoryVocabulary {
        CategoryVocabulary::from_names(["a"])
    }

    fn cfg(epochs: usize, patience: usize) -> TrainConfig {
        TrainConfig { epochs, patience, ..TrainConfig::default() }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(5)
    }

    #[test]
    fn test_early_stopping_state_machine() {
        let mut es = EarlyStopping::new(2);
        assert_eq!(es.phase(), LoopState::Running);
        assert_eq!(es.observe(1, 1.0), LoopState::Improved);
        assert_eq!(es.observe(2, 1.0), LoopState::Stalled);
        assert_eq!(es.observe(3, 0.5), LoopState::Improved);
        assert_eq!(es.state().patience_counter, 0);
        assert_eq!(es.observe(4, 0.6), LoopState::Stalled);
        assert_eq!(es.observe(5, 0.7), LoopState::Stopped);
        assert_eq!(es.state().best_val_loss, 0.5);
        assert_eq!(es.state().epoch, 5);
    }

    #[test]
    fn test_stops_after_patience_and_restores_best_epoch() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let cfg  = cfg(30, 5);
        let mut engine = ScriptedEngine::new(vec![0.9, 0.8, 0.85, 0.86, 0.87, 0.88, 0.89, 0.1, 0.05]);

        let report = Trainer::new(&cfg, &mut engine, &ckpt)
            .run(&vocab(), vec![example("t")], &[example("v")], &mut rng())
            .unwrap();

        assert_eq!(report.stop_reason, StopReason::EarlyStopped);
        assert_eq!(report.history.len(), 7);
        assert_eq!(report.best_epoch, 2);
        assert!((report.best_val_loss.unwrap() - 0.8).abs() < 1e-9);

        let improved: Vec<usize> =
            report.history.iter().filter(|m| m.improved).map(|m| m.epoch).collect();
        assert_eq!(improved, vec![1, 2]);

        // The engine now holds the epoch-2 state, not the epoch-7 one
        assert_eq!(engine.marker(), 2);
    }

    #[test]
    fn test_runs_to_max_epochs_when_always_improving() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let cfg  = cfg(4, 2);
        let mut engine = ScriptedEngine::new(vec![0.9, 0.7, 0.5, 0.3]);

        let report = Trainer::new(&cfg, &mut engine, &ckpt)
            .run(&vocab(), vec![example("t")], &[example("v")], &mut rng())
            .unwrap();

        assert_eq!(report.stop_reason, StopReason::MaxEpochsReached);
        assert_eq!(report.history.len(), 4);
        assert_eq!(report.best_epoch, 4);
        assert_eq!(report.stop_reason.to_string(), "max_epochs_reached");
    }

    #[test]
    fn test_empty_validation_skips_evaluation_and_keeps_final_state() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let cfg  = cfg(3, 1);
        let mut engine = ScriptedEngine::new(vec![0.9]);

        let report = Trainer::new(&cfg, &mut engine, &ckpt)
            .run(&vocab(), vec![example("t")], &[], &mut rng())
            .unwrap();

        assert_eq!(report.stop_reason, StopReason::MaxEpochsReached);
        assert!(report.history.iter().all(|m| m.val_loss.is_none() && !m.improved));
        assert_eq!(report.best_epoch, 3);
        assert_eq!(report.best_val_loss, None);
        assert_eq!(engine.marker(), 3);
    }

    #[test]
    fn test_nan_training_loss_aborts_and_keeps_checkpoint() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let cfg  = cfg(10, 5);
        let mut engine = ScriptedEngine::new(vec![0.9, 0.8, 0.7]).nan_on_update(3);

        let err = Trainer::new(&cfg, &mut engine, &ckpt)
            .run(&vocab(), vec![example("t")], &[example("v")], &mut rng())
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<IntentError>(),
            Some(IntentError::NonFiniteLoss { stage: "training", epoch: 3 })
        ));
        assert_eq!(ckpt.best_meta().unwrap().unwrap().epoch, 2);
    }

    #[test]
    fn test_cancel_flag_stops_between_epochs() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let cfg  = cfg(10, 5);
        let flag = Arc::new(AtomicBool::new(true));
        let mut engine = ScriptedEngine::new(vec![0.9]);

        let report = Trainer::new(&cfg, &mut engine, &ckpt)
            .with_cancel(flag)
            .run(&vocab(), vec![example("t")], &[example("v")], &mut rng())
            .unwrap();

        assert_eq!(report.stop_reason, StopReason::Cancelled);
        assert!(report.history.is_empty());
    }

    #[test]
    fn test_checkpoint_failure_surfaces() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let cfg  = cfg(3, 5);
        let mut engine = ScriptedEngine::new(vec![0.9]);
        engine.fail_saves(true);

        let err = Trainer::new(&cfg, &mut engine, &ckpt)
            .run(&vocab(), vec![example("t")], &[example("v")], &mut rng())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IntentError>(),
            Some(IntentError::CheckpointIo { .. })
        ));
    }

    #[test]
    fn test_metrics_are_logged_per_epoch() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path()).unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        let cfg    = cfg(3, 5);
        let mut engine = ScriptedEngine::new(vec![0.9, 0.8, 0.7]);

        Trainer::new(&cfg, &mut engine, &ckpt)
            .with_metrics(&logger)
            .run(&vocab(), vec![example("t")], &[example("v")], &mut rng())
            .unwrap();

        let csv = std::fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 4);
    }

    #[test]
    fn test_empty_training_split_is_rejected() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path()).unwrap();
        let cfg  = cfg(3, 5);
        let mut engine = ScriptedEngine::new(vec![0.9]);
        assert!(Trainer::new(&cfg, &mut engine, &ckpt)
            .run(&vocab(), Vec::new(), &[example("v")], &mut rng())
            .is_err());
    }
}
