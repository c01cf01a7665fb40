// ============================================================
// Layer 2 - PredictUseCase
// ============================================================
// Reopens a finished training run and serves predictions:
//
//   Step 1: Read train_config.json     (Layer 6 - infra)
//   Step 2: Build an engine from it    (Layer 5 - ml)
//   Step 3: Restore the best checkpoint (Layer 6 - infra)
//   Step 4: Wrap it in a ModelHandle   (Layer 5 - ml)

use std::path::Path;

use anyhow::Result;

use crate::domain::error::IntentError;
use crate::domain::prediction::Prediction;
use crate::domain::traits::ClassificationEngine;
use crate::infra::checkpoint::{CheckpointManager, CheckpointMeta};
use crate::ml::{engine::DefaultEngine, predictor::ModelHandle};

pub struct PredictUseCase<E: ClassificationEngine> {
    handle: ModelHandle<E>,
    meta:   CheckpointMeta,
}

impl PredictUseCase<DefaultEngine> {
    /// Open the burn engine saved under `checkpoint_dir`.
    pub fn open(checkpoint_dir: impl AsRef<Path>) -> Result<Self> {
        let dir         = checkpoint_dir.as_ref();
        let checkpoints = existing(dir)?;
        let cfg         = checkpoints.load_config()?;
        Self::restore(&checkpoints, DefaultEngine::cpu(cfg.engine))
    }
}

impl<E: ClassificationEngine> PredictUseCase<E> {
    /// Restore the best checkpoint under `checkpoint_dir` into `engine`.
    pub fn open_with(checkpoint_dir: impl AsRef<Path>, engine: E) -> Result<Self> {
        let checkpoints = existing(checkpoint_dir.as_ref())?;
        Self::restore(&checkpoints, engine)
    }

    fn restore(checkpoints: &CheckpointManager, mut engine: E) -> Result<Self> {
        let meta = checkpoints.restore_best(&mut engine)?;
        tracing::info!(
            "Loaded model from epoch {} ({} categories)",
            meta.epoch,
            meta.categories.len()
        );
        Ok(Self { handle: ModelHandle::new(engine), meta })
    }

    pub fn meta(&self) -> &CheckpointMeta {
        &self.meta
    }

    pub fn handle(&self) -> &ModelHandle<E> {
        &self.handle
    }

    pub fn predict<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Prediction>> {
        self.handle.predict(texts)
    }
}

// Never create a checkpoint directory just to find it empty
fn existing(dir: &Path) -> Result<CheckpointManager> {
    if !dir.is_dir() {
        return Err(IntentError::ModelNotReady(format!(
            "checkpoint directory '{}' does not exist. Have you run 'train' first?",
            dir.display()
        ))
        .into());
    }
    CheckpointManager::new(dir)
}
