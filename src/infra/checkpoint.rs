// ============================================================
// Layer 6 - Checkpoint Manager
// ============================================================
// Keeps exactly ONE "best" checkpoint: the engine state with
// the lowest validation loss seen so far.
//
// Directory layout:
//   checkpoints/
//     train_config.json      ← hyperparameters, needed to rebuild the engine
//     metrics.csv            ← written by MetricsLogger
//     best/
//       checkpoint.json      ← {epoch, val_loss, categories}
//       ...                  ← whatever the engine's save() writes
//
// Crash safety:
//   A new checkpoint is first written to `best.staging/`. Only
//   when the engine save AND the metadata write succeed is it
//   swapped in by rename:
//
//     best         → best.old
//     best.staging → best
//     remove best.old
//
//   A failed write therefore never touches `best/`. If the
//   process dies between the two renames, `best.old/` still
//   holds the previous checkpoint and restore falls back to it.
//
// Reference: Rust Book §9 (Error Handling)
//            std::fs::rename documentation

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::domain::error::IntentError;
use crate::domain::example::CategoryVocabulary;
use crate::domain::traits::ClassificationEngine;

const BEST:     &str = "best";
const STAGING:  &str = "best.staging";
const PREVIOUS: &str = "best.old";
const META:     &str = "checkpoint.json";
const CONFIG:   &str = "train_config.json";

/// Metadata stored alongside every checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    /// 1-based epoch at which the checkpoint was captured
    pub epoch: usize,

    /// Validation loss at capture time.
    /// None when the run had no validation split.
    pub val_loss: Option<f64>,

    pub categories: CategoryVocabulary,
}

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| IntentError::checkpoint_io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn best_dir(&self) -> PathBuf {
        self.dir.join(BEST)
    }

    /// Capture `engine` as the new best checkpoint.
    pub fn save_best<E: ClassificationEngine + ?Sized>(
        &self,
        engine: &E,
        meta:   &CheckpointMeta,
    ) -> Result<()> {
        let staging = self.dir.join(STAGING);

        // ── Step 1: Write everything into a fresh staging directory ──────────
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| IntentError::checkpoint_io(&staging, e))?;
        }
        fs::create_dir_all(&staging).map_err(|e| IntentError::checkpoint_io(&staging, e))?;

        engine
            .save(&staging)
            .map_err(|e| IntentError::checkpoint_io(&staging, format!("{e:#}")))?;

        let meta_json = serde_json::to_string_pretty(meta)?;
        fs::write(staging.join(META), meta_json)
            .map_err(|e| IntentError::checkpoint_io(staging.join(META), e))?;

        // ── Step 2: Swap it in ───────────────────────────────────────────────
        let best     = self.best_dir();
        let previous = self.dir.join(PREVIOUS);

        if previous.exists() {
            fs::remove_dir_all(&previous).map_err(|e| IntentError::checkpoint_io(&previous, e))?;
        }
        if best.exists() {
            fs::rename(&best, &previous).map_err(|e| IntentError::checkpoint_io(&best, e))?;
        }
        fs::rename(&staging, &best).map_err(|e| IntentError::checkpoint_io(&best, e))?;

        if previous.exists() {
            // The new checkpoint is in place; a leftover best.old is harmless
            if let Err(e) = fs::remove_dir_all(&previous) {
                tracing::warn!("Could not remove '{}': {}", previous.display(), e);
            }
        }

        tracing::debug!(
            "Saved best checkpoint: epoch {} val_loss={:?}",
            meta.epoch,
            meta.val_loss
        );
        Ok(())
    }

    /// Directory holding the most recent complete checkpoint, if any.
    fn committed_dir(&self) -> Option<PathBuf> {
        [BEST, PREVIOUS]
            .iter()
            .map(|name| self.dir.join(name))
            .find(|dir| dir.join(META).is_file())
    }

    /// Metadata of the current best checkpoint, None if nothing has been saved.
    pub fn best_meta(&self) -> Result<Option<CheckpointMeta>> {
        let Some(dir) = self.committed_dir() else {
            return Ok(None);
        };
        let path = dir.join(META);
        let json = fs::read_to_string(&path).map_err(|e| IntentError::checkpoint_io(&path, e))?;
        let meta = serde_json::from_str(&json)
            .map_err(|e| IntentError::checkpoint_io(&path, e))?;
        Ok(Some(meta))
    }

    /// Load the best checkpoint into `engine`.
    pub fn restore_best<E: ClassificationEngine + ?Sized>(
        &self,
        engine: &mut E,
    ) -> Result<CheckpointMeta> {
        let dir = self.committed_dir().ok_or_else(|| {
            IntentError::ModelNotReady(format!(
                "no checkpoint in '{}'. Have you run 'train' first?",
                self.dir.display()
            ))
        })?;

        let meta = self
            .best_meta()?
            .ok_or_else(|| IntentError::checkpoint_io(&dir, "checkpoint metadata vanished"))?;

        engine
            .load(&dir)
            .map_err(|e| IntentError::checkpoint_io(&dir, format!("{e:#}")))?;

        tracing::info!("Restored checkpoint from epoch {}", meta.epoch);
        Ok(meta)
    }

    /// Save the training configuration so prediction can rebuild the engine.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. \
                 Make sure you have run 'train' before 'predict'.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}
