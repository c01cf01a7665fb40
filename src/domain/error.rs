// ============================================================
// Layer 3 - Error Taxonomy
// ============================================================
// Every layer propagates anyhow::Result, but failures that a
// caller may want to react to are raised as IntentError so
// they can be recovered with `err.downcast_ref::<IntentError>()`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntentError {
    /// The dataset file is malformed. Fatal, raised before training starts.
    #[error("malformed dataset: {0}")]
    DataFormat(String),

    /// An evaluator was requested over zero validation examples.
    #[error("validation split is empty, evaluation is unavailable")]
    EmptySplit,

    /// The engine was queried before a successful initialize or load.
    #[error("model not ready: {0}")]
    ModelNotReady(String),

    /// A ready engine omitted a category from its scores.
    #[error("engine returned no score for category '{0}'")]
    MissingScore(String),

    #[error("checkpoint I/O failed at '{path}': {reason}")]
    CheckpointIo { path: PathBuf, reason: String },

    /// NaN or infinite loss. Aborts the run.
    #[error("non-finite {stage} loss in epoch {epoch}")]
    NonFiniteLoss { stage: &'static str, epoch: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl IntentError {
    pub fn checkpoint_io(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::CheckpointIo { path: path.into(), reason: reason.to_string() }
    }
}
