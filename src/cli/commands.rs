// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `predict`, and all
// their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::train_use_case::TrainConfig;
use crate::data::batcher::BatchSchedule;
use crate::ml::engine::EngineConfig;

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the intent classifier on a labelled JSON dataset
    Train(TrainArgs),

    /// Rank intent categories for one or more texts
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSON file of [text, {"cats": {category: label}}] pairs
    #[arg(long, default_value = "data/train_data.json")]
    pub dataset: String,

    /// Directory for the best checkpoint, config and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Maximum number of passes over the training set
    #[arg(long, default_value_t = 30)]
    pub epochs: usize,

    /// Epochs without validation improvement before stopping
    #[arg(long, default_value_t = 5)]
    pub patience: usize,

    /// Fraction of examples used for training; the rest validate
    #[arg(long, default_value_t = 0.8)]
    pub train_ratio: f64,

    /// Seed for the split and batch shuffles; random if omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// First batch size of the compounding schedule
    #[arg(long, default_value_t = 4.0)]
    pub batch_start: f64,

    /// Upper bound of the compounding schedule
    #[arg(long, default_value_t = 32.0)]
    pub batch_end: f64,

    /// Growth factor applied after every batch
    #[arg(long, default_value_t = 1.001)]
    pub batch_growth: f64,

    /// Adam learning rate
    #[arg(long, default_value_t = 5e-3)]
    pub lr: f64,

    /// Width of the hidden layer
    #[arg(long, default_value_t = 64)]
    pub hidden_size: usize,

    /// Dropout probability during training
    #[arg(long, default_value_t = 0.3)]
    pub dropout: f64,

    /// Maximum number of words kept in the tokenizer
    #[arg(long, default_value_t = 10_000)]
    pub max_vocab: usize,

    /// Texts to classify once training finishes (repeatable)
    #[arg(long = "probe")]
    pub probes: Vec<String>,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            dataset_path:   a.dataset,
            checkpoint_dir: a.checkpoint_dir,
            epochs:         a.epochs,
            patience:       a.patience,
            train_ratio:    a.train_ratio,
            seed:           a.seed,
            schedule: BatchSchedule {
                start:  a.batch_start,
                end:    a.batch_end,
                growth: a.batch_growth,
            },
            engine: EngineConfig {
                hidden_size:   a.hidden_size,
                dropout:       a.dropout,
                learning_rate: a.lr,
                max_vocab:     a.max_vocab,
            },
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Texts to classify
    #[arg(required = true)]
    pub texts: Vec<String>,

    /// Directory where `train` saved its checkpoint
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Print predictions as JSON
    #[arg(long)]
    pub json: bool,

    /// Only show the N highest-scoring categories
    #[arg(long)]
    pub top: Option<usize>,
}
