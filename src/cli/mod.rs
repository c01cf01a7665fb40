// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// The entry point for all user interaction. Arguments are parsed
// with clap; all work is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`   - trains the classifier on a JSON dataset
//   2. `predict` - reopens the best checkpoint and ranks categories
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

use crate::domain::prediction::Prediction;

#[derive(Parser, Debug)]
#[command(
    name = "intent-classifier",
    version,
    about = "Train a multi-label intent classifier with early stopping, then rank intents for new texts."
)]
pub struct Cli {
    /// The subcommand to run (train or predict)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. Only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on '{}'", args.dataset);
    let probes   = args.probes.clone();
    let use_case = TrainUseCase::new(args.into());
    let outcome  = use_case.execute()?;
    let report   = &outcome.report;

    println!(
        "\nTraining complete ({}) after {} epoch(s).",
        report.stop_reason,
        report.history.len()
    );
    match report.best_val_loss {
        Some(loss) => println!("Best epoch: {} (val_loss={:.4})", report.best_epoch, loss),
        None       => println!("No validation split; kept the final epoch {}", report.best_epoch),
    }
    println!("Checkpoint saved under '{}'", use_case.config().checkpoint_dir);

    if !probes.is_empty() {
        let predictions = outcome.handle.predict(&probes)?;
        print_ranked(&predictions, None);
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case    = PredictUseCase::open(&args.checkpoint_dir)?;
    let predictions = use_case.predict(&args.texts)?;

    if args.json {
        let trimmed: Vec<Prediction> = predictions
            .into_iter()
            .map(|p| match args.top {
                Some(n) => {
                    let categories = p.top(n).to_vec();
                    Prediction { categories, ..p }
                }
                None => p,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&trimmed)?);
    } else {
        print_ranked(&predictions, args.top);
    }
    Ok(())
}

fn print_ranked(predictions: &[Prediction], top: Option<usize>) {
    for p in predictions {
        println!("\nText: {}", p.text);
        println!("Predicted Categories:");
        let shown = top.map_or(&p.categories[..], |n| p.top(n));
        for (category, score) in shown {
            println!("{category}: {score:.4}");
        }
    }
}
