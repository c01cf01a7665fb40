// ============================================================
// intent-classifier
// ============================================================
// Multi-label intent classification with an early-stopping
// training loop. The layers, outermost first:
//
//   cli/          Layer 1 - clap commands
//   application/  Layer 2 - train / predict use cases
//   domain/       Layer 3 - examples, predictions, traits, errors
//   data/         Layer 4 - loading, normalising, splitting, batching
//   ml/           Layer 5 - burn engine, evaluator, trainer, predictor
//   infra/        Layer 6 - checkpoints, tokenizer files, metrics CSV

#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;
