// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Cross-cutting persistence concerns:
//
//   checkpoint.rs      - The single best checkpoint
//                        Staged writes swapped in by rename so a
//                        failed save never clobbers the previous
//                        best. Also saves/loads TrainConfig as
//                        JSON so prediction can rebuild the engine.
//
//   tokenizer_store.rs - Word-level tokenizer persistence
//                        Builds the tokenizer from the training
//                        texts and stores it next to the weights
//                        so training and prediction share one
//                        vocabulary.
//
//   metrics.rs         - Training metrics logging
//                        Writes per-epoch losses to a CSV file.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Best-checkpoint saving and restoring
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
