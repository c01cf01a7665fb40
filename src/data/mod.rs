// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything between the raw JSON file and the batches the
// training loop feeds to the engine.
//
//   train_data.json
//       │
//       ▼
//   JsonDatasetLoader → parses [text, {"cats": {...}}] pairs
//       │
//       ▼
//   Normalizer        → vocabulary + dense 0.0-filled labels
//       │
//       ▼
//   split_train_val   → shuffled 80/20 train/validation split
//       │
//       ▼
//   BatchScheduler    → per-epoch reshuffle + growing minibatches
//
// Each module is responsible for exactly one step.
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Reads the raw dataset file
pub mod loader;

/// Builds the category vocabulary and densifies labels
pub mod normalizer;

/// Shuffles and splits data into train/validation sets
pub mod splitter;

/// Compounding minibatch scheduler
pub mod batcher;
