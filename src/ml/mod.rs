// ============================================================
// Layer 5 - ML / Training Layer
// ============================================================
// All burn code lives here. Everything else in the crate talks
// to the model only through the ClassificationEngine trait.
//
// What's in this layer:
//
//   model.rs      - bag-of-words MLP (Linear → ReLU → Dropout
//                   → Linear) with a sigmoid BCE loss
//
//   features.rs   - text + labels → [N, V] / [N, C] tensors
//
//   engine.rs     - BurnEngine: the ClassificationEngine the
//                   CLI trains, saves and reloads
//
//   evaluator.rs  - mean multi-label BCE over the validation split
//
//   trainer.rs    - epoch loop, early stopping, best-checkpoint
//                   capture and restore
//
//   predictor.rs  - ModelHandle: ranked predictions from a
//                   trained engine
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Bag-of-words MLP architecture
pub mod model;

/// Tensor batching for the burn engine
pub mod features;

/// burn-backed ClassificationEngine
pub mod engine;

/// Validation loss
pub mod evaluator;

/// Training loop with early stopping
pub mod trainer;

/// Ranked inference over a trained engine
pub mod predictor;

#[cfg(test)]
pub mod testing;
