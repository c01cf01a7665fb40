// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal: train a classifier, or serve predictions from one.
//
// Rules for this layer:
//   - No tensor or model code here (Layer 5)
//   - No argument parsing (Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Reopen a checkpoint and predict
pub mod predict_use_case;
