// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Pure Rust structs, enums, and traits that define the core
// concepts of the intent classifier.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain data, errors, and the seams other layers plug into
//
// The classification engine is a trait here so the training
// loop never knows which toolkit actually does the learning.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Labelled examples and the category vocabulary
pub mod example;

// Ranked per-category scores for one query
pub mod prediction;

// Error taxonomy shared by every layer
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
