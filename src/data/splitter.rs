// ============================================================
// Layer 4 - Train/Validation Splitter
// ============================================================
// Randomly shuffles examples and splits them into two sets:
//   - Training set:   used to update model weights
//   - Validation set: used for early stopping and checkpoint choice
//
// Why shuffle before splitting?
//   The dataset file groups questions by intent (all admission
//   questions first, then eligibility, ...). Without shuffling,
//   the validation set would only contain the last intents.
//
// The cut point is floor(n * ratio), so 22 examples at 0.8
// gives 17 training and 5 validation examples.
//
// The RNG is passed in so a fixed seed reproduces the split.
// Uses Fisher-Yates via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use rand::{seq::SliceRandom, Rng};

/// Shuffle `samples` once and split into (train, validation).
///
/// # Arguments
/// * `samples`        - All available samples (consumed by this function)
/// * `train_fraction` - Proportion for training, e.g. 0.8 = 80%
/// * `rng`            - Shuffle source; seed it for reproducible splits
pub fn split_train_val<T, R: Rng + ?Sized>(
    mut samples:    Vec<T>,
    train_fraction: f64,
    rng:            &mut R,
) -> (Vec<T>, Vec<T>) {
    samples.shuffle(rng);

    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction).floor() as usize;

    // Clamp to valid range to avoid panics on tiny datasets
    let split_at = split_at.min(total);

    // After this: samples = [0..split_at], val = [split_at..total]
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}
